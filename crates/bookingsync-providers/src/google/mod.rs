//! Google REST clients.
//!
//! - [`GoogleCalendarClient`]: the [`CalendarProvider`](crate::CalendarProvider)
//!   backed by Calendar API v3
//! - [`ServiceAccountTokenSource`]: unattended authentication with a service
//!   account key
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use bookingsync_providers::google::{
//!     GoogleCalendarClient, GoogleConfig, ServiceAccountKey, ServiceAccountTokenSource,
//!     CALENDAR_SCOPE,
//! };
//!
//! let config = GoogleConfig::new();
//! let key = ServiceAccountKey::from_file("service-account.json")?;
//! let tokens = ServiceAccountTokenSource::new(&key, vec![CALENDAR_SCOPE.into()])?;
//! let calendar = GoogleCalendarClient::new(config, Arc::new(tokens))?;
//! ```

mod auth;
mod client;
mod config;
pub(crate) mod http;

pub use auth::{
    CALENDAR_SCOPE, DATASTORE_SCOPE, ServiceAccountKey, ServiceAccountTokenSource, StaticToken,
    TokenSource,
};
pub use client::{BOOKING_TAG_KEY, GoogleCalendarClient, UNIT_TAG_KEY};
pub use config::GoogleConfig;
