//! Calendar and source collaborators for the reconciliation engine.
//!
//! This crate provides the two seams the engine talks through:
//!
//! - [`CalendarProvider`] - the remote calendar, scoped per calendar id
//! - [`SourceReader`] - the store that owns units and bookings
//! - [`ProviderError`] - classified failures shared by both
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐  ┌────────────────┐  ┌─────────────────┐
//! │ Firestore (REST)│  │ JSON snapshot  │  │  MemorySource   │
//! └────────┬────────┘  └───────┬────────┘  └────────┬────────┘
//!          └──────── SourceReader ──────────────────┘
//!                          │
//!                          ▼
//!                  reconciliation engine
//!                          │
//!          ┌──────── CalendarProvider ──────────────┐
//! ┌────────┴────────┐                      ┌────────┴────────┐
//! │ Google Calendar │                      │ MemoryCalendar  │
//! └─────────────────┘                      └─────────────────┘
//! ```

pub mod error;
#[cfg(feature = "google")]
pub mod firestore;
#[cfg(feature = "google")]
pub mod google;
pub mod memory;
pub mod provider;
pub mod remote_event;
pub mod snapshot;
pub mod source;

// Re-export main types at crate root
pub use error::{ProviderError, ProviderErrorCode, ProviderResult};
pub use memory::{CallStats, FailureRule, MemoryCalendar, MemorySource, Operation};
pub use provider::{BoxFuture, CalendarProvider, EventQuery};
pub use remote_event::{EventField, RemoteEvent};
pub use snapshot::SnapshotSource;
pub use source::SourceReader;
