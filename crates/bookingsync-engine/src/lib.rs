//! Booking-to-calendar reconciliation engine.
//!
//! This crate keeps a calendar's events consistent with a set of bookings:
//! - [`Reconciler`] runs passes: resolve, materialize, compare, write, sweep
//! - [`ResilientCalendar`] retries throttled calls with exponential backoff
//! - [`IdentityResolver`] finds a booking's event through its private tag
//! - [`SyncService`] serializes passes for the HTTP trigger and [`Scheduler`]
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use bookingsync_engine::{Reconciler, SyncOptions};
//! use bookingsync_providers::{MemoryCalendar, SnapshotSource};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let reconciler = Reconciler::new(
//!         Arc::new(MemoryCalendar::new()),
//!         Arc::new(SnapshotSource::new("bookings.json")),
//!         SyncOptions::default().with_dry_run(true),
//!     );
//!     let report = reconciler.run_pass().await?;
//!     println!("{}", report.summary());
//!     Ok(())
//! }
//! ```

mod config;
mod error;
mod identity;
mod plan;
mod reconciler;
mod report;
mod resilient;
mod scheduler;
mod service;

pub use config::{RetryPolicy, SyncOptions};
pub use error::{SyncError, SyncResult};
pub use identity::{IdentityResolver, Resolution, sort_canonical_first};
pub use plan::{Action, SweepPlan, plan_booking, plan_strays, plan_sweep};
pub use reconciler::Reconciler;
pub use report::{FailureKind, PassReport, PassStatus, SyncFailure, Tally};
pub use resilient::{ResilientCalendar, Written};
pub use scheduler::{Scheduler, SchedulerCommand, SchedulerConfig, SchedulerHandle};
pub use service::{LastPass, SharedSyncService, SyncService};
