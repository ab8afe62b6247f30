//! Pass-level outcome reporting.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::SyncError;

/// Classification of a recorded failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Validation,
    Provider,
    Exhausted,
    MissingCalendar,
    Source,
}

impl FailureKind {
    /// Returns the serialized name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Provider => "provider",
            Self::Exhausted => "exhausted",
            Self::MissingCalendar => "missing_calendar",
            Self::Source => "source",
        }
    }
}

/// One booking or unit that did not reconcile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncFailure {
    /// The unit, or the calendar id when a calendar-wide sweep failed.
    pub unit_id: String,
    /// `None` for unit-level failures.
    pub booking_id: Option<String>,
    pub kind: FailureKind,
    pub message: String,
}

impl SyncFailure {
    /// Records `error` against a unit and optionally one of its bookings.
    pub fn new(unit_id: impl Into<String>, booking_id: Option<&str>, error: &SyncError) -> Self {
        Self {
            unit_id: unit_id.into(),
            booking_id: booking_id.map(str::to_string),
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

/// Overall status of a pass that read the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PassStatus {
    /// Every unit and booking reconciled.
    Ok,
    /// At least one failure was recorded.
    Partial,
}

/// Counters gathered while reconciling one unit or calendar group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tally {
    pub units_synced: usize,
    pub inserted: usize,
    pub updated: usize,
    pub deleted: usize,
    pub skipped: usize,
    pub duplicates_removed: usize,
    pub failures: Vec<SyncFailure>,
}

impl Tally {
    pub(crate) fn fail(&mut self, unit_id: &str, booking_id: Option<&str>, error: &SyncError) {
        self.failures.push(SyncFailure::new(unit_id, booking_id, error));
    }

    pub(crate) fn absorb(&mut self, other: Tally) {
        self.units_synced += other.units_synced;
        self.inserted += other.inserted;
        self.updated += other.updated;
        self.deleted += other.deleted;
        self.skipped += other.skipped;
        self.duplicates_removed += other.duplicates_removed;
        self.failures.extend(other.failures);
    }
}

/// Result of one reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PassReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub units_seen: usize,
    /// Units whose bookings were read and whose sweep succeeded.
    pub units_synced: usize,
    pub inserted: usize,
    pub updated: usize,
    pub deleted: usize,
    pub skipped: usize,
    pub duplicates_removed: usize,
    /// Counts describe what would have happened; nothing was written.
    pub dry_run: bool,
    pub failures: Vec<SyncFailure>,
}

impl PassReport {
    pub(crate) fn new(
        started_at: DateTime<Utc>,
        units_seen: usize,
        dry_run: bool,
        tally: Tally,
    ) -> Self {
        Self {
            started_at,
            finished_at: Utc::now(),
            units_seen,
            units_synced: tally.units_synced,
            inserted: tally.inserted,
            updated: tally.updated,
            deleted: tally.deleted,
            skipped: tally.skipped,
            duplicates_removed: tally.duplicates_removed,
            dry_run,
            failures: tally.failures,
        }
    }

    /// Returns the overall status.
    pub fn status(&self) -> PassStatus {
        if self.failures.is_empty() {
            PassStatus::Ok
        } else {
            PassStatus::Partial
        }
    }

    /// Number of remote writes made (or planned, in a dry run).
    pub fn mutations(&self) -> usize {
        self.inserted + self.updated + self.deleted + self.duplicates_removed
    }

    /// One-line human summary.
    pub fn summary(&self) -> String {
        let status = match self.status() {
            PassStatus::Ok => "ok",
            PassStatus::Partial => "partial",
        };
        format!(
            "{status}{}: {}/{} units, {} inserted, {} updated, {} deleted, {} skipped, {} duplicates removed, {} failures",
            if self.dry_run { " (dry run)" } else { "" },
            self.units_synced,
            self.units_seen,
            self.inserted,
            self.updated,
            self.deleted,
            self.skipped,
            self.duplicates_removed,
            self.failures.len(),
        )
    }
}
