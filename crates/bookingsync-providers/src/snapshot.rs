//! JSON snapshot source.
//!
//! Reads units and bookings from a single file, re-read on every call so a
//! long-running server picks up edits between passes:
//!
//! ```json
//! {
//!   "units": [{ "id": "u1", "name": "Loft", "calendarId": "cal@group.calendar.google.com" }],
//!   "bookings": [{ "id": "b1", "unitId": "u1", "checkinDate": "2024-03-01", "checkoutDate": "2024-03-03" }]
//! }
//! ```

use std::path::{Path, PathBuf};

use bookingsync_core::{Booking, Unit};
use serde::Deserialize;
use tracing::debug;

use crate::error::{ProviderError, ProviderResult};
use crate::provider::BoxFuture;
use crate::source::SourceReader;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Snapshot {
    units: Vec<Unit>,
    bookings: Vec<Booking>,
}

/// [`SourceReader`] backed by a JSON file.
#[derive(Debug, Clone)]
pub struct SnapshotSource {
    path: PathBuf,
}

impl SnapshotSource {
    /// Creates a source reading from `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the snapshot path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> ProviderResult<Snapshot> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            ProviderError::configuration(format!(
                "failed to read snapshot {}: {}",
                self.path.display(),
                e
            ))
            .with_provider("snapshot")
            .with_source(e)
        })?;

        let snapshot: Snapshot = serde_json::from_str(&content).map_err(|e| {
            ProviderError::invalid_response(format!(
                "failed to parse snapshot {}: {}",
                self.path.display(),
                e
            ))
            .with_provider("snapshot")
        })?;

        debug!(
            units = snapshot.units.len(),
            bookings = snapshot.bookings.len(),
            "loaded snapshot"
        );
        Ok(snapshot)
    }
}

impl SourceReader for SnapshotSource {
    fn name(&self) -> &str {
        "snapshot"
    }

    fn list_units(&self) -> BoxFuture<'_, ProviderResult<Vec<Unit>>> {
        Box::pin(async move { Ok(self.load().await?.units) })
    }

    fn list_bookings<'a>(&'a self, unit_id: &'a str) -> BoxFuture<'a, ProviderResult<Vec<Booking>>> {
        Box::pin(async move {
            Ok(self
                .load()
                .await?
                .bookings
                .into_iter()
                .filter(|b| b.unit_id == unit_id)
                .collect())
        })
    }
}
