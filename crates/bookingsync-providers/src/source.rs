//! SourceReader trait definition.
//!
//! The source store owns units and bookings. The engine needs two reads and
//! one optional write: persisting the `remoteEventId` back-reference so the
//! next pass can skip the identity lookup.

use bookingsync_core::{Booking, Unit};

use crate::error::ProviderResult;
use crate::provider::BoxFuture;

/// Read access to the booking source of truth.
pub trait SourceReader: Send + Sync {
    /// Returns the name/type of this source (e.g., "firestore", "snapshot").
    fn name(&self) -> &str;

    /// Lists every unit.
    fn list_units(&self) -> BoxFuture<'_, ProviderResult<Vec<Unit>>>;

    /// Lists the bookings whose `unitId` equals `unit_id`.
    fn list_bookings<'a>(&'a self, unit_id: &'a str) -> BoxFuture<'a, ProviderResult<Vec<Booking>>>;

    /// Persists the last known remote event id for a booking.
    ///
    /// This is a performance hint only. The default implementation discards it.
    fn record_remote_event_id<'a>(
        &'a self,
        _booking: &'a Booking,
        _event_id: &'a str,
    ) -> BoxFuture<'a, ProviderResult<()>> {
        Box::pin(async { Ok(()) })
    }
}
