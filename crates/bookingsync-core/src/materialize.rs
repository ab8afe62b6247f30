//! Booking-to-event projection.
//!
//! [`Materializer::materialize`] is a pure function of its inputs: the same
//! booking and unit always produce the same [`EventContent`]. The reconciler
//! relies on this to detect drift by plain equality.

use serde::Serialize;

use crate::error::ValidationError;
use crate::model::{Booking, Unit};
use crate::span::DateSpan;

/// Color applied when a unit has none.
pub const DEFAULT_COLOR_ID: &str = "9";

/// Minimum length of a caller-supplied remote event id.
const EVENT_ID_MIN_LEN: usize = 5;

/// Maximum length of a caller-supplied remote event id.
const EVENT_ID_MAX_LEN: usize = 1024;

/// The desired state of one remote event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct EventContent {
    pub summary: String,
    pub description: String,
    pub span: DateSpan,
    pub color_id: String,
    /// Booking id, written as a private queryable annotation.
    pub booking_tag: String,
    /// Owning unit id, used to scope the deletion sweep.
    pub unit_tag: String,
}

/// Builds [`EventContent`] from a booking and its unit.
#[derive(Debug, Clone)]
pub struct Materializer {
    default_color_id: String,
}

impl Default for Materializer {
    fn default() -> Self {
        Self::new(DEFAULT_COLOR_ID)
    }
}

impl Materializer {
    /// Creates a materializer using `default_color_id` for uncolored units.
    pub fn new(default_color_id: impl Into<String>) -> Self {
        Self {
            default_color_id: default_color_id.into(),
        }
    }

    /// Projects a booking onto its desired event.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when the booking has no id or no usable
    /// stay dates.
    pub fn materialize(&self, booking: &Booking, unit: &Unit) -> Result<EventContent, ValidationError> {
        let booking_id = booking.id.trim();
        if booking_id.is_empty() {
            return Err(ValidationError::MissingBookingId);
        }
        let span = booking.span()?;

        let color_id = unit
            .color_id
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(&self.default_color_id)
            .to_string();

        Ok(EventContent {
            summary: format!("Booking: {}", unit.label()),
            description: describe(booking_id, booking.guest_name().as_deref()),
            span,
            color_id,
            booking_tag: booking_id.to_string(),
            unit_tag: unit.id.clone(),
        })
    }
}

fn describe(booking_id: &str, guest: Option<&str>) -> String {
    match guest {
        Some(guest) => format!("Booked by {guest}\nBooking ID: {booking_id}"),
        None => format!("Booking ID: {booking_id}"),
    }
}

/// Maps a booking id onto the provider's event-id alphabet.
///
/// Provider ids allow only `0-9a-v` and 5 to 1024 characters, while booking
/// ids may contain anything. The id is `bk` followed by the lowercase hex of
/// the UTF-8 bytes, which is injective and stays inside the alphabet. Returns
/// `None` when the result would be too long.
pub fn sanitize_event_id(booking_id: &str) -> Option<String> {
    let mut id = format!("bk{}", hex::encode(booking_id.as_bytes()));
    if id.len() > EVENT_ID_MAX_LEN {
        return None;
    }
    // hex output has even length, so odd-length padded ids cannot collide
    while id.len() < EVENT_ID_MIN_LEN {
        id.push('0');
    }
    Some(id)
}
