//! Event identity resolution.
//!
//! A booking's event is found through the booking id stored as a private tag
//! on the event, never by matching summary text or dates. A cached event id
//! on the booking is tried first and trusted when the event still exists and
//! still carries this booking's tag.

use std::collections::HashMap;

use bookingsync_core::Booking;
use bookingsync_providers::{EventQuery, RemoteEvent};
use tracing::debug;

use crate::error::SyncResult;
use crate::resilient::ResilientCalendar;

/// Outcome of resolving one booking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The cached event id still points at this booking's event.
    Cached(RemoteEvent),
    /// Found by tag. `duplicates` share the tag and must be deleted.
    Found {
        canonical: RemoteEvent,
        duplicates: Vec<RemoteEvent>,
    },
    /// No event exists yet.
    Unknown,
}

/// Resolves bookings to remote events for one pass.
///
/// The resolver also remembers the event id settled on for each booking so
/// the sweep knows which event to keep when it meets duplicates. The memory
/// lives as long as the resolver, which is one unit of one pass.
#[derive(Debug)]
pub struct IdentityResolver<'a> {
    calendar: &'a ResilientCalendar,
    calendar_id: &'a str,
    known: HashMap<String, String>,
}

impl<'a> IdentityResolver<'a> {
    pub fn new(calendar: &'a ResilientCalendar, calendar_id: &'a str) -> Self {
        Self {
            calendar,
            calendar_id,
            known: HashMap::new(),
        }
    }

    /// Resolves `booking`.
    ///
    /// # Errors
    ///
    /// Lookup failures are returned rather than read as "no event", so a
    /// failing provider never causes a duplicate insert.
    pub async fn resolve(&mut self, booking: &Booking) -> SyncResult<Resolution> {
        let booking_id = booking.id.trim();

        let cached = self
            .known
            .get(booking_id)
            .map(String::as_str)
            .or_else(|| booking.cached_event_id())
            .map(str::to_string);
        if let Some(event_id) = cached {
            match self.calendar.get(self.calendar_id, &event_id).await? {
                Some(event) if event.booking_tag.as_deref().is_none_or(|t| t == booking_id) => {
                    self.remember(booking_id, &event.id);
                    return Ok(Resolution::Cached(event));
                }
                Some(_) => debug!(booking_id, event_id, "cached event belongs to another booking"),
                None => debug!(booking_id, event_id, "cached event is gone"),
            }
        }

        let query = EventQuery::for_booking(booking_id);
        let mut matches = self.calendar.list(self.calendar_id, &query).await?;
        if matches.is_empty() {
            return Ok(Resolution::Unknown);
        }

        sort_canonical_first(&mut matches);
        let canonical = matches.remove(0);
        if !matches.is_empty() {
            debug!(
                booking_id,
                canonical = %canonical.id,
                duplicates = matches.len(),
                "duplicate events share a booking tag"
            );
        }
        self.remember(booking_id, &canonical.id);
        Ok(Resolution::Found {
            canonical,
            duplicates: matches,
        })
    }

    /// Records the event settled on for a booking.
    pub fn remember(&mut self, booking_id: &str, event_id: &str) {
        self.known.insert(booking_id.to_string(), event_id.to_string());
    }

    /// Returns the event settled on for a booking during this pass.
    pub fn known(&self, booking_id: &str) -> Option<&str> {
        self.known.get(booking_id).map(String::as_str)
    }
}

/// Orders events so the canonical one comes first: earliest creation time,
/// events without one last, ties broken by id.
pub fn sort_canonical_first(events: &mut [RemoteEvent]) {
    events.sort_by(|a, b| {
        (a.created.is_none(), a.created, &a.id).cmp(&(b.created.is_none(), b.created, &b.id))
    });
}
