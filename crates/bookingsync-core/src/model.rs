//! Source-of-truth records: units and bookings.
//!
//! These types mirror the documents the source store holds. Field names
//! serialize in camelCase so snapshot files and store documents share one
//! shape. The engine only reads them; the single optional write is the
//! `remoteEventId` back-reference.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::span::DateSpan;

/// A bookable property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Unit {
    /// Stable key owned by the source.
    pub id: String,
    /// Display label.
    #[serde(default)]
    pub name: String,
    /// Remote calendar holding this unit's events. `None` means no sync target.
    #[serde(default)]
    pub calendar_id: Option<String>,
    /// Visual tag for the unit's events.
    #[serde(default)]
    pub color_id: Option<String>,
}

impl Unit {
    /// Creates a unit with no calendar and no color.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            calendar_id: None,
            color_id: None,
        }
    }

    /// Builder: set the calendar.
    pub fn with_calendar(mut self, calendar_id: impl Into<String>) -> Self {
        self.calendar_id = Some(calendar_id.into());
        self
    }

    /// Builder: set the color.
    pub fn with_color(mut self, color_id: impl Into<String>) -> Self {
        self.color_id = Some(color_id.into());
        self
    }

    /// Label used in event summaries, falling back to the id when unnamed.
    pub fn label(&self) -> &str {
        let name = self.name.trim();
        if name.is_empty() { &self.id } else { name }
    }
}

/// Lifecycle state of a booking.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BookingStatus {
    /// The stay is on.
    #[default]
    Active,
    /// The stay was called off; its event must go.
    Cancelled,
    /// Any other status the source uses. Treated as active.
    Other(String),
}

impl BookingStatus {
    /// Returns true for cancelled bookings.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Returns the wire representation.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Active => "active",
            Self::Cancelled => "cancelled",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for BookingStatus {
    fn from(value: String) -> Self {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "" | "active" | "confirmed" => Self::Active,
            "cancelled" | "canceled" => Self::Cancelled,
            _ => Self::Other(value),
        }
    }
}

impl From<&str> for BookingStatus {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<BookingStatus> for String {
    fn from(value: BookingStatus) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reservation of a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    /// Stable key from the source.
    pub id: String,
    /// Foreign key to [`Unit::id`].
    pub unit_id: String,
    /// First night of the stay.
    #[serde(default)]
    pub checkin_date: Option<NaiveDate>,
    /// Day of departure (not blocked).
    #[serde(default)]
    pub checkout_date: Option<NaiveDate>,
    #[serde(default)]
    pub guest_first_name: Option<String>,
    #[serde(default)]
    pub guest_last_name: Option<String>,
    #[serde(default)]
    pub status: BookingStatus,
    /// Last known remote event id. A cache, not an ownership link.
    #[serde(default)]
    pub remote_event_id: Option<String>,
}

impl Booking {
    /// Creates an active booking with no dates.
    pub fn new(id: impl Into<String>, unit_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            unit_id: unit_id.into(),
            checkin_date: None,
            checkout_date: None,
            guest_first_name: None,
            guest_last_name: None,
            status: BookingStatus::Active,
            remote_event_id: None,
        }
    }

    /// Builder: set the stay dates.
    pub fn with_stay(mut self, checkin: NaiveDate, checkout: NaiveDate) -> Self {
        self.checkin_date = Some(checkin);
        self.checkout_date = Some(checkout);
        self
    }

    /// Builder: set the guest name.
    pub fn with_guest(mut self, first: impl Into<String>, last: impl Into<String>) -> Self {
        self.guest_first_name = Some(first.into());
        self.guest_last_name = Some(last.into());
        self
    }

    /// Builder: set the status.
    pub fn with_status(mut self, status: impl Into<BookingStatus>) -> Self {
        self.status = status.into();
        self
    }

    /// Builder: set the cached remote event id.
    pub fn with_remote_event_id(mut self, event_id: impl Into<String>) -> Self {
        self.remote_event_id = Some(event_id.into());
        self
    }

    /// Returns true if the booking is cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.status.is_cancelled()
    }

    /// Returns the blocked span of the stay.
    ///
    /// # Errors
    ///
    /// See [`DateSpan::from_stay`].
    pub fn span(&self) -> Result<DateSpan, ValidationError> {
        DateSpan::from_stay(self.checkin_date, self.checkout_date)
    }

    /// Guest display name with blank parts dropped, or `None` if both are blank.
    pub fn guest_name(&self) -> Option<String> {
        let parts: Vec<&str> = [&self.guest_first_name, &self.guest_last_name]
            .into_iter()
            .filter_map(|p| p.as_deref())
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    }

    /// The cached remote event id, ignoring blank values.
    pub fn cached_event_id(&self) -> Option<&str> {
        self.remote_event_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booking_deserializes_from_camel_case() {
        let json = r#"{
            "id": "bk-1",
            "unitId": "u-1",
            "checkinDate": "2024-03-01",
            "checkoutDate": "2024-03-03",
            "guestFirstName": "Ada",
            "guestLastName": "Lovelace",
            "status": "Canceled",
            "remoteEventId": "evt123"
        }"#;

        let booking: Booking = serde_json::from_str(json).unwrap();
        assert_eq!(booking.unit_id, "u-1");
        assert_eq!(
            booking.checkin_date,
            NaiveDate::from_ymd_opt(2024, 3, 1)
        );
        assert!(booking.is_cancelled());
        assert_eq!(booking.cached_event_id(), Some("evt123"));
    }

    #[test]
    fn booking_defaults_missing_fields() {
        let booking: Booking = serde_json::from_str(r#"{"id":"b","unitId":"u"}"#).unwrap();
        assert_eq!(booking.status, BookingStatus::Active);
        assert!(booking.checkin_date.is_none());
        assert!(booking.remote_event_id.is_none());
        assert_eq!(booking.span(), Err(ValidationError::MissingCheckin));
    }

    #[test]
    fn status_keeps_unknown_values() {
        let status = BookingStatus::from("Pending-Payment");
        assert_eq!(status, BookingStatus::Other("Pending-Payment".to_string()));
        assert!(!status.is_cancelled());
        assert_eq!(String::from(status), "Pending-Payment");
    }

    #[test]
    fn guest_name_skips_blank_parts() {
        let booking = Booking::new("b", "u").with_guest("  ", "Hopper");
        assert_eq!(booking.guest_name(), Some("Hopper".to_string()));

        let anonymous = Booking::new("b", "u").with_guest("", "");
        assert_eq!(anonymous.guest_name(), None);
    }

    #[test]
    fn blank_cached_event_id_is_ignored() {
        let booking = Booking::new("b", "u").with_remote_event_id("  ");
        assert_eq!(booking.cached_event_id(), None);
    }

    #[test]
    fn unit_label_falls_back_to_id() {
        assert_eq!(Unit::new("u-7", "").label(), "u-7");
        assert_eq!(Unit::new("u-7", "Sea View").label(), "Sea View");
    }
}
