//! Provider-side event type.
//!
//! [`RemoteEvent`] is what a calendar provider returns: the fields the engine
//! writes, read back as-is, plus provider metadata. Fields may be missing or
//! foreign (an event edited by hand, or not created by the engine at all), so
//! everything beyond the id is optional or defaulted.

use std::fmt;

use bookingsync_core::{DateSpan, EventContent};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// A field of an event that the engine manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventField {
    Summary,
    Description,
    Span,
    Color,
    BookingTag,
    UnitTag,
}

impl EventField {
    /// Returns the field name used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Summary => "summary",
            Self::Description => "description",
            Self::Span => "span",
            Self::Color => "color",
            Self::BookingTag => "booking_tag",
            Self::UnitTag => "unit_tag",
        }
    }
}

impl fmt::Display for EventField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An event as it exists on the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteEvent {
    /// Provider-assigned id, immutable once created.
    pub id: String,
    pub summary: String,
    pub description: String,
    /// All-day span; `None` for timed events or unreadable dates.
    pub span: Option<DateSpan>,
    pub color_id: Option<String>,
    /// Booking id from the private identity annotation.
    pub booking_tag: Option<String>,
    /// Owning unit id from the private annotation.
    pub unit_tag: Option<String>,
    /// Creation time, used to pick the canonical event among duplicates.
    pub created: Option<DateTime<Utc>>,
}

impl RemoteEvent {
    /// Creates an untagged, empty event with the given id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            summary: String::new(),
            description: String::new(),
            span: None,
            color_id: None,
            booking_tag: None,
            unit_tag: None,
            created: None,
        }
    }

    /// Creates the event a provider would hold after writing `content`.
    pub fn from_content(id: impl Into<String>, content: &EventContent) -> Self {
        Self {
            id: id.into(),
            summary: content.summary.clone(),
            description: content.description.clone(),
            span: Some(content.span),
            color_id: Some(content.color_id.clone()),
            booking_tag: Some(content.booking_tag.clone()),
            unit_tag: Some(content.unit_tag.clone()),
            created: None,
        }
    }

    /// Builder: set the creation time.
    pub fn with_created(mut self, created: DateTime<Utc>) -> Self {
        self.created = Some(created);
        self
    }

    /// Returns true if the event carries a booking identity tag.
    pub fn is_tagged(&self) -> bool {
        self.booking_tag.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// Lists the managed fields where this event departs from `desired`.
    ///
    /// An empty result means the event already matches and needs no write.
    pub fn diff(&self, desired: &EventContent) -> Vec<EventField> {
        let mut changed = Vec::new();
        if self.summary != desired.summary {
            changed.push(EventField::Summary);
        }
        if self.description != desired.description {
            changed.push(EventField::Description);
        }
        if self.span != Some(desired.span) {
            changed.push(EventField::Span);
        }
        if self.color_id.as_deref() != Some(desired.color_id.as_str()) {
            changed.push(EventField::Color);
        }
        if self.booking_tag.as_deref() != Some(desired.booking_tag.as_str()) {
            changed.push(EventField::BookingTag);
        }
        if self.unit_tag.as_deref() != Some(desired.unit_tag.as_str()) {
            changed.push(EventField::UnitTag);
        }
        changed
    }
}
