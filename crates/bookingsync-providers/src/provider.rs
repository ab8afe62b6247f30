//! CalendarProvider trait definition.
//!
//! This module defines the [`CalendarProvider`] trait, the seam between the
//! reconciliation engine and a calendar backend. Every call is scoped to one
//! calendar id.
//!
//! Providers are responsible for:
//! - Translating [`EventContent`] into the backend's event representation
//! - Writing the booking and unit identity tags as private, queryable data
//! - Classifying failures into [`ProviderErrorCode`](crate::ProviderErrorCode)s
//!
//! Providers do not retry. Backoff lives in the engine so that every call
//! shares one policy.

use std::future::Future;
use std::pin::Pin;

use bookingsync_core::{DateSpan, EventContent};

use crate::error::ProviderResult;
use crate::remote_event::RemoteEvent;

/// A boxed future for async trait methods.
///
/// Boxed futures keep the trait object-safe, so the engine can hold an
/// `Arc<dyn CalendarProvider>` and tests can substitute an in-memory fake.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Filter for listing events.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventQuery {
    /// Only events whose booking identity tag equals this value.
    pub booking_tag: Option<String>,
    /// Only events whose unit tag equals this value.
    pub unit_tag: Option<String>,
    /// Only events overlapping this window.
    pub window: Option<DateSpan>,
}

impl EventQuery {
    /// Creates an unfiltered query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Events carrying the identity tag of one booking.
    pub fn for_booking(booking_id: impl Into<String>) -> Self {
        Self {
            booking_tag: Some(booking_id.into()),
            ..Self::default()
        }
    }

    /// Events created for one unit.
    pub fn for_unit(unit_id: impl Into<String>) -> Self {
        Self {
            unit_tag: Some(unit_id.into()),
            ..Self::default()
        }
    }

    /// Builder: restrict to events overlapping `window`.
    pub fn with_window(mut self, window: DateSpan) -> Self {
        self.window = Some(window);
        self
    }

    /// Returns true if `event` satisfies every filter in this query.
    ///
    /// Backends that cannot express a filter server-side apply this after
    /// fetching.
    pub fn matches(&self, event: &RemoteEvent) -> bool {
        if let Some(ref tag) = self.booking_tag
            && event.booking_tag.as_ref() != Some(tag)
        {
            return false;
        }
        if let Some(ref tag) = self.unit_tag
            && event.unit_tag.as_ref() != Some(tag)
        {
            return false;
        }
        if let Some(window) = self.window {
            return match event.span {
                Some(span) => span.start() < window.end() && window.start() < span.end(),
                None => false,
            };
        }
        true
    }
}

/// The core abstraction for calendar backends.
///
/// # Contract
///
/// - `insert_event` creates an event; the provider assigns the id unless
///   `event_id` is given, in which case it must already be sanitized to the
///   provider's id alphabet. A taken id fails with `Conflict`.
/// - `update_event` replaces the managed fields; fails with `NotFound` if the
///   event is gone.
/// - `delete_event` fails with `NotFound` if the event is already gone; the
///   engine treats that as success.
/// - `list_events` never returns deleted events.
pub trait CalendarProvider: Send + Sync {
    /// Returns the name/type of this provider (e.g., "google", "memory").
    fn name(&self) -> &str;

    /// Lists events matching `query`, following pagination internally.
    fn list_events<'a>(
        &'a self,
        calendar_id: &'a str,
        query: &'a EventQuery,
    ) -> BoxFuture<'a, ProviderResult<Vec<RemoteEvent>>>;

    /// Fetches one event by id.
    fn get_event<'a>(
        &'a self,
        calendar_id: &'a str,
        event_id: &'a str,
    ) -> BoxFuture<'a, ProviderResult<RemoteEvent>>;

    /// Creates an event and returns it as stored.
    fn insert_event<'a>(
        &'a self,
        calendar_id: &'a str,
        content: &'a EventContent,
        event_id: Option<&'a str>,
    ) -> BoxFuture<'a, ProviderResult<RemoteEvent>>;

    /// Overwrites the managed fields of an existing event.
    fn update_event<'a>(
        &'a self,
        calendar_id: &'a str,
        event_id: &'a str,
        content: &'a EventContent,
    ) -> BoxFuture<'a, ProviderResult<RemoteEvent>>;

    /// Deletes an event.
    fn delete_event<'a>(
        &'a self,
        calendar_id: &'a str,
        event_id: &'a str,
    ) -> BoxFuture<'a, ProviderResult<()>>;
}
