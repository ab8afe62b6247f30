//! In-memory provider and source.
//!
//! [`MemoryCalendar`] and [`MemorySource`] stand in for the remote calendar
//! and the source store in tests and dry runs. The calendar records every
//! call and can be scripted to fail, so retry, race, and fault-isolation
//! behavior can be exercised without a network.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration as Latency;

use bookingsync_core::{Booking, EventContent, Unit};
use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::error::{ProviderError, ProviderErrorCode, ProviderResult};
use crate::provider::{BoxFuture, CalendarProvider, EventQuery};
use crate::remote_event::RemoteEvent;
use crate::source::SourceReader;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A calendar call kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    List,
    Get,
    Insert,
    Update,
    Delete,
}

/// A scripted failure.
#[derive(Debug, Clone)]
pub struct FailureRule {
    operation: Operation,
    /// Only calls touching this booking tag (insert/update/list) or event id.
    target: Option<String>,
    /// Remaining failures; `None` fails forever.
    remaining: Option<usize>,
    code: ProviderErrorCode,
}

impl FailureRule {
    /// Fails every call of `operation` with `code`.
    pub fn always(operation: Operation, code: ProviderErrorCode) -> Self {
        Self {
            operation,
            target: None,
            remaining: None,
            code,
        }
    }

    /// Fails the next `times` calls of `operation` with `code`.
    pub fn times(operation: Operation, code: ProviderErrorCode, times: usize) -> Self {
        Self {
            operation,
            target: None,
            remaining: Some(times),
            code,
        }
    }

    /// Builder: only fail calls about this booking tag or event id.
    pub fn for_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }
}

/// Number of calls received, per operation. Failed calls count too.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallStats {
    pub lists: usize,
    pub gets: usize,
    pub inserts: usize,
    pub updates: usize,
    pub deletes: usize,
}

impl CallStats {
    /// Calls that change remote state.
    pub fn mutations(&self) -> usize {
        self.inserts + self.updates + self.deletes
    }
}

/// In-memory [`CalendarProvider`].
#[derive(Debug, Default)]
pub struct MemoryCalendar {
    calendars: Mutex<HashMap<String, BTreeMap<String, RemoteEvent>>>,
    rules: Mutex<Vec<FailureRule>>,
    stats: Mutex<CallStats>,
    next_id: AtomicU64,
    delete_latency: Mutex<Option<Latency>>,
    deletes_in_flight: AtomicUsize,
    peak_deletes: AtomicUsize,
}

impl MemoryCalendar {
    /// Creates an empty calendar store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a failure rule.
    pub fn fail(&self, rule: FailureRule) {
        lock(&self.rules).push(rule);
    }

    /// Drops every failure rule.
    pub fn clear_failures(&self) {
        lock(&self.rules).clear();
    }

    /// Places an event directly, bypassing call accounting.
    pub fn seed(&self, calendar_id: &str, event: RemoteEvent) {
        lock(&self.calendars)
            .entry(calendar_id.to_string())
            .or_default()
            .insert(event.id.clone(), event);
    }

    /// Removes an event directly, as if deleted by someone else.
    pub fn remove(&self, calendar_id: &str, event_id: &str) -> Option<RemoteEvent> {
        lock(&self.calendars)
            .get_mut(calendar_id)
            .and_then(|events| events.remove(event_id))
    }

    /// Returns every event in a calendar, ordered by id.
    pub fn events(&self, calendar_id: &str) -> Vec<RemoteEvent> {
        lock(&self.calendars)
            .get(calendar_id)
            .map(|events| events.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Returns the events tagged with a booking id.
    pub fn events_for_booking(&self, calendar_id: &str, booking_id: &str) -> Vec<RemoteEvent> {
        self.events(calendar_id)
            .into_iter()
            .filter(|e| e.booking_tag.as_deref() == Some(booking_id))
            .collect()
    }

    /// Makes every delete wait `latency` before it answers.
    pub fn set_delete_latency(&self, latency: Latency) {
        *lock(&self.delete_latency) = Some(latency);
    }

    /// Highest number of deletes seen in flight at once.
    pub fn peak_concurrent_deletes(&self) -> usize {
        self.peak_deletes.load(Ordering::SeqCst)
    }

    /// Returns the call counters.
    pub fn stats(&self) -> CallStats {
        *lock(&self.stats)
    }

    /// Resets the call counters.
    pub fn reset_stats(&self) {
        *lock(&self.stats) = CallStats::default();
    }

    fn record(&self, operation: Operation) {
        let mut stats = lock(&self.stats);
        match operation {
            Operation::List => stats.lists += 1,
            Operation::Get => stats.gets += 1,
            Operation::Insert => stats.inserts += 1,
            Operation::Update => stats.updates += 1,
            Operation::Delete => stats.deletes += 1,
        }
    }

    /// Counts the call and returns a scripted failure, if one applies.
    fn check(&self, operation: Operation, targets: &[&str]) -> ProviderResult<()> {
        self.record(operation);

        let mut rules = lock(&self.rules);
        let hit = rules.iter_mut().find(|rule| {
            rule.operation == operation
                && rule.remaining != Some(0)
                && rule
                    .target
                    .as_deref()
                    .is_none_or(|t| targets.contains(&t))
        });

        match hit {
            Some(rule) => {
                if let Some(ref mut remaining) = rule.remaining {
                    *remaining -= 1;
                }
                Err(ProviderError::new(rule.code, format!("scripted {:?} failure", operation))
                    .with_provider("memory"))
            }
            None => Ok(()),
        }
    }

    /// Deterministic, strictly increasing creation times.
    fn created_at(sequence: u64) -> DateTime<Utc> {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().unwrap_or_default();
        base + Duration::seconds(i64::try_from(sequence).unwrap_or(i64::MAX / 2))
    }

    fn not_found(calendar_id: &str, event_id: &str) -> ProviderError {
        ProviderError::not_found(format!("event {event_id} not found in {calendar_id}"))
            .with_provider("memory")
    }
}

impl CalendarProvider for MemoryCalendar {
    fn name(&self) -> &str {
        "memory"
    }

    fn list_events<'a>(
        &'a self,
        calendar_id: &'a str,
        query: &'a EventQuery,
    ) -> BoxFuture<'a, ProviderResult<Vec<RemoteEvent>>> {
        Box::pin(async move {
            let targets: Vec<&str> = query.booking_tag.iter().map(String::as_str).collect();
            self.check(Operation::List, &targets)?;
            Ok(self
                .events(calendar_id)
                .into_iter()
                .filter(|e| query.matches(e))
                .collect())
        })
    }

    fn get_event<'a>(
        &'a self,
        calendar_id: &'a str,
        event_id: &'a str,
    ) -> BoxFuture<'a, ProviderResult<RemoteEvent>> {
        Box::pin(async move {
            self.check(Operation::Get, &[event_id])?;
            lock(&self.calendars)
                .get(calendar_id)
                .and_then(|events| events.get(event_id))
                .cloned()
                .ok_or_else(|| Self::not_found(calendar_id, event_id))
        })
    }

    fn insert_event<'a>(
        &'a self,
        calendar_id: &'a str,
        content: &'a EventContent,
        event_id: Option<&'a str>,
    ) -> BoxFuture<'a, ProviderResult<RemoteEvent>> {
        Box::pin(async move {
            self.check(Operation::Insert, &[content.booking_tag.as_str()])?;

            let sequence = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
            let id = event_id
                .map(str::to_string)
                .unwrap_or_else(|| format!("mem{sequence:06}"));

            let mut calendars = lock(&self.calendars);
            let events = calendars.entry(calendar_id.to_string()).or_default();
            if events.contains_key(&id) {
                return Err(ProviderError::conflict(format!("event {id} already exists"))
                    .with_provider("memory"));
            }

            let event = RemoteEvent::from_content(&id, content).with_created(Self::created_at(sequence));
            events.insert(id, event.clone());
            Ok(event)
        })
    }

    fn update_event<'a>(
        &'a self,
        calendar_id: &'a str,
        event_id: &'a str,
        content: &'a EventContent,
    ) -> BoxFuture<'a, ProviderResult<RemoteEvent>> {
        Box::pin(async move {
            self.check(Operation::Update, &[content.booking_tag.as_str(), event_id])?;

            let mut calendars = lock(&self.calendars);
            let existing = calendars
                .get_mut(calendar_id)
                .and_then(|events| events.get_mut(event_id))
                .ok_or_else(|| Self::not_found(calendar_id, event_id))?;

            let created = existing.created;
            *existing = RemoteEvent::from_content(event_id, content);
            existing.created = created;
            Ok(existing.clone())
        })
    }

    fn delete_event<'a>(
        &'a self,
        calendar_id: &'a str,
        event_id: &'a str,
    ) -> BoxFuture<'a, ProviderResult<()>> {
        Box::pin(async move {
            let in_flight = self.deletes_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak_deletes.fetch_max(in_flight, Ordering::SeqCst);
            let latency = *lock(&self.delete_latency);
            if let Some(latency) = latency {
                tokio::time::sleep(latency).await;
            }

            let result = self.check(Operation::Delete, &[event_id]).and_then(|()| {
                self.remove(calendar_id, event_id)
                    .map(|_| ())
                    .ok_or_else(|| Self::not_found(calendar_id, event_id))
            });
            self.deletes_in_flight.fetch_sub(1, Ordering::SeqCst);
            result
        })
    }
}

/// In-memory [`SourceReader`].
///
/// Recorded event ids are written back onto the stored bookings, so a second
/// pass sees them as cached identities, just like a real store.
#[derive(Debug, Default)]
pub struct MemorySource {
    units: Mutex<Vec<Unit>>,
    bookings: Mutex<Vec<Booking>>,
    failing_units: Mutex<HashSet<String>>,
    unreadable: Mutex<bool>,
}

impl MemorySource {
    /// Creates a source holding `units` and `bookings`.
    pub fn new(units: Vec<Unit>, bookings: Vec<Booking>) -> Self {
        Self {
            units: Mutex::new(units),
            bookings: Mutex::new(bookings),
            ..Self::default()
        }
    }

    /// Returns a snapshot of the stored bookings.
    pub fn bookings(&self) -> Vec<Booking> {
        lock(&self.bookings).clone()
    }

    /// Replaces the unit list, as when units are added, removed or moved.
    pub fn set_units(&self, units: Vec<Unit>) {
        *lock(&self.units) = units;
    }

    /// Inserts or replaces a booking by id.
    pub fn upsert_booking(&self, booking: Booking) {
        let mut bookings = lock(&self.bookings);
        match bookings.iter_mut().find(|b| b.id == booking.id) {
            Some(existing) => *existing = booking,
            None => bookings.push(booking),
        }
    }

    /// Deletes a booking outright (no cancellation status).
    pub fn remove_booking(&self, booking_id: &str) {
        lock(&self.bookings).retain(|b| b.id != booking_id);
    }

    /// Makes `list_bookings` fail for one unit.
    pub fn fail_bookings_for(&self, unit_id: impl Into<String>) {
        lock(&self.failing_units).insert(unit_id.into());
    }

    /// Makes `list_units` fail.
    pub fn set_unreadable(&self, unreadable: bool) {
        *lock(&self.unreadable) = unreadable;
    }
}

impl SourceReader for MemorySource {
    fn name(&self) -> &str {
        "memory"
    }

    fn list_units(&self) -> BoxFuture<'_, ProviderResult<Vec<Unit>>> {
        Box::pin(async move {
            if *lock(&self.unreadable) {
                return Err(ProviderError::network("source unavailable").with_provider("memory"));
            }
            Ok(lock(&self.units).clone())
        })
    }

    fn list_bookings<'a>(&'a self, unit_id: &'a str) -> BoxFuture<'a, ProviderResult<Vec<Booking>>> {
        Box::pin(async move {
            if lock(&self.failing_units).contains(unit_id) {
                return Err(ProviderError::server(format!("bookings for {unit_id} unavailable"))
                    .with_provider("memory"));
            }
            Ok(lock(&self.bookings)
                .iter()
                .filter(|b| b.unit_id == unit_id)
                .cloned()
                .collect())
        })
    }

    fn record_remote_event_id<'a>(
        &'a self,
        booking: &'a Booking,
        event_id: &'a str,
    ) -> BoxFuture<'a, ProviderResult<()>> {
        Box::pin(async move {
            if let Some(stored) = lock(&self.bookings).iter_mut().find(|b| b.id == booking.id) {
                stored.remote_event_id = Some(event_id.to_string());
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookingsync_core::{DateSpan, Materializer};
    use chrono::NaiveDate;

    fn content(booking: &str) -> EventContent {
        let start = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let booking = Booking::new(booking, "u1").with_stay(start, start.succ_opt().unwrap());
        Materializer::default()
            .materialize(&booking, &Unit::new("u1", "Loft"))
            .unwrap()
    }

    #[tokio::test]
    async fn insert_list_update_delete() {
        let calendar = MemoryCalendar::new();

        let inserted = calendar.insert_event("cal", &content("b1"), None).await.unwrap();
        assert!(inserted.created.is_some());

        let found = calendar
            .list_events("cal", &EventQuery::for_booking("b1"))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);

        let mut changed = content("b1");
        changed.summary = "Booking: Attic".to_string();
        let updated = calendar.update_event("cal", &inserted.id, &changed).await.unwrap();
        assert_eq!(updated.summary, "Booking: Attic");
        assert_eq!(updated.created, inserted.created);

        calendar.delete_event("cal", &inserted.id).await.unwrap();
        let err = calendar.delete_event("cal", &inserted.id).await.unwrap_err();
        assert!(err.is_not_found());

        let stats = calendar.stats();
        assert_eq!(stats.mutations(), 4);
        assert_eq!(stats.lists, 1);
    }

    #[tokio::test]
    async fn caller_supplied_id_conflicts_when_taken() {
        let calendar = MemoryCalendar::new();
        calendar.insert_event("cal", &content("b1"), Some("bk6231")).await.unwrap();
        let err = calendar
            .insert_event("cal", &content("b1"), Some("bk6231"))
            .await
            .unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn scripted_failures_run_out() {
        let calendar = MemoryCalendar::new();
        calendar.fail(FailureRule::times(Operation::Insert, ProviderErrorCode::RateLimited, 2));

        for _ in 0..2 {
            let err = calendar.insert_event("cal", &content("b1"), None).await.unwrap_err();
            assert_eq!(err.code(), ProviderErrorCode::RateLimited);
        }
        assert!(calendar.insert_event("cal", &content("b1"), None).await.is_ok());
    }

    #[tokio::test]
    async fn targeted_failures_spare_other_bookings() {
        let calendar = MemoryCalendar::new();
        calendar.fail(
            FailureRule::always(Operation::Insert, ProviderErrorCode::BadRequest).for_target("b1"),
        );

        assert!(calendar.insert_event("cal", &content("b1"), None).await.is_err());
        assert!(calendar.insert_event("cal", &content("b2"), None).await.is_ok());
    }

    #[tokio::test]
    async fn update_of_missing_event_is_not_found() {
        let calendar = MemoryCalendar::new();
        let err = calendar
            .update_event("cal", "nope", &content("b1"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn source_records_event_ids() {
        let start = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 2, 2).unwrap();
        let booking = Booking::new("b1", "u1").with_stay(start, end);
        let source = MemorySource::new(vec![Unit::new("u1", "Loft")], vec![booking.clone()]);

        source.record_remote_event_id(&booking, "evt9").await.unwrap();
        let bookings = source.list_bookings("u1").await.unwrap();
        assert_eq!(bookings[0].remote_event_id.as_deref(), Some("evt9"));
        assert!(source.list_bookings("u2").await.unwrap().is_empty());
        assert!(DateSpan::from_stay(bookings[0].checkin_date, bookings[0].checkout_date).is_ok());
    }

    #[tokio::test]
    async fn source_failures_are_reported() {
        let source = MemorySource::new(vec![Unit::new("u1", "Loft")], vec![]);
        source.fail_bookings_for("u1");
        assert!(source.list_bookings("u1").await.is_err());

        source.set_unreadable(true);
        assert!(source.list_units().await.is_err());
    }
}
