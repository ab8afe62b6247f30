//! The reconciliation pass.
//!
//! A pass reads every unit, groups units by calendar, and reconciles each
//! group: per booking resolve, materialize, compare, then insert, update or
//! skip. The group then lists its calendar once and sweeps it: each unit's
//! events of bookings that are gone or cancelled, then tagged events whose
//! booking is not live on this calendar at all (removed units, units that
//! moved to another calendar).
//!
//! Failures are isolated. A bad booking is recorded and its siblings carry
//! on; a unit whose bookings cannot be read is recorded and skipped, sweep
//! included, and the calendar-wide stray sweep is skipped with it. Only an
//! unreadable unit list fails the pass.

use std::collections::HashSet;
use std::sync::Arc;

use bookingsync_core::{Booking, Materializer, Unit, sanitize_event_id};
use bookingsync_providers::{CalendarProvider, EventQuery, RemoteEvent, SourceReader};
use chrono::Utc;
use futures_util::future::join_all;
use futures_util::stream::{self, StreamExt};
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::config::SyncOptions;
use crate::error::{SyncError, SyncResult};
use crate::identity::{IdentityResolver, Resolution};
use crate::plan::{Action, plan_booking, plan_strays, plan_sweep};
use crate::report::{PassReport, Tally};
use crate::resilient::{ResilientCalendar, Written};

/// Units sharing one calendar.
#[derive(Debug)]
struct CalendarGroup {
    calendar_id: String,
    units: Vec<Unit>,
}

/// A unit whose bookings were read this pass, awaiting its sweep.
struct ReadUnit<'a> {
    unit: &'a Unit,
    /// Ids of present, non-cancelled bookings, failed ones included.
    live: HashSet<String>,
    resolver: IdentityResolver<'a>,
}

/// Runs reconciliation passes.
pub struct Reconciler {
    calendar: ResilientCalendar,
    source: Arc<dyn SourceReader>,
    materializer: Materializer,
    options: SyncOptions,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("calendar", &self.calendar)
            .field("source", &self.source.name())
            .field("options", &self.options)
            .finish()
    }
}

impl Reconciler {
    /// Creates a reconciler over explicit collaborators.
    pub fn new(
        calendar: Arc<dyn CalendarProvider>,
        source: Arc<dyn SourceReader>,
        options: SyncOptions,
    ) -> Self {
        Self {
            calendar: ResilientCalendar::new(calendar, options.retry),
            source,
            materializer: Materializer::new(options.default_color_id.clone()),
            options,
        }
    }

    /// Returns the options.
    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    /// Runs one full pass.
    ///
    /// # Errors
    ///
    /// Fails only when the unit list cannot be read. Everything else is
    /// recorded in the returned report.
    pub async fn run_pass(&self) -> SyncResult<PassReport> {
        let span = info_span!("pass", dry_run = self.options.dry_run);
        self.pass().instrument(span).await
    }

    async fn pass(&self) -> SyncResult<PassReport> {
        let started_at = Utc::now();
        info!(source = self.source.name(), "reconciliation pass started");

        let units = self.source.list_units().await.map_err(|e| {
            error!(error = %e, "cannot read units");
            SyncError::Source(e)
        })?;
        let units_seen = units.len();

        let mut tally = Tally::default();
        let mut unassigned = HashSet::new();
        let groups = self.group_by_calendar(units, &mut unassigned, &mut tally);
        let unassigned = &unassigned;

        let results: Vec<Tally> = stream::iter(groups)
            .map(|group| self.sync_group(group, unassigned))
            .buffer_unordered(self.options.unit_concurrency.max(1))
            .collect()
            .await;
        for result in results {
            tally.absorb(result);
        }

        let report = PassReport::new(started_at, units_seen, self.options.dry_run, tally);
        info!(
            units = report.units_seen,
            inserted = report.inserted,
            updated = report.updated,
            deleted = report.deleted,
            skipped = report.skipped,
            duplicates_removed = report.duplicates_removed,
            failures = report.failures.len(),
            "reconciliation pass finished"
        );
        Ok(report)
    }

    /// Assigns each unit its calendar, recording units that have none in
    /// `unassigned`. Sweep-only calendars get a group without units.
    fn group_by_calendar(
        &self,
        units: Vec<Unit>,
        unassigned: &mut HashSet<String>,
        tally: &mut Tally,
    ) -> Vec<CalendarGroup> {
        let mut groups: Vec<CalendarGroup> = Vec::new();
        for unit in units {
            let calendar_id = unit
                .calendar_id
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .or(self.options.default_calendar_id.as_deref())
                .map(str::to_string);

            let Some(calendar_id) = calendar_id else {
                let err = SyncError::missing_calendar(&unit.id);
                error!(unit_id = %unit.id, "{}", err);
                tally.fail(&unit.id, None, &err);
                unassigned.insert(unit.id);
                continue;
            };

            match groups.iter_mut().find(|g| g.calendar_id == calendar_id) {
                Some(group) => group.units.push(unit),
                None => groups.push(CalendarGroup {
                    calendar_id,
                    units: vec![unit],
                }),
            }
        }

        for calendar_id in &self.options.sweep_calendars {
            if !groups.iter().any(|g| &g.calendar_id == calendar_id) {
                groups.push(CalendarGroup {
                    calendar_id: calendar_id.clone(),
                    units: Vec::new(),
                });
            }
        }
        groups
    }

    async fn sync_group(&self, group: CalendarGroup, unassigned: &HashSet<String>) -> Tally {
        let calendar_id = group.calendar_id.as_str();
        let mut tally = Tally::default();
        let mut read = Vec::with_capacity(group.units.len());
        for unit in &group.units {
            let span = info_span!("unit", unit_id = %unit.id, calendar_id);
            if let Some(unit) = self.sync_unit(calendar_id, unit, &mut tally).instrument(span).await {
                read.push(unit);
            }
        }

        let complete = read.len() == group.units.len();
        let span = info_span!("sweep", calendar_id);
        self.sweep(calendar_id, &read, complete, unassigned, &mut tally)
            .instrument(span)
            .await;
        tally
    }

    /// Reconciles the bookings of one unit. Returns `None` when they cannot
    /// be read.
    async fn sync_unit<'a>(
        &'a self,
        calendar_id: &'a str,
        unit: &'a Unit,
        tally: &mut Tally,
    ) -> Option<ReadUnit<'a>> {
        let bookings = match self.source.list_bookings(&unit.id).await {
            Ok(bookings) => bookings,
            Err(e) => {
                let err = SyncError::Source(e);
                error!(error = %err, "cannot read bookings, skipping unit");
                tally.fail(&unit.id, None, &err);
                return None;
            }
        };

        let mut resolver = IdentityResolver::new(&self.calendar, calendar_id);
        for booking in &bookings {
            if booking.is_cancelled() {
                debug!(booking_id = %booking.id, "cancelled, left to the sweep");
                continue;
            }
            if let Err(err) = self.sync_booking(calendar_id, unit, booking, &mut resolver, tally).await {
                error!(booking_id = %booking.id, kind = ?err.kind(), error = %err, "booking failed");
                tally.fail(&unit.id, Some(&booking.id), &err);
            }
        }

        let live = bookings
            .iter()
            .filter(|b| !b.is_cancelled())
            .map(|b| b.id.trim())
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect();
        Some(ReadUnit {
            unit,
            live,
            resolver,
        })
    }

    async fn sync_booking(
        &self,
        calendar_id: &str,
        unit: &Unit,
        booking: &Booking,
        resolver: &mut IdentityResolver<'_>,
        tally: &mut Tally,
    ) -> SyncResult<()> {
        let desired = self
            .materializer
            .materialize(booking, unit)
            .map_err(|reason| SyncError::validation(&booking.id, reason))?;
        let booking_id = desired.booking_tag.as_str();
        let insert_id = self.insert_id(booking_id);

        let existing = match resolver.resolve(booking).await? {
            Resolution::Unknown => None,
            Resolution::Cached(event) => Some(event),
            Resolution::Found {
                canonical,
                duplicates,
            } => {
                let (removed, failed) = self.delete_batched(calendar_id, &duplicates).await;
                tally.duplicates_removed += removed;
                if let Some(err) = failed {
                    return Err(err);
                }
                Some(canonical)
            }
        };

        let action = plan_booking(existing.as_ref(), &desired);
        debug!(booking_id, ?action, "planned");

        let event_id = match action {
            Action::Skip { event_id } => {
                tally.skipped += 1;
                event_id
            }
            Action::Insert if self.options.dry_run => {
                tally.inserted += 1;
                return Ok(());
            }
            Action::Update { .. } if self.options.dry_run => {
                tally.updated += 1;
                return Ok(());
            }
            Action::Insert => {
                let written = self
                    .calendar
                    .insert(calendar_id, &desired, insert_id.as_deref())
                    .await?;
                self.count_write(&written, tally);
                written.event().id.clone()
            }
            Action::Update { event_id, changed } => {
                debug!(booking_id, event_id, ?changed, "updating");
                let written = self
                    .calendar
                    .update_or_insert(calendar_id, &event_id, &desired, insert_id.as_deref())
                    .await?;
                self.count_write(&written, tally);
                written.event().id.clone()
            }
        };

        resolver.remember(booking_id, &event_id);
        self.write_back(booking, &event_id).await;
        Ok(())
    }

    fn insert_id(&self, booking_id: &str) -> Option<String> {
        if self.options.deterministic_event_ids {
            sanitize_event_id(booking_id)
        } else {
            None
        }
    }

    fn count_write(&self, written: &Written, tally: &mut Tally) {
        match written {
            Written::Inserted(event) => {
                info!(event_id = %event.id, "inserted event");
                tally.inserted += 1;
            }
            Written::Updated(event) => {
                info!(event_id = %event.id, "updated event");
                tally.updated += 1;
            }
        }
    }

    /// Persists the resolved event id on the booking when it changed.
    async fn write_back(&self, booking: &Booking, event_id: &str) {
        if !self.options.write_back_event_ids
            || self.options.dry_run
            || booking.cached_event_id() == Some(event_id)
        {
            return;
        }
        if let Err(e) = self.source.record_remote_event_id(booking, event_id).await {
            warn!(booking_id = %booking.id, event_id, error = %e, "could not record event id");
        }
    }

    /// Sweeps one calendar from a single listing.
    ///
    /// Each read unit loses the events of its gone or cancelled bookings and
    /// the duplicates its bookings settled against. A unit counts as synced
    /// once its share of the sweep succeeded. When every unit of the group
    /// was read, tagged events of other units whose booking is not live here
    /// are removed too; events of units without a calendar are left alone.
    async fn sweep(
        &self,
        calendar_id: &str,
        read: &[ReadUnit<'_>],
        complete: bool,
        unassigned: &HashSet<String>,
        tally: &mut Tally,
    ) {
        if read.is_empty() && !complete {
            return;
        }

        let events = match self.calendar.list(calendar_id, &EventQuery::new()).await {
            Ok(events) => events,
            Err(err) => {
                error!(error = %err, "cannot list calendar, sweep skipped");
                for unit in read {
                    tally.fail(&unit.unit.id, None, &err);
                }
                if read.is_empty() {
                    tally.fail(calendar_id, None, &err);
                }
                return;
            }
        };

        for unit in read {
            let own: Vec<RemoteEvent> = events
                .iter()
                .filter(|e| e.unit_tag.as_deref() == Some(unit.unit.id.as_str()))
                .cloned()
                .collect();
            let live: HashSet<&str> = unit.live.iter().map(String::as_str).collect();
            let plan = plan_sweep(&own, &live, |tag| unit.resolver.known(tag));
            if !plan.is_empty() {
                debug!(
                    unit_id = %unit.unit.id,
                    orphans = plan.orphans.len(),
                    duplicates = plan.duplicates.len(),
                    "sweeping unit"
                );
            }
            let orphans: Vec<RemoteEvent> = plan.orphans.into_iter().cloned().collect();
            let duplicates: Vec<RemoteEvent> = plan.duplicates.into_iter().cloned().collect();

            let (deleted, orphan_error) = self.delete_batched(calendar_id, &orphans).await;
            let (collapsed, duplicate_error) = self.delete_batched(calendar_id, &duplicates).await;
            tally.deleted += deleted;
            tally.duplicates_removed += collapsed;
            match orphan_error.or(duplicate_error) {
                Some(err) => {
                    error!(unit_id = %unit.unit.id, error = %err, "sweep failed");
                    tally.fail(&unit.unit.id, None, &err);
                }
                None => tally.units_synced += 1,
            }
        }

        if !complete {
            debug!("a unit could not be read, stray sweep skipped");
            return;
        }
        let units: HashSet<&str> = read.iter().map(|u| u.unit.id.as_str()).collect();
        let live: HashSet<&str> = read
            .iter()
            .flat_map(|u| u.live.iter().map(String::as_str))
            .collect();
        let protected: HashSet<&str> = unassigned.iter().map(String::as_str).collect();
        let strays: Vec<RemoteEvent> = plan_strays(&events, &units, &live, &protected)
            .into_iter()
            .cloned()
            .collect();
        if strays.is_empty() {
            return;
        }

        debug!(strays = strays.len(), "sweeping events of units no longer on this calendar");
        let (deleted, failed) = self.delete_batched(calendar_id, &strays).await;
        tally.deleted += deleted;
        if let Some(err) = failed {
            error!(error = %err, "stray sweep failed");
            tally.fail(calendar_id, None, &err);
        }
    }

    /// Deletes `events` a bounded batch at a time.
    ///
    /// Every batch is attempted. Returns the number deleted and the first
    /// error, if any.
    async fn delete_batched(
        &self,
        calendar_id: &str,
        events: &[RemoteEvent],
    ) -> (usize, Option<SyncError>) {
        if self.options.dry_run {
            return (events.len(), None);
        }

        let mut deleted = 0;
        let mut first_error = None;
        for batch in events.chunks(self.options.delete_batch_size.max(1)) {
            let results = join_all(batch.iter().map(|event| async move {
                let result = self.calendar.delete(calendar_id, &event.id).await;
                (event, result)
            }))
            .await;

            for (event, result) in results {
                match result {
                    Ok(()) => {
                        info!(
                            event_id = %event.id,
                            booking_id = event.booking_tag.as_deref().unwrap_or_default(),
                            "deleted event"
                        );
                        deleted += 1;
                    }
                    Err(err) => {
                        error!(event_id = %event.id, error = %err, "delete failed");
                        first_error.get_or_insert(err);
                    }
                }
            }
        }
        (deleted, first_error)
    }
}
