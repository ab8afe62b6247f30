use std::sync::Arc;
use std::time::Duration;

use bookingsync_core::{Booking, DateSpan, EventContent, Materializer, Unit};
use bookingsync_engine::{FailureKind, PassStatus, Reconciler, RetryPolicy, SyncError, SyncOptions};
use bookingsync_providers::{
    FailureRule, MemoryCalendar, MemorySource, Operation, ProviderErrorCode, RemoteEvent,
};
use chrono::{NaiveDate, TimeZone, Utc};

const CAL: &str = "cal-main";

fn d(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 8, day).unwrap()
}

fn loft() -> Unit {
    Unit::new("u1", "Loft").with_calendar(CAL)
}

fn cabin() -> Unit {
    Unit::new("u2", "Cabin").with_calendar("cal-cabin").with_color("5")
}

fn stay(id: &str, unit: &str, checkin: u32, checkout: u32) -> Booking {
    Booking::new(id, unit)
        .with_stay(d(checkin), d(checkout))
        .with_guest("Grace", "Hopper")
}

struct Harness {
    calendar: Arc<MemoryCalendar>,
    source: Arc<MemorySource>,
    reconciler: Reconciler,
}

fn harness(units: Vec<Unit>, bookings: Vec<Booking>, options: SyncOptions) -> Harness {
    let calendar = Arc::new(MemoryCalendar::new());
    let source = Arc::new(MemorySource::new(units, bookings));
    let reconciler = Reconciler::new(calendar.clone(), source.clone(), options);
    Harness {
        calendar,
        source,
        reconciler,
    }
}

fn expected(booking: &Booking, unit: &Unit) -> EventContent {
    Materializer::default().materialize(booking, unit).unwrap()
}

#[tokio::test]
async fn first_pass_inserts_every_booking() {
    let h = harness(
        vec![loft(), cabin()],
        vec![stay("b1", "u1", 1, 3), stay("b2", "u1", 5, 6), stay("b3", "u2", 2, 9)],
        SyncOptions::default(),
    );

    let report = h.reconciler.run_pass().await.unwrap();

    assert_eq!(report.status(), PassStatus::Ok);
    assert_eq!((report.units_seen, report.units_synced), (2, 2));
    assert_eq!(report.inserted, 3);
    assert_eq!(h.calendar.events(CAL).len(), 2);
    assert_eq!(h.calendar.events("cal-cabin").len(), 1);
}

#[tokio::test]
async fn second_pass_makes_no_mutations() {
    let h = harness(
        vec![loft(), cabin()],
        vec![stay("b1", "u1", 1, 3), stay("b3", "u2", 2, 9)],
        SyncOptions::default(),
    );
    h.reconciler.run_pass().await.unwrap();
    h.calendar.reset_stats();

    let report = h.reconciler.run_pass().await.unwrap();

    assert_eq!(report.mutations(), 0);
    assert_eq!(report.skipped, 2);
    assert_eq!(h.calendar.stats().mutations(), 0);
}

#[tokio::test]
async fn second_pass_without_write_back_is_also_idempotent() {
    let h = harness(
        vec![loft()],
        vec![stay("b1", "u1", 1, 3)],
        SyncOptions::default().with_write_back(false),
    );
    h.reconciler.run_pass().await.unwrap();
    assert_eq!(h.source.bookings()[0].remote_event_id, None);
    h.calendar.reset_stats();

    h.reconciler.run_pass().await.unwrap();
    assert_eq!(h.calendar.stats().mutations(), 0);
}

#[tokio::test]
async fn write_back_records_event_id() {
    let h = harness(vec![loft()], vec![stay("b1", "u1", 1, 3)], SyncOptions::default());
    h.reconciler.run_pass().await.unwrap();

    let event = &h.calendar.events_for_booking(CAL, "b1")[0];
    assert_eq!(h.source.bookings()[0].cached_event_id(), Some(event.id.as_str()));

    // The cached id is trusted: no tag lookup on the next pass.
    h.calendar.reset_stats();
    h.reconciler.run_pass().await.unwrap();
    assert_eq!(h.calendar.stats().gets, 1);
    assert_eq!(h.calendar.stats().lists, 1); // the sweep
}

#[tokio::test]
async fn every_live_booking_converges_to_one_matching_event() {
    let bookings = vec![stay("b1", "u1", 1, 3), stay("b2", "u1", 3, 4)];
    let h = harness(vec![loft()], bookings.clone(), SyncOptions::default());
    // A stale copy with the wrong dates and a foreign, untagged event.
    h.calendar.seed(
        CAL,
        RemoteEvent::from_content("stale", &expected(&stay("b2", "u1", 10, 12), &loft())),
    );
    h.calendar.seed(CAL, RemoteEvent::new("hand-made"));

    let report = h.reconciler.run_pass().await.unwrap();
    assert_eq!((report.inserted, report.updated), (1, 1));

    for booking in &bookings {
        let events = h.calendar.events_for_booking(CAL, &booking.id);
        assert_eq!(events.len(), 1, "booking {}", booking.id);
        assert!(events[0].diff(&expected(booking, &loft())).is_empty());
    }
    assert_eq!(h.calendar.events(CAL).len(), 3, "untagged event is left alone");
}

#[tokio::test]
async fn changed_booking_is_updated_in_place() {
    let h = harness(vec![loft()], vec![stay("b1", "u1", 1, 3)], SyncOptions::default());
    h.reconciler.run_pass().await.unwrap();
    let before = h.calendar.events_for_booking(CAL, "b1")[0].id.clone();

    h.source.upsert_booking(
        stay("b1", "u1", 1, 4).with_remote_event_id(before.clone()),
    );
    let report = h.reconciler.run_pass().await.unwrap();

    assert_eq!(report.updated, 1);
    let after = &h.calendar.events_for_booking(CAL, "b1")[0];
    assert_eq!(after.id, before);
    assert_eq!(after.span.map(|s| s.end()), Some(d(4)));
}

#[tokio::test]
async fn removed_and_cancelled_bookings_lose_their_events() {
    let h = harness(
        vec![loft()],
        vec![stay("b1", "u1", 1, 3), stay("b2", "u1", 4, 6), stay("b3", "u1", 7, 8)],
        SyncOptions::default(),
    );
    h.reconciler.run_pass().await.unwrap();

    h.source.remove_booking("b1");
    let cancelled = h
        .source
        .bookings()
        .into_iter()
        .find(|b| b.id == "b2")
        .unwrap()
        .with_status("Canceled");
    h.source.upsert_booking(cancelled);

    let report = h.reconciler.run_pass().await.unwrap();

    assert_eq!(report.deleted, 2);
    assert!(h.calendar.events_for_booking(CAL, "b1").is_empty());
    assert!(h.calendar.events_for_booking(CAL, "b2").is_empty());
    assert_eq!(h.calendar.events_for_booking(CAL, "b3").len(), 1);
}

#[tokio::test]
async fn units_sharing_a_calendar_never_sweep_each_other() {
    let studio = Unit::new("u3", "Studio").with_calendar(CAL);
    let h = harness(
        vec![loft(), studio],
        vec![stay("b1", "u1", 1, 3), stay("b9", "u3", 1, 3)],
        SyncOptions::default(),
    );

    let first = h.reconciler.run_pass().await.unwrap();
    let second = h.reconciler.run_pass().await.unwrap();

    assert_eq!(first.inserted, 2);
    assert_eq!(second.deleted, 0);
    assert_eq!(h.calendar.events(CAL).len(), 2);
}

#[tokio::test]
async fn half_open_span_blocks_checkin_through_last_night() {
    let h = harness(vec![loft()], vec![stay("b1", "u1", 1, 3)], SyncOptions::default());
    h.reconciler.run_pass().await.unwrap();

    let span: DateSpan = h.calendar.events_for_booking(CAL, "b1")[0].span.unwrap();
    assert!(span.contains(d(1)));
    assert!(span.contains(d(2)));
    assert!(!span.contains(d(3)));
    assert_eq!(span.last_day(), d(2));
}

#[tokio::test]
async fn missing_checkout_blocks_a_single_night() {
    let mut booking = Booking::new("b1", "u1");
    booking.checkin_date = Some(d(5));
    let h = harness(vec![loft()], vec![booking], SyncOptions::default());

    h.reconciler.run_pass().await.unwrap();

    let span = h.calendar.events_for_booking(CAL, "b1")[0].span.unwrap();
    assert_eq!((span.start(), span.end()), (d(5), d(6)));
}

#[tokio::test]
async fn duplicates_collapse_to_the_earliest_event() {
    let booking = stay("b1", "u1", 1, 3);
    let h = harness(vec![loft()], vec![booking.clone()], SyncOptions::default());
    let at = |s| Utc.with_ymd_and_hms(2023, 12, 1, 0, 0, s).unwrap();
    let mut outdated = expected(&booking, &loft());
    outdated.summary = "Booking: old name".to_string();
    h.calendar.seed(CAL, RemoteEvent::from_content("first", &outdated).with_created(at(1)));
    h.calendar.seed(CAL, RemoteEvent::from_content("second", &outdated).with_created(at(2)));
    h.calendar.seed(CAL, RemoteEvent::from_content("third", &outdated).with_created(at(3)));

    let report = h.reconciler.run_pass().await.unwrap();

    assert_eq!(report.duplicates_removed, 2);
    assert_eq!(report.updated, 1);
    let remaining = h.calendar.events_for_booking(CAL, "b1");
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, "first");
    assert!(remaining[0].diff(&expected(&booking, &loft())).is_empty());
}

#[tokio::test]
async fn duplicates_behind_a_cached_id_are_swept() {
    let booking = stay("b1", "u1", 1, 3);
    let content = expected(&booking, &loft());
    let h = harness(
        vec![loft()],
        vec![booking.clone().with_remote_event_id("mine")],
        SyncOptions::default(),
    );
    h.calendar.seed(CAL, RemoteEvent::from_content("extra", &content));
    h.calendar.seed(CAL, RemoteEvent::from_content("mine", &content));

    let report = h.reconciler.run_pass().await.unwrap();

    assert_eq!(report.duplicates_removed, 1);
    let remaining = h.calendar.events_for_booking(CAL, "b1");
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, "mine");
}

#[tokio::test(start_paused = true)]
async fn throttling_exhausts_after_five_attempts() {
    let h = harness(
        vec![loft()],
        vec![stay("b1", "u1", 1, 3), stay("b2", "u1", 4, 5)],
        SyncOptions::default().with_retry(RetryPolicy::new(Duration::from_millis(1000), 5)),
    );
    h.calendar.fail(
        FailureRule::always(Operation::Insert, ProviderErrorCode::RateLimited).for_target("b1"),
    );

    let started = tokio::time::Instant::now();
    let report = h.reconciler.run_pass().await.unwrap();

    assert_eq!(started.elapsed(), Duration::from_millis(1000 + 2000 + 4000 + 8000 + 16000));
    assert_eq!(report.status(), PassStatus::Partial);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].booking_id.as_deref(), Some("b1"));
    assert_eq!(report.failures[0].kind, FailureKind::Exhausted);
    assert_eq!(report.inserted, 1);
    assert_eq!(h.calendar.stats().inserts, 6);
}

#[tokio::test(start_paused = true)]
async fn transient_throttling_is_absorbed() {
    let h = harness(vec![loft()], vec![stay("b1", "u1", 1, 3)], SyncOptions::default());
    h.calendar.fail(FailureRule::times(Operation::List, ProviderErrorCode::RateLimited, 2));

    let report = h.reconciler.run_pass().await.unwrap();

    assert_eq!(report.status(), PassStatus::Ok);
    assert_eq!(report.inserted, 1);
}

#[tokio::test]
async fn invalid_booking_does_not_block_siblings_or_other_units() {
    let h = harness(
        vec![loft(), cabin()],
        vec![
            Booking::new("broken", "u1"),
            stay("b1", "u1", 1, 3),
            stay("b2", "u2", 1, 3),
        ],
        SyncOptions::default(),
    );

    let report = h.reconciler.run_pass().await.unwrap();

    assert_eq!(report.inserted, 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].booking_id.as_deref(), Some("broken"));
    assert_eq!(report.failures[0].kind, FailureKind::Validation);
}

#[tokio::test]
async fn failing_booking_keeps_its_existing_event() {
    let h = harness(vec![loft()], vec![stay("b1", "u1", 1, 3)], SyncOptions::default());
    h.reconciler.run_pass().await.unwrap();

    // The booking loses its dates: it fails validation but is still present.
    h.source.upsert_booking(Booking::new("b1", "u1"));
    let report = h.reconciler.run_pass().await.unwrap();

    assert_eq!(report.deleted, 0);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(h.calendar.events_for_booking(CAL, "b1").len(), 1);
}

#[tokio::test]
async fn bad_request_is_reported_without_retry() {
    let h = harness(vec![loft()], vec![stay("b1", "u1", 1, 3)], SyncOptions::default());
    h.calendar.fail(FailureRule::always(Operation::Insert, ProviderErrorCode::BadRequest));

    let report = h.reconciler.run_pass().await.unwrap();

    assert_eq!(report.failures[0].kind, FailureKind::Provider);
    assert_eq!(h.calendar.stats().inserts, 1);
}

#[tokio::test]
async fn event_deleted_between_resolve_and_update_is_reinserted() {
    let booking = stay("b1", "u1", 1, 3);
    let h = harness(vec![loft()], vec![booking.clone()], SyncOptions::default());
    let mut outdated = expected(&booking, &loft());
    outdated.color_id = "1".to_string();
    h.calendar.seed(CAL, RemoteEvent::from_content("ev1", &outdated));
    h.calendar.fail(
        FailureRule::times(Operation::Update, ProviderErrorCode::NotFound, 1).for_target("ev1"),
    );

    let report = h.reconciler.run_pass().await.unwrap();

    assert_eq!(report.status(), PassStatus::Ok);
    assert_eq!(report.inserted, 1);
    // The sweep collapses the event the failed update still pointed at.
    assert_eq!(report.duplicates_removed, 1);
    let events = h.calendar.events_for_booking(CAL, "b1");
    assert_eq!(events.len(), 1);
    assert_ne!(events[0].id, "ev1");
}

#[tokio::test]
async fn unit_without_calendar_is_skipped_with_error() {
    let h = harness(
        vec![Unit::new("u9", "Barn"), loft()],
        vec![stay("b9", "u9", 1, 2), stay("b1", "u1", 1, 3)],
        SyncOptions::default(),
    );

    let report = h.reconciler.run_pass().await.unwrap();

    assert_eq!(report.units_synced, 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].kind, FailureKind::MissingCalendar);
    assert_eq!(report.inserted, 1);
}

#[tokio::test]
async fn default_calendar_covers_units_without_one() {
    let h = harness(
        vec![Unit::new("u9", "Barn")],
        vec![stay("b9", "u9", 1, 2)],
        SyncOptions::default().with_default_calendar("fallback"),
    );

    let report = h.reconciler.run_pass().await.unwrap();

    assert_eq!(report.status(), PassStatus::Ok);
    assert_eq!(h.calendar.events("fallback").len(), 1);
}

#[tokio::test]
async fn unreadable_bookings_skip_the_unit_and_its_sweep() {
    let h = harness(
        vec![loft(), cabin()],
        vec![stay("b1", "u1", 1, 3), stay("b2", "u2", 1, 3)],
        SyncOptions::default(),
    );
    h.reconciler.run_pass().await.unwrap();
    h.source.fail_bookings_for("u1");

    let report = h.reconciler.run_pass().await.unwrap();

    assert_eq!(report.failures[0].kind, FailureKind::Source);
    assert_eq!(report.deleted, 0);
    assert_eq!(h.calendar.events_for_booking(CAL, "b1").len(), 1);
    assert_eq!(report.units_synced, 1);
}

#[tokio::test]
async fn unreadable_units_fail_the_pass() {
    let h = harness(vec![loft()], Vec::new(), SyncOptions::default());
    h.source.set_unreadable(true);

    let err = h.reconciler.run_pass().await.unwrap_err();
    assert!(matches!(err, SyncError::Source(_)));
}

#[tokio::test]
async fn dry_run_counts_but_never_writes() {
    let h = harness(
        vec![loft()],
        vec![stay("b1", "u1", 1, 3)],
        SyncOptions::default().with_dry_run(true),
    );
    h.calendar.seed(
        CAL,
        RemoteEvent::from_content("orphan", &expected(&stay("gone", "u1", 1, 2), &loft())),
    );

    let report = h.reconciler.run_pass().await.unwrap();

    assert!(report.dry_run);
    assert_eq!((report.inserted, report.deleted), (1, 1));
    assert_eq!(h.calendar.stats().mutations(), 0);
    assert_eq!(h.source.bookings()[0].remote_event_id, None);
}

#[tokio::test]
async fn deterministic_ids_survive_a_lost_insert_response() {
    let h = harness(
        vec![loft()],
        vec![stay("b1", "u1", 1, 3)],
        SyncOptions::default().with_deterministic_ids(true),
    );
    // The event exists under the derived id but its tag lookup misses, as if
    // the first insert landed after the lookup of a concurrent retry.
    let mut untagged = expected(&stay("b1", "u1", 1, 3), &loft());
    untagged.booking_tag = "someone-else".to_string();
    h.calendar.seed(CAL, RemoteEvent::from_content("bk6231", &untagged));

    let report = h.reconciler.run_pass().await.unwrap();

    assert_eq!(report.updated, 1);
    assert_eq!(report.inserted, 0);
    let events = h.calendar.events_for_booking(CAL, "b1");
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].id, "bk6231");
}

#[tokio::test]
async fn concurrent_calendars_reconcile_independently() {
    let h = harness(
        vec![loft(), cabin()],
        vec![stay("b1", "u1", 1, 3), stay("b2", "u2", 1, 3)],
        SyncOptions::default().with_unit_concurrency(4),
    );
    h.calendar.fail(
        FailureRule::always(Operation::List, ProviderErrorCode::AuthorizationFailed)
            .for_target("b1"),
    );

    let report = h.reconciler.run_pass().await.unwrap();

    assert_eq!(report.inserted, 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(h.calendar.events_for_booking("cal-cabin", "b2").len(), 1);
}

fn studio() -> Unit {
    Unit::new("u3", "Studio").with_calendar(CAL)
}

#[tokio::test]
async fn removed_unit_loses_its_events_on_a_shared_calendar() {
    let h = harness(
        vec![loft(), studio()],
        vec![stay("b1", "u1", 1, 3), stay("b2", "u3", 1, 3)],
        SyncOptions::default(),
    );
    h.reconciler.run_pass().await.unwrap();
    assert_eq!(h.calendar.events(CAL).len(), 2);

    h.source.set_units(vec![loft()]);
    let report = h.reconciler.run_pass().await.unwrap();

    assert_eq!(report.status(), PassStatus::Ok);
    assert_eq!(report.deleted, 1);
    assert!(h.calendar.events_for_booking(CAL, "b2").is_empty());
    assert_eq!(h.calendar.events_for_booking(CAL, "b1").len(), 1);
}

#[tokio::test]
async fn unit_moving_off_a_shared_calendar_leaves_nothing_behind() {
    let h = harness(
        vec![loft(), studio()],
        vec![stay("b1", "u1", 1, 3), stay("b2", "u3", 1, 3)],
        SyncOptions::default(),
    );
    h.reconciler.run_pass().await.unwrap();

    h.source.set_units(vec![loft().with_calendar("cal-new"), studio()]);
    let report = h.reconciler.run_pass().await.unwrap();

    assert_eq!((report.inserted, report.deleted), (1, 1));
    assert!(h.calendar.events_for_booking(CAL, "b1").is_empty());
    assert_eq!(h.calendar.events_for_booking(CAL, "b2").len(), 1);
    assert_eq!(h.calendar.events_for_booking("cal-new", "b1").len(), 1);
}

#[tokio::test]
async fn calendar_no_unit_uses_is_swept_when_listed() {
    let h = harness(
        vec![Unit::new("u1", "Loft").with_calendar("cal-old")],
        vec![stay("b1", "u1", 1, 3)],
        SyncOptions::default().with_sweep_calendars(["cal-old"]),
    );
    h.reconciler.run_pass().await.unwrap();
    assert_eq!(h.calendar.events("cal-old").len(), 1);

    h.source.set_units(vec![Unit::new("u1", "Loft").with_calendar("cal-new")]);
    let report = h.reconciler.run_pass().await.unwrap();

    assert_eq!(report.status(), PassStatus::Ok);
    assert_eq!((report.inserted, report.deleted), (1, 1));
    assert!(h.calendar.events("cal-old").is_empty());
    assert_eq!(h.calendar.events_for_booking("cal-new", "b1").len(), 1);
}

#[tokio::test]
async fn unreadable_unit_holds_back_the_calendar_wide_sweep() {
    let attic = Unit::new("u4", "Attic").with_calendar(CAL);
    let h = harness(
        vec![loft(), studio(), attic.clone()],
        vec![stay("b1", "u1", 1, 3), stay("b2", "u3", 1, 3), stay("b4", "u4", 1, 3)],
        SyncOptions::default(),
    );
    h.reconciler.run_pass().await.unwrap();

    h.source.set_units(vec![loft(), attic]);
    h.source.fail_bookings_for("u4");
    let report = h.reconciler.run_pass().await.unwrap();

    assert_eq!(report.deleted, 0);
    assert_eq!(report.units_synced, 1);
    assert_eq!(h.calendar.events(CAL).len(), 3);
}

#[tokio::test]
async fn events_of_a_unit_without_calendar_are_kept() {
    let barn = Unit::new("u9", "Barn");
    let h = harness(
        vec![loft(), barn.clone()],
        vec![stay("b1", "u1", 1, 3), stay("b9", "u9", 1, 2)],
        SyncOptions::default(),
    );
    let earlier = barn.with_calendar(CAL);
    h.calendar.seed(
        CAL,
        RemoteEvent::from_content("barn-stay", &expected(&stay("b9", "u9", 1, 2), &earlier)),
    );

    let report = h.reconciler.run_pass().await.unwrap();

    assert_eq!(report.deleted, 0);
    assert_eq!(report.failures[0].kind, FailureKind::MissingCalendar);
    assert_eq!(h.calendar.events_for_booking(CAL, "b9").len(), 1);
}

#[tokio::test(start_paused = true)]
async fn orphans_are_deleted_in_bounded_batches() {
    let h = harness(
        vec![loft()],
        Vec::new(),
        SyncOptions::default().with_delete_batch_size(10),
    );
    for n in 0..25 {
        let gone = stay(&format!("gone{n:02}"), "u1", 1, 2);
        h.calendar.seed(
            CAL,
            RemoteEvent::from_content(format!("orphan{n:02}"), &expected(&gone, &loft())),
        );
    }
    h.calendar.set_delete_latency(Duration::from_millis(50));
    h.calendar.fail(
        FailureRule::always(Operation::Delete, ProviderErrorCode::BadRequest)
            .for_target("orphan03"),
    );

    let started = tokio::time::Instant::now();
    let report = h.reconciler.run_pass().await.unwrap();

    // Three batches, one after the other.
    assert_eq!(started.elapsed(), Duration::from_millis(150));
    assert_eq!(h.calendar.peak_concurrent_deletes(), 10);
    assert_eq!(h.calendar.stats().deletes, 25);
    assert_eq!(report.deleted, 24);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.units_synced, 0);
    let left = h.calendar.events(CAL);
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].id, "orphan03");
}

#[tokio::test]
async fn unit_with_a_failed_sweep_is_not_counted_as_synced() {
    let h = harness(
        vec![loft(), cabin()],
        vec![stay("b1", "u1", 1, 3), stay("b2", "u2", 1, 3)],
        SyncOptions::default(),
    );
    h.calendar.seed(
        CAL,
        RemoteEvent::from_content("orphan", &expected(&stay("gone", "u1", 1, 2), &loft())),
    );
    h.calendar.fail(FailureRule::always(Operation::Delete, ProviderErrorCode::BadRequest));

    let report = h.reconciler.run_pass().await.unwrap();

    assert_eq!(report.status(), PassStatus::Partial);
    assert_eq!(report.units_synced, 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].unit_id, "u1");
    assert_eq!(report.failures[0].booking_id, None);
    assert_eq!(report.inserted, 2);
}
