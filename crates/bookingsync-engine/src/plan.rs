//! Pure reconciliation decisions.
//!
//! Nothing here talks to a provider: given what exists and what should
//! exist, these functions say what to do. The reconciler enforces the result.

use std::collections::{BTreeMap, HashSet};

use bookingsync_core::EventContent;
use bookingsync_providers::{EventField, RemoteEvent};

/// What to do with one live booking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// No event exists.
    Insert,
    /// The event exists but differs in `changed`.
    Update {
        event_id: String,
        changed: Vec<EventField>,
    },
    /// The event already matches.
    Skip { event_id: String },
}

/// Decides the action for a booking whose desired state is `desired`.
pub fn plan_booking(existing: Option<&RemoteEvent>, desired: &EventContent) -> Action {
    let Some(event) = existing else {
        return Action::Insert;
    };
    let changed = event.diff(desired);
    if changed.is_empty() {
        Action::Skip {
            event_id: event.id.clone(),
        }
    } else {
        Action::Update {
            event_id: event.id.clone(),
            changed,
        }
    }
}

/// Events the sweep removes from one unit's calendar.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SweepPlan<'a> {
    /// Events whose booking is gone or cancelled.
    pub orphans: Vec<&'a RemoteEvent>,
    /// Extra events of live bookings, beside the one kept this pass.
    pub duplicates: Vec<&'a RemoteEvent>,
}

impl SweepPlan<'_> {
    pub fn is_empty(&self) -> bool {
        self.orphans.is_empty() && self.duplicates.is_empty()
    }
}

/// Plans the sweep over the events tagged with one unit.
///
/// `live` holds the ids of every present, non-cancelled booking of the unit,
/// including ones that failed this pass. `kept` returns the event settled on
/// for a booking; a live booking with several events and no settled event is
/// left alone until a pass resolves it.
pub fn plan_sweep<'a, 'k>(
    events: &'a [RemoteEvent],
    live: &HashSet<&str>,
    kept: impl Fn(&str) -> Option<&'k str>,
) -> SweepPlan<'a> {
    let mut by_tag: BTreeMap<&str, Vec<&RemoteEvent>> = BTreeMap::new();
    for event in events {
        if let Some(tag) = event.booking_tag.as_deref()
            && !tag.is_empty()
        {
            by_tag.entry(tag).or_default().push(event);
        }
    }

    let mut plan = SweepPlan::default();
    for (tag, tagged) in by_tag {
        if !live.contains(tag) {
            plan.orphans.extend(tagged);
        } else if tagged.len() > 1
            && let Some(keep) = kept(tag)
            && tagged.iter().any(|e| e.id == keep)
        {
            plan.duplicates.extend(tagged.into_iter().filter(|e| e.id != keep));
        }
    }
    plan
}

/// Picks the tagged events on a calendar that no unit of the calendar owns
/// and whose booking is not live there.
///
/// `units` are the units mapped to the calendar; their own events are left
/// to [`plan_sweep`]. Events of `protected` units (units whose calendar could
/// not be determined) are never picked.
pub fn plan_strays<'a>(
    events: &'a [RemoteEvent],
    units: &HashSet<&str>,
    live: &HashSet<&str>,
    protected: &HashSet<&str>,
) -> Vec<&'a RemoteEvent> {
    events
        .iter()
        .filter(|event| {
            let Some(tag) = event.booking_tag.as_deref().filter(|t| !t.is_empty()) else {
                return false;
            };
            let owner = event.unit_tag.as_deref();
            !owner.is_some_and(|u| units.contains(u) || protected.contains(u)) && !live.contains(tag)
        })
        .collect()
}
