use crate::rng::GameRng;
use crate::types::{
    EventKind, EventPhase, Rect, TimedEvent, CANVAS_HEIGHT, CANVAS_WIDTH, EVENT_DURATION_NS,
    MAX_EVENT_INTERVAL_NS, MIN_EVENT_INTERVAL_NS, TERRITORY_WARS_AREA_SIZE,
};

// Each event kind cycles Dormant -> Active -> Dormant forever, independently
// of the others. All transitions are pure time-of-check computations so a
// late or repeated tick observes the same state it would have at the exact
// deadline.

pub fn default_events() -> Vec<TimedEvent> {
    EventKind::ALL
        .iter()
        .map(|kind| TimedEvent {
            kind: *kind,
            phase: EventPhase::Dormant { next_occurrence: 0 },
        })
        .collect()
}

fn next_interval(rng: &mut GameRng) -> u64 {
    rng.range(MIN_EVENT_INTERVAL_NS, MAX_EVENT_INTERVAL_NS)
}

/// Give every event its first occurrence. Called once at install; upgraded
/// canisters keep their restored schedule.
pub fn schedule_initial(events: &mut [TimedEvent], rng: &mut GameRng, now: u64) {
    for event in events.iter_mut() {
        event.phase = EventPhase::Dormant { next_occurrence: now + next_interval(rng) };
    }
}

/// 1-3 random 10x10 zones, corners sampled so each zone fits on the canvas.
fn random_battle_areas(rng: &mut GameRng) -> Vec<Rect> {
    let count = 1 + rng.below(3);
    (0..count)
        .map(|_| Rect {
            x: rng.below((CANVAS_WIDTH - TERRITORY_WARS_AREA_SIZE) as u64) as i32,
            y: rng.below((CANVAS_HEIGHT - TERRITORY_WARS_AREA_SIZE) as u64) as i32,
            width: TERRITORY_WARS_AREA_SIZE,
            height: TERRITORY_WARS_AREA_SIZE,
        })
        .collect()
}

/// Advance every event state machine to `now`.
pub fn tick(events: &mut [TimedEvent], rng: &mut GameRng, now: u64) {
    for event in events.iter_mut() {
        match &event.phase {
            EventPhase::Active { end, .. } if now > *end => {
                event.phase = EventPhase::Dormant { next_occurrence: now + next_interval(rng) };
            }
            EventPhase::Dormant { next_occurrence } if now > *next_occurrence => {
                let areas = if event.kind == EventKind::TerritoryWars {
                    random_battle_areas(rng)
                } else {
                    Vec::new()
                };
                event.phase =
                    EventPhase::Active { start: now, end: now + EVENT_DURATION_NS, areas };
            }
            _ => {}
        }
    }
}

/// The earliest upcoming phase boundary across all events. The canister arms
/// one timer for exactly this instant instead of polling on an interval.
pub fn next_deadline(events: &[TimedEvent]) -> u64 {
    events
        .iter()
        .map(|event| match &event.phase {
            EventPhase::Dormant { next_occurrence } => *next_occurrence,
            EventPhase::Active { end, .. } => *end,
        })
        .min()
        .unwrap_or(u64::MAX)
}

/// Whether an event of the given kind is live at `now`. Checked against the
/// end timestamp, not just the phase, so readers between ticks agree with
/// the schedule.
pub fn is_active(events: &[TimedEvent], kind: EventKind, now: u64) -> bool {
    events.iter().any(|event| {
        event.kind == kind
            && matches!(&event.phase, EventPhase::Active { end, .. } if now <= *end)
    })
}

/// The live territory-wars zones, empty when the event is dormant.
pub fn active_battle_areas(events: &[TimedEvent], now: u64) -> Vec<Rect> {
    events
        .iter()
        .filter(|event| event.kind == EventKind::TerritoryWars)
        .filter_map(|event| match &event.phase {
            EventPhase::Active { end, areas, .. } if now <= *end => Some(areas.clone()),
            _ => None,
        })
        .flatten()
        .collect()
}

/// The live gold-rush window, if any, as (start, end).
pub fn gold_rush_window(events: &[TimedEvent], now: u64) -> Option<(u64, u64)> {
    events
        .iter()
        .filter(|event| event.kind == EventKind::GoldRush)
        .find_map(|event| match &event.phase {
            EventPhase::Active { start, end, .. } if now <= *end => Some((*start, *end)),
            _ => None,
        })
}
