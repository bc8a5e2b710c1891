use crate::canvas::Canvas;
use crate::events;
use crate::types::{Pixel, TeamId, TeamStats, TimedEvent};

// Derived team statistics. Stateless: recomputed from the canvas and the
// event schedule on every query, nothing cached.

/// Event weighting for one pixel: x2 if it was placed during the live
/// gold-rush window, x3 if it sits in a live territory-wars zone. Both at
/// once multiply.
fn pixel_weight(pixel: &Pixel, events: &[TimedEvent], now: u64) -> u64 {
    let mut weight = 1;
    if let Some((start, _)) = events::gold_rush_window(events, now) {
        if pixel.last_updated >= start {
            weight *= 2;
        }
    }
    if events::active_battle_areas(events, now)
        .iter()
        .any(|area| area.contains(pixel.x, pixel.y))
    {
        weight *= 3;
    }
    weight
}

/// Share of all placed pixels held by `team`, in percent. Zero on an empty
/// canvas.
pub fn percentage(canvas: &Canvas, team: TeamId) -> f64 {
    let total = canvas.placed_count();
    if total == 0 {
        return 0.0;
    }
    canvas.team_count(team) as f64 / total as f64 * 100.0
}

pub fn team_stats(canvas: &Canvas, events: &[TimedEvent], now: u64) -> Vec<TeamStats> {
    let total = canvas.placed_count();
    TeamId::ALL
        .iter()
        .map(|team| {
            let pixel_count = canvas.team_count(*team);
            let percentage = if total == 0 {
                0.0
            } else {
                pixel_count as f64 / total as f64 * 100.0
            };
            let score = canvas
                .pixels()
                .filter(|pixel| pixel.team == *team)
                .map(|pixel| pixel_weight(pixel, events, now))
                .sum();
            TeamStats { team: *team, pixel_count, percentage, score }
        })
        .collect()
}
