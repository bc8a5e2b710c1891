use crate::events;
use crate::types::{EventKind, TimedEvent, UserProfile, PIXEL_PLACEMENT_COOLDOWN_NS};

// Placement cooldown arithmetic. Everything is computed from the user's last
// placement timestamp and the event schedule; nothing here is consumed or
// reset by reads.

/// The cooldown currently in force: the 10s base, halved while a pixel storm
/// is running.
pub fn effective_cooldown_ns(events: &[TimedEvent], now: u64) -> u64 {
    if events::is_active(events, EventKind::PixelStorm, now) {
        PIXEL_PLACEMENT_COOLDOWN_NS / 2
    } else {
        PIXEL_PLACEMENT_COOLDOWN_NS
    }
}

/// Time left before the user may place again. Zero for a user who has never
/// placed.
pub fn remaining_ns(user: &UserProfile, events: &[TimedEvent], now: u64) -> u64 {
    let Some(last) = user.last_pixel_placement else {
        return 0;
    };
    let elapsed = now.saturating_sub(last);
    effective_cooldown_ns(events, now).saturating_sub(elapsed)
}

/// A user may place iff they belong to a team and their cooldown has lapsed.
pub fn can_place(user: &UserProfile, events: &[TimedEvent], now: u64) -> bool {
    user.team.is_some() && remaining_ns(user, events, now) == 0
}

/// Record an accepted placement: restart the cooldown and bump the counter.
pub fn arm(user: &mut UserProfile, now: u64) {
    user.last_pixel_placement = Some(now);
    user.pixels_placed += 1;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EventPhase, TeamId};
    use candid::Principal;

    fn user_on_team() -> UserProfile {
        let mut user = UserProfile::new(Principal::from_slice(&[1]));
        user.team = Some(TeamId::Red);
        user
    }

    fn storm(end: u64) -> Vec<TimedEvent> {
        vec![TimedEvent {
            kind: EventKind::PixelStorm,
            phase: EventPhase::Active { start: 0, end, areas: vec![] },
        }]
    }

    #[test]
    fn test_fresh_user_has_no_cooldown() {
        let user = user_on_team();
        assert_eq!(remaining_ns(&user, &[], 0), 0);
        assert!(can_place(&user, &[], 0));
    }

    #[test]
    fn test_no_team_blocks_placement() {
        let user = UserProfile::new(Principal::from_slice(&[2]));
        assert!(!can_place(&user, &[], 0));
        // remaining is still zero; the team check is separate
        assert_eq!(remaining_ns(&user, &[], 0), 0);
    }

    #[test]
    fn test_cooldown_counts_down() {
        let mut user = user_on_team();
        arm(&mut user, 1_000);
        assert_eq!(
            remaining_ns(&user, &[], 1_000),
            PIXEL_PLACEMENT_COOLDOWN_NS
        );
        assert_eq!(
            remaining_ns(&user, &[], 1_000 + PIXEL_PLACEMENT_COOLDOWN_NS / 2),
            PIXEL_PLACEMENT_COOLDOWN_NS / 2
        );
        assert_eq!(
            remaining_ns(&user, &[], 1_000 + PIXEL_PLACEMENT_COOLDOWN_NS),
            0
        );
        assert!(can_place(&user, &[], 1_000 + PIXEL_PLACEMENT_COOLDOWN_NS));
    }

    #[test]
    fn test_pixel_storm_halves_cooldown() {
        let events = storm(u64::MAX);
        assert_eq!(
            effective_cooldown_ns(&events, 0),
            PIXEL_PLACEMENT_COOLDOWN_NS / 2
        );

        let mut user = user_on_team();
        arm(&mut user, 0);
        assert!(!can_place(&user, &events, PIXEL_PLACEMENT_COOLDOWN_NS / 2 - 1));
        assert!(can_place(&user, &events, PIXEL_PLACEMENT_COOLDOWN_NS / 2));
    }

    #[test]
    fn test_lapsed_storm_restores_base_cooldown() {
        let events = storm(100);
        assert_eq!(effective_cooldown_ns(&events, 101), PIXEL_PLACEMENT_COOLDOWN_NS);
    }

    #[test]
    fn test_arm_updates_counters() {
        let mut user = user_on_team();
        arm(&mut user, 500);
        arm(&mut user, 600);
        assert_eq!(user.pixels_placed, 2);
        assert_eq!(user.last_pixel_placement, Some(600));
    }
}
