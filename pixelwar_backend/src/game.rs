use crate::canvas::{self, Canvas};
use crate::rng::GameRng;
use crate::types::{
    is_valid_hex_color, PlaceOutcome, PowerUp, PowerUpKind, PowerUpOutcome, RejectReason, TeamId,
    TimedEvent, UserProfile, UserView, COLOR_BOMB_SIZE,
};
use crate::{achievements, cooldown, events, powerups, scoring};
use candid::{CandidType, Deserialize, Principal};
use std::collections::HashMap;

const NS_PER_MS: u64 = 1_000_000;

// =============================================================================
// GAME STATE
// =============================================================================

/// The whole game in one place. The canister processes every mutating call
/// sequentially, so handing this struct to the arbitration functions below is
/// the only synchronization the game needs.
#[derive(CandidType, Deserialize, Clone, Debug)]
pub struct GameState {
    pub canvas: Canvas,
    pub users: HashMap<Principal, UserProfile>,
    pub events: Vec<TimedEvent>,
    pub power_ups: Vec<PowerUp>,
    pub rng: GameRng,
}

impl GameState {
    pub fn new(rng: GameRng) -> Self {
        Self {
            canvas: Canvas::new(),
            users: HashMap::new(),
            events: events::default_events(),
            power_ups: Vec::new(),
            rng,
        }
    }
}

// =============================================================================
// ARBITRATION
// =============================================================================

/// Join (or switch to) a team, creating the profile on first contact. The
/// profile is the unit of cooldown and achievement tracking.
pub fn join_team(state: &mut GameState, caller: Principal, team: TeamId, now: u64) -> UserView {
    let user = state.users.entry(caller).or_insert_with(|| UserProfile::new(caller));
    user.team = Some(team);
    user_view(user, &state.events, now)
}

/// The ordinary placement path: cooldown gate, opposing-shield gate, then a
/// last-write-wins cell write. Every rejection leaves the state untouched.
pub fn place_pixel(
    state: &mut GameState,
    caller: Principal,
    x: u32,
    y: u32,
    color: String,
    now: u64,
) -> PlaceOutcome {
    if !is_valid_hex_color(&color) {
        return rejected(RejectReason::InvalidColor);
    }
    if !canvas::in_bounds(x, y) {
        return rejected(RejectReason::OutOfBounds);
    }

    let Some(user) = state.users.get(&caller) else {
        return rejected(RejectReason::NoTeam);
    };
    let Some(team) = user.team else {
        return rejected(RejectReason::NoTeam);
    };

    let remaining = cooldown::remaining_ns(user, &state.events, now);
    if remaining > 0 {
        return rejected(RejectReason::CooldownActive { remaining_ms: remaining / NS_PER_MS });
    }

    if powerups::shield_conflict(&state.power_ups, x, y, team, now) {
        return rejected(RejectReason::Shielded);
    }

    state.canvas.write(x, y, color, team, now);

    let user = state.users.get_mut(&caller).expect("profile checked above");
    cooldown::arm(user, now);

    // Derived reporting after the write so pattern and territory checks see
    // the new pixel.
    let team_percentage = scoring::percentage(&state.canvas, team);
    let pixels_placed = user.pixels_placed;
    let unlocked = achievements::on_pixel_placed(
        &mut user.achievements,
        &state.canvas,
        x,
        y,
        pixels_placed,
        team_percentage,
        now,
    );

    let pixel = state.canvas.read(x, y).expect("just written").clone();
    PlaceOutcome::Placed { pixel, unlocked }
}

/// Color bomb: a 2x2 burst at (x, y), clipped to the canvas. Gated by its own
/// per-user cooldown, not the pixel cooldown, and exempt from shields like
/// every power-up.
pub fn use_color_bomb(
    state: &mut GameState,
    caller: Principal,
    x: u32,
    y: u32,
    color: String,
    now: u64,
) -> PowerUpOutcome {
    if !is_valid_hex_color(&color) {
        return powerup_rejected(RejectReason::InvalidColor);
    }
    if !canvas::in_bounds(x, y) {
        return powerup_rejected(RejectReason::OutOfBounds);
    }
    let team = match usable(state, caller, PowerUpKind::ColorBomb, now) {
        Ok(ok) => ok,
        Err(reason) => return powerup_rejected(reason),
    };

    let mut written = 0u32;
    for dx in 0..COLOR_BOMB_SIZE {
        for dy in 0..COLOR_BOMB_SIZE {
            let (cell_x, cell_y) = (x + dx, y + dy);
            if canvas::in_bounds(cell_x, cell_y) {
                state.canvas.write(cell_x, cell_y, color.clone(), team, now);
                written += 1;
            }
        }
    }

    powerups::prune(&mut state.power_ups, now);
    let record = powerups::bomb_record(caller, team, x, y, now);
    state.power_ups.push(record.clone());
    let user = state.users.get_mut(&caller).expect("profile checked above");
    powerups::start_cooldown(user, PowerUpKind::ColorBomb, now);

    PowerUpOutcome::Activated { power_up: record, pixels_written: written }
}

/// Territory shield: writes nothing, registers a 5x5 protected zone around
/// (x, y) that blocks opposing placements for its duration.
pub fn use_territory_shield(
    state: &mut GameState,
    caller: Principal,
    x: u32,
    y: u32,
    now: u64,
) -> PowerUpOutcome {
    if !canvas::in_bounds(x, y) {
        return powerup_rejected(RejectReason::OutOfBounds);
    }
    let team = match usable(state, caller, PowerUpKind::TerritoryShield, now) {
        Ok(ok) => ok,
        Err(reason) => return powerup_rejected(reason),
    };

    powerups::prune(&mut state.power_ups, now);
    let record = powerups::shield_record(caller, team, x, y, now);
    state.power_ups.push(record.clone());
    let user = state.users.get_mut(&caller).expect("profile checked above");
    powerups::start_cooldown(user, PowerUpKind::TerritoryShield, now);

    PowerUpOutcome::Activated { power_up: record, pixels_written: 0 }
}

/// Scheduler tick: advance event state machines and drop lapsed power-ups.
pub fn tick(state: &mut GameState, now: u64) {
    let GameState { events: timed_events, rng, power_ups, .. } = state;
    events::tick(timed_events, rng, now);
    powerups::prune(power_ups, now);
}

pub fn user_view(user: &UserProfile, timed_events: &[TimedEvent], now: u64) -> UserView {
    UserView {
        team: user.team,
        pixels_placed: user.pixels_placed,
        cooldown_remaining_ms: cooldown::remaining_ns(user, timed_events, now) / NS_PER_MS,
        color_bomb_remaining_ms: powerups::cooldown_remaining_ns(user, PowerUpKind::ColorBomb, now)
            / NS_PER_MS,
        shield_remaining_ms: powerups::cooldown_remaining_ns(
            user,
            PowerUpKind::TerritoryShield,
            now,
        ) / NS_PER_MS,
        achievements: user.achievements.clone(),
    }
}

// =============================================================================
// HELPERS
// =============================================================================

fn rejected(reason: RejectReason) -> PlaceOutcome {
    PlaceOutcome::Rejected { reason }
}

fn powerup_rejected(reason: RejectReason) -> PowerUpOutcome {
    PowerUpOutcome::Rejected { reason }
}

/// Common power-up gate: the caller needs a profile, a team, and an elapsed
/// per-kind cooldown.
fn usable(
    state: &GameState,
    caller: Principal,
    kind: PowerUpKind,
    now: u64,
) -> Result<TeamId, RejectReason> {
    let Some(user) = state.users.get(&caller) else {
        return Err(RejectReason::NoTeam);
    };
    let Some(team) = user.team else {
        return Err(RejectReason::NoTeam);
    };
    let remaining = powerups::cooldown_remaining_ns(user, kind, now);
    if remaining > 0 {
        return Err(RejectReason::PowerUpCooldown { remaining_ms: remaining / NS_PER_MS });
    }
    Ok(team)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EventKind, EventPhase, PIXEL_PLACEMENT_COOLDOWN_NS};

    fn state() -> GameState {
        GameState::new(GameRng::from_seed([0u8; 32]))
    }

    fn alice() -> Principal {
        Principal::from_slice(&[1])
    }

    fn bob() -> Principal {
        Principal::from_slice(&[2])
    }

    fn red(color: &str) -> String {
        color.to_string()
    }

    #[test]
    fn test_placement_requires_team() {
        let mut st = state();
        // No profile at all
        let outcome = place_pixel(&mut st, alice(), 5, 5, red("#FF5555"), 0);
        assert!(matches!(
            outcome,
            PlaceOutcome::Rejected { reason: RejectReason::NoTeam }
        ));
        assert!(st.canvas.read(5, 5).is_none());
    }

    #[test]
    fn test_join_place_cooldown_cycle() {
        // Join red, place, get rejected on the immediate retry, succeed after
        // the cooldown lapses.
        let mut st = state();
        join_team(&mut st, alice(), TeamId::Red, 0);

        let outcome = place_pixel(&mut st, alice(), 5, 5, red("#FF5555"), 1_000);
        match outcome {
            PlaceOutcome::Placed { ref pixel, .. } => {
                assert_eq!(pixel.team, TeamId::Red);
                assert_eq!(pixel.color, "#FF5555");
            }
            ref other => panic!("expected placed, got {:?}", other),
        }

        let retry = place_pixel(&mut st, alice(), 6, 5, red("#FF5555"), 2_000);
        assert!(matches!(
            retry,
            PlaceOutcome::Rejected { reason: RejectReason::CooldownActive { .. } }
        ));

        let later = 1_000 + PIXEL_PLACEMENT_COOLDOWN_NS;
        let outcome = place_pixel(&mut st, alice(), 6, 5, red("#FF5555"), later);
        assert!(matches!(outcome, PlaceOutcome::Placed { .. }));
    }

    #[test]
    fn test_rejection_reports_remaining_ms() {
        let mut st = state();
        join_team(&mut st, alice(), TeamId::Red, 0);
        place_pixel(&mut st, alice(), 0, 0, red("#FF5555"), 0);

        let outcome = place_pixel(&mut st, alice(), 1, 0, red("#FF5555"), 4_000_000_000);
        match outcome {
            PlaceOutcome::Rejected { reason: RejectReason::CooldownActive { remaining_ms } } => {
                assert_eq!(remaining_ms, 6_000);
            }
            other => panic!("expected cooldown rejection, got {:?}", other),
        }
    }

    #[test]
    fn test_out_of_bounds_and_bad_color() {
        let mut st = state();
        join_team(&mut st, alice(), TeamId::Red, 0);
        assert!(matches!(
            place_pixel(&mut st, alice(), 100, 5, red("#FF5555"), 0),
            PlaceOutcome::Rejected { reason: RejectReason::OutOfBounds }
        ));
        assert!(matches!(
            place_pixel(&mut st, alice(), 5, 5, red("red"), 0),
            PlaceOutcome::Rejected { reason: RejectReason::InvalidColor }
        ));
        // Neither attempt armed the cooldown
        assert!(matches!(
            place_pixel(&mut st, alice(), 5, 5, red("#FF5555"), 0),
            PlaceOutcome::Placed { .. }
        ));
    }

    #[test]
    fn test_pixel_storm_halves_wait() {
        let mut st = state();
        join_team(&mut st, alice(), TeamId::Red, 0);
        st.events = vec![TimedEvent {
            kind: EventKind::PixelStorm,
            phase: EventPhase::Active { start: 0, end: u64::MAX, areas: vec![] },
        }];

        place_pixel(&mut st, alice(), 0, 0, red("#FF5555"), 0);
        let half = PIXEL_PLACEMENT_COOLDOWN_NS / 2;
        assert!(matches!(
            place_pixel(&mut st, alice(), 1, 0, red("#FF5555"), half - 1),
            PlaceOutcome::Rejected { .. }
        ));
        assert!(matches!(
            place_pixel(&mut st, alice(), 1, 0, red("#FF5555"), half),
            PlaceOutcome::Placed { .. }
        ));
    }

    #[test]
    fn test_shield_blocks_opponent_not_owner_team() {
        let mut st = state();
        join_team(&mut st, alice(), TeamId::Red, 0);
        join_team(&mut st, bob(), TeamId::Blue, 0);

        let outcome = use_territory_shield(&mut st, alice(), 10, 10, 0);
        assert!(matches!(outcome, PowerUpOutcome::Activated { .. }));

        // Opponent inside the 5x5 zone is rejected regardless of cooldown
        let blocked = place_pixel(&mut st, bob(), 9, 9, red("#5555FF"), 1);
        assert!(matches!(
            blocked,
            PlaceOutcome::Rejected { reason: RejectReason::Shielded }
        ));
        assert!(st.canvas.read(9, 9).is_none());

        // A red teammate writes through the red shield
        let carol = Principal::from_slice(&[3]);
        join_team(&mut st, carol, TeamId::Red, 0);
        assert!(matches!(
            place_pixel(&mut st, carol, 9, 9, red("#FF5555"), 1),
            PlaceOutcome::Placed { .. }
        ));

        // Outside the zone the opponent is fine
        assert!(matches!(
            place_pixel(&mut st, bob(), 20, 20, red("#5555FF"), 1),
            PlaceOutcome::Placed { .. }
        ));
    }

    #[test]
    fn test_color_bomb_writes_2x2_and_arms_cooldown() {
        let mut st = state();
        join_team(&mut st, alice(), TeamId::Red, 0);

        let outcome = use_color_bomb(&mut st, alice(), 10, 10, red("#FF5555"), 100);
        match outcome {
            PowerUpOutcome::Activated { pixels_written, .. } => assert_eq!(pixels_written, 4),
            other => panic!("expected activation, got {:?}", other),
        }
        for (x, y) in [(10, 10), (11, 10), (10, 11), (11, 11)] {
            assert_eq!(st.canvas.read(x, y).unwrap().team, TeamId::Red);
        }

        // Immediate re-use is on cooldown
        assert!(matches!(
            use_color_bomb(&mut st, alice(), 20, 20, red("#FF5555"), 101),
            PowerUpOutcome::Rejected { reason: RejectReason::PowerUpCooldown { .. } }
        ));
    }

    #[test]
    fn test_color_bomb_clips_at_canvas_edge() {
        let mut st = state();
        join_team(&mut st, alice(), TeamId::Red, 0);

        let outcome = use_color_bomb(&mut st, alice(), 99, 99, red("#FF5555"), 0);
        match outcome {
            PowerUpOutcome::Activated { pixels_written, .. } => assert_eq!(pixels_written, 1),
            other => panic!("expected activation, got {:?}", other),
        }
        assert!(st.canvas.read(99, 99).is_some());
    }

    #[test]
    fn test_color_bomb_does_not_touch_pixel_cooldown() {
        let mut st = state();
        join_team(&mut st, alice(), TeamId::Red, 0);
        use_color_bomb(&mut st, alice(), 10, 10, red("#FF5555"), 0);
        // Ordinary placement is still available right away
        assert!(matches!(
            place_pixel(&mut st, alice(), 0, 0, red("#FF5555"), 1),
            PlaceOutcome::Placed { .. }
        ));
    }

    #[test]
    fn test_power_ups_require_team() {
        let mut st = state();
        assert!(matches!(
            use_color_bomb(&mut st, alice(), 0, 0, red("#FF5555"), 0),
            PowerUpOutcome::Rejected { reason: RejectReason::NoTeam }
        ));
        assert!(matches!(
            use_territory_shield(&mut st, alice(), 0, 0, 0),
            PowerUpOutcome::Rejected { reason: RejectReason::NoTeam }
        ));
    }

    #[test]
    fn test_tick_prunes_lapsed_power_ups() {
        let mut st = state();
        join_team(&mut st, alice(), TeamId::Red, 0);
        use_territory_shield(&mut st, alice(), 10, 10, 0);
        use_color_bomb(&mut st, alice(), 0, 0, red("#FF5555"), 0);
        assert_eq!(st.power_ups.len(), 2);

        // The instant bomb lapses immediately; the shield survives its minute
        tick(&mut st, 1);
        assert_eq!(st.power_ups.len(), 1);
        tick(&mut st, crate::types::SHIELD_DURATION_NS + 1);
        assert!(st.power_ups.is_empty());
    }

    #[test]
    fn test_user_view_resolves_cooldowns() {
        let mut st = state();
        join_team(&mut st, alice(), TeamId::Red, 0);
        place_pixel(&mut st, alice(), 0, 0, red("#FF5555"), 0);
        use_color_bomb(&mut st, alice(), 1, 1, red("#FF5555"), 0);

        let user = st.users.get(&alice()).unwrap();
        let view = user_view(user, &st.events, 1_000_000_000);
        assert_eq!(view.cooldown_remaining_ms, 9_000);
        assert_eq!(view.color_bomb_remaining_ms, 599_000);
        assert_eq!(view.shield_remaining_ms, 0);
        assert_eq!(view.pixels_placed, 1);
    }
}
