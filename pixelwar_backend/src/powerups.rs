use crate::types::{
    PowerUp, PowerUpKind, Rect, TeamId, UserProfile, COLOR_BOMB_COOLDOWN_NS, COLOR_BOMB_SIZE,
    SHIELD_DURATION_NS, SHIELD_SIZE, TERRITORY_SHIELD_COOLDOWN_NS,
};

// Power-up bookkeeping. The active list holds every power-up whose window has
// not lapsed; per-user re-use cooldowns live on the profile and outlast the
// records here.

/// Time left on the user's cooldown for the given power-up kind.
pub fn cooldown_remaining_ns(user: &UserProfile, kind: PowerUpKind, now: u64) -> u64 {
    let ready_at = match kind {
        PowerUpKind::ColorBomb => user.color_bomb_ready_at,
        PowerUpKind::TerritoryShield => user.shield_ready_at,
    };
    ready_at.saturating_sub(now)
}

/// Start the per-user cooldown after a successful use.
pub fn start_cooldown(user: &mut UserProfile, kind: PowerUpKind, now: u64) {
    match kind {
        PowerUpKind::ColorBomb => user.color_bomb_ready_at = now + COLOR_BOMB_COOLDOWN_NS,
        PowerUpKind::TerritoryShield => {
            user.shield_ready_at = now + TERRITORY_SHIELD_COOLDOWN_NS
        }
    }
}

/// The 2x2 footprint of a color bomb anchored at (x, y).
pub fn bomb_area(x: u32, y: u32) -> Rect {
    Rect { x: x as i32, y: y as i32, width: COLOR_BOMB_SIZE, height: COLOR_BOMB_SIZE }
}

/// The 5x5 shield footprint centered on (x, y). May overhang the canvas.
pub fn shield_area(x: u32, y: u32) -> Rect {
    let half = (SHIELD_SIZE / 2) as i32;
    Rect { x: x as i32 - half, y: y as i32 - half, width: SHIELD_SIZE, height: SHIELD_SIZE }
}

/// An instant-effect record: the bomb has already written its pixels by the
/// time this is stored, so start == end.
pub fn bomb_record(owner: candid::Principal, team: TeamId, x: u32, y: u32, now: u64) -> PowerUp {
    PowerUp {
        kind: PowerUpKind::ColorBomb,
        team,
        owner,
        start: now,
        end: now,
        area: bomb_area(x, y),
    }
}

pub fn shield_record(owner: candid::Principal, team: TeamId, x: u32, y: u32, now: u64) -> PowerUp {
    PowerUp {
        kind: PowerUpKind::TerritoryShield,
        team,
        owner,
        start: now,
        end: now + SHIELD_DURATION_NS,
        area: shield_area(x, y),
    }
}

fn is_live(power_up: &PowerUp, now: u64) -> bool {
    now <= power_up.end
}

/// Whether a placement at (x, y) by `team` hits an opposing live shield.
/// Same-team writes pass through.
pub fn shield_conflict(power_ups: &[PowerUp], x: u32, y: u32, team: TeamId, now: u64) -> bool {
    power_ups.iter().any(|power_up| {
        power_up.kind == PowerUpKind::TerritoryShield
            && is_live(power_up, now)
            && power_up.team != team
            && power_up.area.contains(x, y)
    })
}

/// Everything still inside its effect window.
pub fn active(power_ups: &[PowerUp], now: u64) -> Vec<PowerUp> {
    power_ups.iter().filter(|p| is_live(p, now)).cloned().collect()
}

/// Drop lapsed records. Cooldowns are unaffected; they live on the profiles.
pub fn prune(power_ups: &mut Vec<PowerUp>, now: u64) {
    power_ups.retain(|p| is_live(p, now));
}
