use candid::{CandidType, Deserialize, Principal};
use serde::Serialize;

// =============================================================================
// CONSTANTS
// =============================================================================

pub const CANVAS_WIDTH: u32 = 100;
pub const CANVAS_HEIGHT: u32 = 100;
pub const TOTAL_CELLS: usize = (CANVAS_WIDTH as usize) * (CANVAS_HEIGHT as usize);

// All durations in IC time (nanoseconds)
pub const PIXEL_PLACEMENT_COOLDOWN_NS: u64 = 10_000_000_000; // 10 seconds
pub const COLOR_BOMB_COOLDOWN_NS: u64 = 600_000_000_000; // 10 minutes
pub const TERRITORY_SHIELD_COOLDOWN_NS: u64 = 900_000_000_000; // 15 minutes
pub const SHIELD_DURATION_NS: u64 = 60_000_000_000; // 1 minute

pub const EVENT_DURATION_NS: u64 = 60_000_000_000; // 1 minute
pub const MIN_EVENT_INTERVAL_NS: u64 = 300_000_000_000; // 5 minutes
pub const MAX_EVENT_INTERVAL_NS: u64 = 1_200_000_000_000; // 20 minutes

pub const TERRITORY_WARS_AREA_SIZE: u32 = 10;
pub const COLOR_BOMB_SIZE: u32 = 2;
pub const SHIELD_SIZE: u32 = 5;

// =============================================================================
// TEAMS
// =============================================================================

#[derive(CandidType, Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TeamId {
    Red,
    Blue,
    Green,
    Yellow,
}

impl TeamId {
    pub const ALL: [TeamId; 4] = [TeamId::Red, TeamId::Blue, TeamId::Green, TeamId::Yellow];

    pub fn name(&self) -> &'static str {
        match self {
            TeamId::Red => "Red Team",
            TeamId::Blue => "Blue Team",
            TeamId::Green => "Green Team",
            TeamId::Yellow => "Yellow Team",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            TeamId::Red => "#FF5555",
            TeamId::Blue => "#5555FF",
            TeamId::Green => "#55AA55",
            TeamId::Yellow => "#FFFF55",
        }
    }
}

#[derive(CandidType, Deserialize, Clone, Debug)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    pub color: String,
}

pub fn all_teams() -> Vec<Team> {
    TeamId::ALL
        .iter()
        .map(|id| Team {
            id: *id,
            name: id.name().to_string(),
            color: id.color().to_string(),
        })
        .collect()
}

// =============================================================================
// CANVAS
// =============================================================================

#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct Pixel {
    pub x: u32,
    pub y: u32,
    pub color: String,
    pub team: TeamId,
    pub last_updated: u64,
}

/// Axis-aligned rectangle. The corner may be negative (a shield centered near
/// the grid edge overhangs it); containment against unsigned cell coordinates
/// handles that.
#[derive(CandidType, Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn contains(&self, x: u32, y: u32) -> bool {
        let (x, y) = (x as i64, y as i64);
        let (rx, ry) = (self.x as i64, self.y as i64);
        x >= rx && x < rx + self.width as i64 && y >= ry && y < ry + self.height as i64
    }
}

// =============================================================================
// USERS
// =============================================================================

#[derive(CandidType, Deserialize, Serialize, Clone, Debug)]
pub struct UserProfile {
    pub principal: Principal,
    pub team: Option<TeamId>,
    pub last_pixel_placement: Option<u64>,
    pub pixels_placed: u64,
    // Power-up cooldowns are tracked per user, independent of power-up expiry
    pub color_bomb_ready_at: u64,
    pub shield_ready_at: u64,
    pub achievements: Vec<Achievement>,
}

impl UserProfile {
    pub fn new(principal: Principal) -> Self {
        Self {
            principal,
            team: None,
            last_pixel_placement: None,
            pixels_placed: 0,
            color_bomb_ready_at: 0,
            shield_ready_at: 0,
            achievements: crate::achievements::default_achievements(),
        }
    }
}

/// Per-user snapshot returned to the frontend, with all cooldowns already
/// resolved against the current time.
#[derive(CandidType, Deserialize, Clone, Debug)]
pub struct UserView {
    pub team: Option<TeamId>,
    pub pixels_placed: u64,
    pub cooldown_remaining_ms: u64,
    pub color_bomb_remaining_ms: u64,
    pub shield_remaining_ms: u64,
    pub achievements: Vec<Achievement>,
}

// =============================================================================
// TIMED EVENTS
// =============================================================================

#[derive(CandidType, Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventKind {
    GoldRush,
    PixelStorm,
    TerritoryWars,
}

impl EventKind {
    pub const ALL: [EventKind; 3] =
        [EventKind::GoldRush, EventKind::PixelStorm, EventKind::TerritoryWars];

    pub fn description(&self) -> &'static str {
        match self {
            EventKind::GoldRush => "Gold pixels are worth double territory points!",
            EventKind::PixelStorm => "Cooldown reduced by 50% for all players!",
            EventKind::TerritoryWars => "Selected areas are worth triple territory points!",
        }
    }
}

/// An event is either waiting for its next occurrence or running until its
/// end time. The two field sets are exclusive by construction.
#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq)]
pub enum EventPhase {
    Dormant { next_occurrence: u64 },
    Active { start: u64, end: u64, areas: Vec<Rect> },
}

#[derive(CandidType, Deserialize, Serialize, Clone, Debug)]
pub struct TimedEvent {
    pub kind: EventKind,
    pub phase: EventPhase,
}

/// Flattened event representation for the frontend.
#[derive(CandidType, Deserialize, Clone, Debug)]
pub struct TimedEventView {
    pub kind: EventKind,
    pub active: bool,
    pub start_time: Option<u64>,
    pub end_time: Option<u64>,
    pub next_occurrence: Option<u64>,
    pub description: String,
    pub affected_areas: Vec<Rect>,
}

impl From<&TimedEvent> for TimedEventView {
    fn from(event: &TimedEvent) -> Self {
        let (active, start_time, end_time, next_occurrence, affected_areas) = match &event.phase {
            EventPhase::Dormant { next_occurrence } => {
                (false, None, None, Some(*next_occurrence), Vec::new())
            }
            EventPhase::Active { start, end, areas } => {
                (true, Some(*start), Some(*end), None, areas.clone())
            }
        };
        TimedEventView {
            kind: event.kind,
            active,
            start_time,
            end_time,
            next_occurrence,
            description: event.kind.description().to_string(),
            affected_areas,
        }
    }
}

// =============================================================================
// POWER-UPS
// =============================================================================

#[derive(CandidType, Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum PowerUpKind {
    ColorBomb,
    TerritoryShield,
}

#[derive(CandidType, Deserialize, Serialize, Clone, Debug)]
pub struct PowerUp {
    pub kind: PowerUpKind,
    pub team: TeamId,
    pub owner: Principal,
    pub start: u64,
    pub end: u64,
    pub area: Rect,
}

// =============================================================================
// ACHIEVEMENTS
// =============================================================================

#[derive(CandidType, Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum AchievementKind {
    PixelMilestone,
    TerritoryControl,
    PatternBuilder,
}

#[derive(CandidType, Deserialize, Serialize, Clone, Debug)]
pub struct Achievement {
    pub id: String,
    pub kind: AchievementKind,
    pub title: String,
    pub description: String,
    pub completed: bool,
    pub progress: u32,
    pub max_progress: u32,
    pub reward: Option<String>,
    pub date: Option<u64>,
}

// =============================================================================
// CALL OUTCOMES
// =============================================================================

/// Why a placement or power-up request was turned down. Rejections are
/// expected, frequent outcomes (most clicks land during a cooldown), so they
/// are values rather than errors.
#[derive(CandidType, Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum RejectReason {
    NoTeam,
    CooldownActive { remaining_ms: u64 },
    PowerUpCooldown { remaining_ms: u64 },
    OutOfBounds,
    Shielded,
    InvalidColor,
}

#[derive(CandidType, Deserialize, Clone, Debug)]
pub enum PlaceOutcome {
    Placed { pixel: Pixel, unlocked: Vec<Achievement> },
    Rejected { reason: RejectReason },
}

#[derive(CandidType, Deserialize, Clone, Debug)]
pub enum PowerUpOutcome {
    /// `pixels_written` is the in-bounds subset for a color bomb, 0 for a shield.
    Activated { power_up: PowerUp, pixels_written: u32 },
    Rejected { reason: RejectReason },
}

/// Per-team derived statistics. `score` applies the event weighting on top of
/// the raw count; `percentage` is share of all placed pixels.
#[derive(CandidType, Deserialize, Clone, Debug)]
pub struct TeamStats {
    pub team: TeamId,
    pub pixel_count: u64,
    pub percentage: f64,
    pub score: u64,
}

// =============================================================================
// VALIDATION
// =============================================================================

/// Accepts exactly the "#RRGGBB" form the frontend color picker emits.
pub fn is_valid_hex_color(color: &str) -> bool {
    let bytes = color.as_bytes();
    bytes.len() == 7 && bytes[0] == b'#' && bytes[1..].iter().all(|b| b.is_ascii_hexdigit())
}
