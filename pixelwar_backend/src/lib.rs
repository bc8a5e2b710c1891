use candid::{CandidType, Deserialize, Principal};
use ic_cdk::management_canister::raw_rand;
use ic_cdk::{init, post_upgrade, pre_upgrade, query, update};
use ic_stable_structures::memory_manager::{MemoryId, MemoryManager, VirtualMemory};
use ic_stable_structures::{DefaultMemoryImpl, StableVec};
use std::cell::RefCell;
use std::time::Duration;

// =============================================================================
// MODULE DECLARATIONS
// =============================================================================

pub mod achievements;
pub mod canvas;
pub mod cooldown;
pub mod events;
pub mod game;
pub mod powerups;
pub mod rng;
pub mod scoring;
pub mod types;

// =============================================================================
// RE-EXPORTS
// =============================================================================

pub use game::GameState;
pub use types::{
    PlaceOutcome, Pixel, PowerUp, PowerUpOutcome, RejectReason, Team, TeamId, TeamStats,
    TimedEventView, UserView,
};

use rng::GameRng;
use types::{CANVAS_HEIGHT, CANVAS_WIDTH};

// =============================================================================
// MEMORY MANAGEMENT
// =============================================================================

type Memory = VirtualMemory<DefaultMemoryImpl>;

const MEMORY_ID_STATE: MemoryId = MemoryId::new(0);

thread_local! {
    static MEMORY_MANAGER: RefCell<MemoryManager<DefaultMemoryImpl>> =
        RefCell::new(MemoryManager::init(DefaultMemoryImpl::default()));

    // Heap state during runtime; serialized to stable memory only across
    // upgrades.
    static STATE: RefCell<GameState> =
        RefCell::new(GameState::new(GameRng::from_seed([0u8; 32])));

    // Candid-encoded snapshot of the game, written in pre_upgrade
    static STABLE_STATE: RefCell<StableVec<u8, Memory>> = RefCell::new(
        StableVec::init(
            MEMORY_MANAGER.with(|m| m.borrow().get(MEMORY_ID_STATE))
        ).unwrap()
    );
}

// =============================================================================
// STATE PERSISTENCE
// =============================================================================

fn save_state() {
    let bytes = STATE.with(|s| candid::encode_one(&*s.borrow()).unwrap());
    STABLE_STATE.with(|stable| {
        let stable = stable.borrow_mut();
        while stable.len() > 0 {
            stable.pop();
        }
        for b in &bytes {
            stable.push(b).unwrap();
        }
    });
}

fn load_state() -> bool {
    STABLE_STATE.with(|stable| {
        let stable = stable.borrow();
        if stable.len() == 0 {
            return false;
        }
        let bytes: Vec<u8> = (0..stable.len()).filter_map(|i| stable.get(i)).collect();
        match candid::decode_one::<GameState>(&bytes) {
            Ok(state) => {
                STATE.with(|s| *s.borrow_mut() = state);
                true
            }
            Err(e) => {
                ic_cdk::println!("Failed to decode stored game state: {}", e);
                false
            }
        }
    })
}

// =============================================================================
// TIMERS
// =============================================================================

/// Arm a one-shot timer for the next event phase boundary. The callback
/// advances everything due, then re-arms for the following boundary, so the
/// scheduler fires exactly at each deadline instead of polling on an
/// interval. The extra nanosecond pushes the wakeup strictly past the
/// boundary the transitions compare against.
fn arm_event_scheduler() {
    let now = ic_cdk::api::time();
    let deadline = STATE.with(|s| events::next_deadline(&s.borrow().events));
    let delay = deadline.saturating_sub(now).saturating_add(1);
    ic_cdk_timers::set_timer(Duration::from_nanos(delay), async {
        let now = ic_cdk::api::time();
        STATE.with(|s| game::tick(&mut s.borrow_mut(), now));
        arm_event_scheduler();
    });
}

// VRF entropy needs an inter-canister call, which init can't make; a zero
// delay timer runs it right after install completes.
fn schedule_rng_reseed() {
    ic_cdk_timers::set_timer(Duration::from_secs(0), async {
        match raw_rand().await {
            Ok(bytes) => {
                STATE.with(|s| s.borrow_mut().rng.reseed(&bytes));
                ic_cdk::println!("Event RNG reseeded from VRF");
            }
            Err(e) => {
                // Keep the time-derived fallback seed
                ic_cdk::println!("raw_rand unavailable, keeping fallback seed: {:?}", e);
            }
        }
    });
}

// =============================================================================
// CANISTER LIFECYCLE
// =============================================================================

#[init]
fn init() {
    let now = ic_cdk::api::time();
    STATE.with(|s| {
        let mut state = s.borrow_mut();
        state.rng = GameRng::from_entropy(now, ic_cdk::api::canister_self().as_slice());
        let GameState { events: timed_events, rng, .. } = &mut *state;
        events::schedule_initial(timed_events, rng, now);
    });
    arm_event_scheduler();
    schedule_rng_reseed();
    ic_cdk::println!(
        "Pixel War Backend Initialized - {}x{} canvas, 4 teams",
        CANVAS_WIDTH,
        CANVAS_HEIGHT
    );
}

#[pre_upgrade]
fn pre_upgrade() {
    save_state();
    ic_cdk::println!("Pixel War pre_upgrade: state saved to stable memory");
}

#[post_upgrade]
fn post_upgrade() {
    if load_state() {
        ic_cdk::println!("Pixel War post_upgrade: state restored");
    } else {
        // First deploy through upgrade path, or incompatible stored layout:
        // start a fresh world rather than trapping the canister.
        let now = ic_cdk::api::time();
        STATE.with(|s| {
            let mut state = s.borrow_mut();
            *state = GameState::new(GameRng::from_entropy(
                now,
                ic_cdk::api::canister_self().as_slice(),
            ));
            let GameState { events: timed_events, rng, .. } = &mut *state;
            events::schedule_initial(timed_events, rng, now);
        });
        ic_cdk::println!("Pixel War post_upgrade: no stored state, initialized fresh canvas");
    }
    // Timers do not survive upgrades; re-arm from the restored schedule
    arm_event_scheduler();
    schedule_rng_reseed();
}

// =============================================================================
// HELPERS
// =============================================================================

fn authenticated_caller() -> Result<Principal, String> {
    let caller = ic_cdk::api::msg_caller();
    if caller == Principal::anonymous() {
        return Err("Anonymous players not allowed. Please log in.".to_string());
    }
    Ok(caller)
}

// =============================================================================
// UPDATE METHODS
// =============================================================================

/// Join one of the four fixed teams, creating the caller's profile on first
/// contact. Joining again switches teams.
#[update]
fn join_team(team: TeamId) -> Result<UserView, String> {
    let caller = authenticated_caller()?;
    let now = ic_cdk::api::time();
    Ok(STATE.with(|s| game::join_team(&mut s.borrow_mut(), caller, team, now)))
}

/// Place a single pixel. Rejections (cooldown, shield, bounds, no team) are
/// ordinary outcomes, not errors.
#[update]
fn place_pixel(x: u32, y: u32, color: String) -> Result<PlaceOutcome, String> {
    let caller = authenticated_caller()?;
    let now = ic_cdk::api::time();
    let outcome = STATE.with(|s| game::place_pixel(&mut s.borrow_mut(), caller, x, y, color, now));
    if let PlaceOutcome::Rejected { reason } = &outcome {
        ic_cdk::println!("place_pixel({}, {}) rejected for {}: {:?}", x, y, caller, reason);
    }
    Ok(outcome)
}

/// Paint a 2x2 block at (x, y) with the caller's color. 10 minute per-user
/// cooldown, independent of the pixel cooldown.
#[update]
fn use_color_bomb(x: u32, y: u32, color: String) -> Result<PowerUpOutcome, String> {
    let caller = authenticated_caller()?;
    let now = ic_cdk::api::time();
    let outcome =
        STATE.with(|s| game::use_color_bomb(&mut s.borrow_mut(), caller, x, y, color, now));
    if let PowerUpOutcome::Rejected { reason } = &outcome {
        ic_cdk::println!("use_color_bomb({}, {}) rejected for {}: {:?}", x, y, caller, reason);
    }
    Ok(outcome)
}

/// Protect the 5x5 area around (x, y) from opposing writes for one minute.
/// 15 minute per-user cooldown.
#[update]
fn use_territory_shield(x: u32, y: u32) -> Result<PowerUpOutcome, String> {
    let caller = authenticated_caller()?;
    let now = ic_cdk::api::time();
    let outcome =
        STATE.with(|s| game::use_territory_shield(&mut s.borrow_mut(), caller, x, y, now));
    if let PowerUpOutcome::Rejected { reason } = &outcome {
        ic_cdk::println!(
            "use_territory_shield({}, {}) rejected for {}: {:?}",
            x,
            y,
            caller,
            reason
        );
    }
    Ok(outcome)
}

// =============================================================================
// QUERY METHODS
// =============================================================================

/// Canvas snapshot sent to the frontend: painted cells only.
#[derive(CandidType, Deserialize, Clone, Debug)]
pub struct CanvasView {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Pixel>,
}

#[query]
fn get_canvas() -> CanvasView {
    STATE.with(|s| CanvasView {
        width: CANVAS_WIDTH,
        height: CANVAS_HEIGHT,
        pixels: s.borrow().canvas.snapshot(),
    })
}

#[query]
fn get_pixel(x: u32, y: u32) -> Option<Pixel> {
    STATE.with(|s| s.borrow().canvas.read(x, y).cloned())
}

#[query]
fn get_teams() -> Vec<Team> {
    types::all_teams()
}

#[query]
fn get_team_stats() -> Vec<TeamStats> {
    let now = ic_cdk::api::time();
    STATE.with(|s| {
        let state = s.borrow();
        scoring::team_stats(&state.canvas, &state.events, now)
    })
}

#[query]
fn get_events() -> Vec<TimedEventView> {
    STATE.with(|s| s.borrow().events.iter().map(TimedEventView::from).collect())
}

/// Power-ups still inside their effect window. Expired records are filtered
/// here even if the pruning tick hasn't caught up yet.
#[query]
fn get_active_power_ups() -> Vec<PowerUp> {
    let now = ic_cdk::api::time();
    STATE.with(|s| powerups::active(&s.borrow().power_ups, now))
}

#[query]
fn get_user() -> Result<UserView, String> {
    let caller = authenticated_caller()?;
    let now = ic_cdk::api::time();
    STATE.with(|s| {
        let state = s.borrow();
        let user = state.users.get(&caller).ok_or("Not a player")?;
        Ok(game::user_view(user, &state.events, now))
    })
}

/// Milliseconds until the caller may place again; 0 for unknown users.
#[query]
fn cooldown_remaining_ms() -> u64 {
    let caller = ic_cdk::api::msg_caller();
    let now = ic_cdk::api::time();
    STATE.with(|s| {
        let state = s.borrow();
        state
            .users
            .get(&caller)
            .map(|user| cooldown::remaining_ns(user, &state.events, now) / 1_000_000)
            .unwrap_or(0)
    })
}

/// Simple greeting
#[query]
fn greet(name: String) -> String {
    format!(
        "Hello, {}! Welcome to the {}x{} Pixel War canvas.",
        name, CANVAS_WIDTH, CANVAS_HEIGHT
    )
}
