//! Centralized balance and tuning constants for Lunar Shell exploration.
//!
//! These values define the deterministic math for the exploration core.
//! Keeping them together ensures that pacing and rewards can only be adjusted
//! via code changes reviewed in version control, rather than through external
//! JSON assets.

// Resource keys -------------------------------------------------------------
pub const RESOURCE_MOONLIGHT: &str = "moonlight";
pub const RESOURCE_SHADOW_ESSENCE: &str = "shadow_essence";
pub const RESOURCE_LUNAR_CLAW: &str = "lunar_claw";
pub const RESOURCE_STAR_SHARD: &str = "star_shard";

// Storage keys --------------------------------------------------------------
pub const STORAGE_KEY_HISTORY: &str = "exploration.log";
pub const STORAGE_KEY_RUN_STATE: &str = "exploration.state";
pub const STORAGE_KEY_PLAYER: &str = "player.state";

// Aux data keys ---------------------------------------------------------------
pub const AUX_BUILDING_TYPE: &str = "building_type";
pub const AUX_ENEMY_COUNT: &str = "enemy_count";
pub const AUX_SOURCE_ENTRY: &str = "source_entry";
pub const AUX_COMBAT_LOG: &str = "combat_log";

// Session pacing ---------------------------------------------------------------
pub(crate) const DIFFICULTY_STEP_SECS: u64 = 120;
pub(crate) const PACING_WINDOW_SECS: u64 = 300;
pub(crate) const DEFAULT_HISTORY_LIMIT: usize = 100;
pub(crate) const DEFAULT_MIN_EVENT_INTERVAL_SECS: f64 = 3.0;
pub(crate) const DEFAULT_MAX_EVENT_INTERVAL_SECS: f64 = 8.0;
pub(crate) const DEFAULT_CHOICE_THRESHOLD_MIN: u32 = 5;
pub(crate) const DEFAULT_CHOICE_THRESHOLD_MAX: u32 = 8;
pub(crate) const MIN_TICK_DELAY_MS: u64 = 250;
pub(crate) const MAX_CATCH_UP_TICKS: usize = 64;

// Encounter context -------------------------------------------------------------
pub(crate) const ENEMY_TIER_SPAN: u32 = 5;
pub(crate) const ENEMY_COUNT_SPREAD: u32 = 2;
pub(crate) const GROUP_CHANCE_PER_LEVEL_PCT: u32 = 5;
pub(crate) const GROUP_CHANCE_CAP_PCT: u32 = 70;
pub(crate) const SHADOW_SCALING_PER_LEVEL_PCT: i64 = 10;
pub(crate) const UNSCALED_PCT: i64 = 100;

// Combat tuning -------------------------------------------------------------------
pub(crate) const DEFAULT_DAMAGE_VARIANCE: i64 = 5;
pub(crate) const DEFAULT_CRIT_MULTIPLIER: f64 = 1.5;
pub(crate) const DEFAULT_MAX_ROUNDS: u32 = 50;
pub(crate) const MOONLIGHT_PER_KILL_PER_LEVEL: i64 = 10;
pub(crate) const SHADOW_ESSENCE_PER_KILL: i64 = 2;
pub(crate) const SHADOW_ESSENCE_MIN: i64 = 1;
pub(crate) const SHADOW_ESSENCE_MAX: i64 = 10;
pub(crate) const LUNAR_CLAW_MAX: i64 = 3;

// Generator tuning ----------------------------------------------------------------
pub(crate) const EXPLORATION_BASE: i64 = 5;
pub(crate) const EXPLORATION_PER_LEVEL: i64 = 3;
pub(crate) const EXPLORATION_JITTER: i64 = 2;
pub(crate) const DISCOVERY_BASE: i64 = 10;
pub(crate) const DISCOVERY_PER_LEVEL: i64 = 5;
pub(crate) const DISCOVERY_JITTER: i64 = 4;
pub(crate) const ENCOUNTER_BASE: i64 = 15;
pub(crate) const ENCOUNTER_PER_LEVEL: i64 = 10;
pub(crate) const REWARD_BASE: i64 = 20;
pub(crate) const REWARD_PER_LEVEL: i64 = 8;
pub(crate) const REWARD_JITTER: i64 = 5;
pub(crate) const CHALLENGE_BASE: i64 = 12;
pub(crate) const CHALLENGE_PER_LEVEL: i64 = 6;
pub(crate) const BUILDING_CHANCE_BASE_PCT: u32 = 5;
pub(crate) const BUILDING_CHANCE_PER_LEVEL_PCT: u32 = 5;
pub(crate) const BUILDING_CHANCE_CAP_PCT: u32 = 40;
pub(crate) const FLEE_REWARD_PCT: i64 = 30;
pub(crate) const EXPLORE_FURTHER_PCT: i64 = 120;
pub(crate) const PUSH_THROUGH_PCT: i64 = 150;
pub(crate) const TURN_BACK_HEAL: i64 = 5;
pub(crate) const REST_HEAL: i64 = 8;

// Player defaults ------------------------------------------------------------------
pub(crate) const PLAYER_DEFAULT_HP: i64 = 100;
pub(crate) const PLAYER_DEFAULT_DAMAGE: i64 = 12;
pub(crate) const PLAYER_DEFAULT_DEFENSE: i64 = 4;
pub(crate) const PLAYER_DEFAULT_CRIT_RATE: f64 = 0.1;
