// Tick and timing
pub const TICK_INTERVAL_SECONDS: i64 = 1;
pub const MAX_TICKS_PER_ADVANCE: u32 = 60;
pub const AUTOSAVE_INTERVAL_SECONDS: i64 = 30;
pub const MIN_AUTOSAVE_INTERVAL_SECONDS: i64 = 3;
pub const MAX_AUTOSAVE_INTERVAL_SECONDS: i64 = 60;
pub const MIN_SAVE_INTERVAL_SECONDS: i64 = 3;

// Offline progression
pub const MAX_OFFLINE_SECONDS: i64 = 24 * 60 * 60;

// Currency
pub const STARTING_BALANCE: f64 = 0.0;
pub const BASE_CLICK_VALUE: f64 = 1.0;
pub const BASE_MULTIPLIER: f64 = 1.0;

// Generators
pub const UPGRADE_COST_GROWTH: f64 = 1.15;
/// Absorbs representation error in `base * 1.15^n` before flooring
/// (100 * 1.15 evaluates to 114.99999999999999).
pub const UPGRADE_COST_EPSILON: f64 = 1e-6;

// Pity thresholds (draws without the rarity before it is guaranteed)
pub const PITY_RARE_THRESHOLD: u32 = 10;
pub const PITY_EPIC_THRESHOLD: u32 = 20;
pub const PITY_LEGENDARY_THRESHOLD: u32 = 50;

// Rarity weight tables are expressed out of this total
pub const RARITY_WEIGHT_TOTAL: f64 = 100.0;

// Booster history
pub const MAX_BOOSTER_HISTORY: usize = 100;
pub const DEFAULT_HISTORY_LIMIT: usize = 10;

// Card value bonuses, in percent, applied after the rarity multiplier
pub const EPIC_VALUE_BONUS_PERCENT: u64 = 120;
pub const LEGENDARY_VALUE_BONUS_PERCENT: u64 = 150;

// Save format
pub const SAVE_SCHEMA_VERSION: u32 = 1;
pub const RECORD_MAGIC: u64 = 0x4344_4944_4C45_0001; // "CDIDLE" v1
