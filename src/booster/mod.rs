//! Loot packs: configuration, pity counters, and the opening engine.

pub mod config;
pub mod logic;
pub mod types;

pub use logic::{roll_weighted, LootEngine};
pub use types::{
    Booster, BoosterConfig, BoosterHistoryEntry, BoosterStatistics, BoosterType, BoostersRecord,
    HistoryCard, PityCounters, PityThresholds, RarityWeights,
};
