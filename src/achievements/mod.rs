//! Achievement system module.
//!
//! Milestones over the balance, the generator roster and the card
//! collection. Rewards are paid in currency.

pub mod data;
pub mod types;

pub use data::{get_achievement_def, ALL_ACHIEVEMENTS};
pub use types::{
    AchievementDef, AchievementId, AchievementSnapshot, Achievements, AchievementsRecord,
    ProgressLevel, ProgressiveState, Requirement,
};
