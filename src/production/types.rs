use crate::core::constants::{UPGRADE_COST_EPSILON, UPGRADE_COST_GROWTH};
use serde::{Deserialize, Serialize};

/// A levelable producer of passive income.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Generator {
    pub id: String,
    pub level: u32,
    pub base_production: f64,
    pub base_cost: f64,
    /// Always `base_production × level`.
    pub current_production: f64,
    #[serde(default)]
    pub last_purchase_cost: f64,
    #[serde(default)]
    pub description: String,
}

impl Generator {
    pub fn new(id: &str, base_production: f64, base_cost: f64, description: &str) -> Self {
        Self {
            id: id.to_string(),
            level: 0,
            base_production,
            base_cost,
            current_production: 0.0,
            last_purchase_cost: 0.0,
            description: description.to_string(),
        }
    }

    /// Price of the next level.
    pub fn upgrade_cost(&self) -> f64 {
        upgrade_cost(self.base_cost, self.level)
    }

    pub fn recompute_production(&mut self) {
        self.current_production = self.base_production * self.level as f64;
    }
}

/// `floor(base × 1.15^level)`.
pub fn upgrade_cost(base_cost: f64, level: u32) -> f64 {
    (base_cost * UPGRADE_COST_GROWTH.powi(level as i32) + UPGRADE_COST_EPSILON).floor()
}

/// Result of a successful upgrade purchase.
#[derive(Debug, Clone, PartialEq)]
pub struct UpgradeOutcome {
    pub id: String,
    pub level: u32,
    pub cost: f64,
    pub production: f64,
    pub next_cost: f64,
}

/// Snapshot of the scheduler for status displays.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProductionStatus {
    pub total_production: f64,
    pub running: bool,
    pub last_tick: i64,
}

/// Persisted shape of the `generators` key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorsRecord {
    pub generators: Vec<Generator>,
    pub last_flush_timestamp: i64,
}
