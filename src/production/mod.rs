//! Passive income: generators, the tick scheduler, and offline catch-up.

pub mod logic;
pub mod offline;
pub mod roster;
pub mod types;

pub use logic::ProductionEngine;
pub use offline::{apply_offline, plan_offline, reconcile_offline, record_production, OfflineReport};
pub use roster::{bootstrap_roster, GeneratorDef, STARTER_ROSTER};
pub use types::{upgrade_cost, Generator, GeneratorsRecord, ProductionStatus, UpgradeOutcome};
