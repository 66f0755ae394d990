//! Every subsystem of a running game, wired to one event bus.

use super::config::GameConfig;
use super::events::EventBus;
use crate::achievements::{AchievementId, AchievementSnapshot, Achievements};
use crate::booster::LootEngine;
use crate::cards::Inventory;
use crate::collection::CollectionView;
use crate::currency::CurrencyLedger;
use crate::production::ProductionEngine;

/// Main game state containing all player progress
#[derive(Debug)]
pub struct GameState {
    pub bus: EventBus,
    pub ledger: CurrencyLedger,
    pub production: ProductionEngine,
    pub inventory: Inventory,
    pub collection: CollectionView,
    pub loot: LootEngine,
    pub achievements: Achievements,
}

impl GameState {
    pub fn new(config: &GameConfig) -> Self {
        Self::with_bus(EventBus::new(), config)
    }

    pub fn with_bus(bus: EventBus, config: &GameConfig) -> Self {
        Self {
            ledger: CurrencyLedger::with_balance(
                bus.clone(),
                config.starting_balance,
                config.base_click_value,
            ),
            production: ProductionEngine::with_tick_interval(bus.clone(), config.tick_interval()),
            inventory: Inventory::new(bus.clone()),
            collection: CollectionView::new(bus.clone()),
            loot: LootEngine::new(bus.clone()),
            achievements: Achievements::new(bus.clone()),
            bus,
        }
    }

    pub fn achievement_snapshot(&self) -> AchievementSnapshot {
        AchievementSnapshot {
            balance: self.ledger.balance(),
            generator_levels: self.production.generators().iter().map(|g| g.level).collect(),
            unique_cards: self.inventory.unique_count(),
        }
    }

    pub fn check_achievements(&mut self) -> Vec<AchievementId> {
        let snapshot = self.achievement_snapshot();
        self.achievements.check(&snapshot, &mut self.ledger)
    }

    /// Republish the collection projection after an inventory change.
    pub fn refresh_collection(&mut self) {
        self.collection.refresh(&self.inventory);
    }
}
