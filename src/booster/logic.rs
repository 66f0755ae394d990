//! Pack purchase and opening.
//!
//! Each slot of a pack draws a rarity. A pity guarantee forces a guarded
//! rarity once its counter reaches the threshold; otherwise the pack's weight
//! table is rolled. Counters advance on every slot and are reset once per
//! pack by the highest rarity the pack produced.

use super::types::{
    Booster, BoosterConfig, BoosterHistoryEntry, BoosterStatistics, BoosterType, BoostersRecord,
    HistoryCard, PityCounters, PityThresholds, RarityWeights,
};
use crate::cards::{Card, Inventory, Rarity};
use crate::core::constants::{DEFAULT_HISTORY_LIMIT, MAX_BOOSTER_HISTORY, RARITY_WEIGHT_TOTAL};
use crate::core::error::GameError;
use crate::core::events::{EventBus, GameEvent};
use crate::currency::CurrencyLedger;
use rand::Rng;
use std::collections::BTreeMap;

/// Walk the weight table common→legendary and return the first rarity whose
/// cumulative weight reaches `roll`.
pub fn roll_weighted(weights: &RarityWeights, roll: f64) -> Rarity {
    let mut sum = 0.0;
    for rarity in Rarity::ALL {
        sum += weights.get(rarity);
        if sum >= roll {
            return rarity;
        }
    }
    Rarity::Common
}

#[derive(Debug)]
pub struct LootEngine {
    configs: BTreeMap<BoosterType, BoosterConfig>,
    thresholds: PityThresholds,
    pity: PityCounters,
    boosters: Vec<Booster>,
    history: Vec<BoosterHistoryEntry>,
    statistics: BoosterStatistics,
    bus: EventBus,
}

impl LootEngine {
    pub fn new(bus: EventBus) -> Self {
        Self {
            configs: BoosterType::ALL.iter().map(|t| (*t, t.config())).collect(),
            thresholds: PityThresholds::default(),
            pity: PityCounters::default(),
            boosters: Vec::new(),
            history: Vec::new(),
            statistics: BoosterStatistics::default(),
            bus,
        }
    }

    pub fn config(&self, booster_type: BoosterType) -> BoosterConfig {
        self.configs
            .get(&booster_type)
            .copied()
            .unwrap_or_else(|| booster_type.config())
    }

    /// Override the price and odds of one pack type.
    pub fn set_config(&mut self, booster_type: BoosterType, config: BoosterConfig) {
        self.configs.insert(booster_type, config);
    }

    pub fn set_thresholds(&mut self, thresholds: PityThresholds) {
        self.thresholds = thresholds;
    }

    pub fn pity(&self) -> PityCounters {
        self.pity
    }

    pub fn statistics(&self) -> &BoosterStatistics {
        &self.statistics
    }

    pub fn boosters(&self) -> &[Booster] {
        &self.boosters
    }

    pub fn booster(&self, id: &str) -> Option<&Booster> {
        self.boosters.iter().find(|b| b.id == id)
    }

    pub fn unopened(&self) -> impl Iterator<Item = &Booster> {
        self.boosters.iter().filter(|b| !b.opened)
    }

    /// The last `limit` opened packs, oldest first.
    pub fn history(&self, limit: usize) -> &[BoosterHistoryEntry] {
        let start = self.history.len().saturating_sub(limit);
        &self.history[start..]
    }

    pub fn recent_history(&self) -> &[BoosterHistoryEntry] {
        self.history(DEFAULT_HISTORY_LIMIT)
    }

    pub fn purchase(
        &mut self,
        type_name: &str,
        ledger: &mut CurrencyLedger,
        now: i64,
    ) -> Result<Booster, GameError> {
        let booster_type = BoosterType::parse(type_name).map_err(|e| self.report(e))?;
        let config = self.config(booster_type);

        let paid = ledger.can_afford(config.cost) && (config.cost <= 0.0 || ledger.debit(config.cost));
        if !paid {
            return Err(self.report(GameError::InsufficientFunds {
                required: config.cost,
                available: ledger.balance(),
            }));
        }

        let booster = Booster::new(booster_type, now);
        log::debug!("Purchased {} booster {}", booster_type.name(), booster.id);
        self.boosters.push(booster.clone());
        self.bus.emit(GameEvent::BoosterPurchased {
            booster: booster.clone(),
        });
        Ok(booster)
    }

    pub fn open(
        &mut self,
        booster_id: &str,
        inventory: &mut Inventory,
        rng: &mut impl Rng,
        now: i64,
    ) -> Result<Vec<Card>, GameError> {
        let (booster_type, opened) = match self.booster(booster_id) {
            Some(b) => (b.booster_type, b.opened),
            None => return Err(self.report(GameError::UnknownBooster(booster_id.to_string()))),
        };
        if opened {
            return Err(self.report(GameError::AlreadyOpened(booster_id.to_string())));
        }

        let config = self.config(booster_type);
        let mut cards = Vec::with_capacity(config.card_count);
        let mut highest: Option<Rarity> = None;
        for _ in 0..config.card_count {
            let rarity = self.draw_rarity(&config.weights, rng);
            let card = inventory.mint(rarity, rng, now);
            *self.statistics.rarity_distribution.entry(rarity).or_insert(0) += 1;
            highest = highest.max(Some(rarity));
            cards.push(card);
        }

        if let Some(highest) = highest {
            self.pity.reset_up_to(highest);
        }

        let card_ids: Vec<u64> = cards.iter().map(|c| c.id).collect();
        let booster = match self.boosters.iter_mut().find(|b| b.id == booster_id) {
            Some(b) => b,
            None => return Err(GameError::UnknownBooster(booster_id.to_string())),
        };
        booster.set_cards(card_ids, config.card_count)?;
        let booster = booster.clone();

        self.statistics.total_opened += 1;
        self.history.push(BoosterHistoryEntry {
            booster_id: booster.id.clone(),
            booster_type,
            opened_at: now,
            cards: cards
                .iter()
                .map(|c| HistoryCard {
                    card_id: c.id,
                    rarity: c.rarity,
                })
                .collect(),
        });
        if self.history.len() > MAX_BOOSTER_HISTORY {
            let excess = self.history.len() - MAX_BOOSTER_HISTORY;
            self.history.drain(..excess);
        }
        self.prune_opened();

        self.bus.emit(GameEvent::PityUpdated {
            counters: self.pity,
        });
        self.bus.emit(GameEvent::BoosterOpened {
            booster,
            cards: cards.clone(),
        });
        Ok(cards)
    }

    /// One slot draw. Counters only reset after the whole pack, so a breached
    /// guarantee holds for every remaining slot of the pack.
    pub fn draw_rarity(&mut self, weights: &RarityWeights, rng: &mut impl Rng) -> Rarity {
        self.pity.increment();

        for (rarity, threshold) in self.thresholds.by_strictness() {
            let counter = self.pity.get(rarity).unwrap_or(0);
            if counter >= threshold {
                log::debug!("Pity triggered for {} after {} draws", rarity.name(), counter);
                return rarity;
            }
        }

        let roll = rng.gen::<f64>() * RARITY_WEIGHT_TOTAL;
        roll_weighted(weights, roll)
    }

    pub fn save(&self) -> BoostersRecord {
        BoostersRecord {
            boosters: self.boosters.clone(),
            pity: self.pity,
            history: self.history.clone(),
            statistics: self.statistics.clone(),
        }
    }

    pub fn load(&mut self, record: &BoostersRecord) {
        self.boosters = record.boosters.clone();
        self.pity = record.pity;
        self.history = record.history.clone();
        self.statistics = record.statistics.clone();
        for rarity in Rarity::ALL {
            self.statistics.rarity_distribution.entry(rarity).or_insert(0);
        }
    }

    /// Opened packs are kept only as long as their history entry is.
    fn prune_opened(&mut self) {
        let opened = self.boosters.iter().filter(|b| b.opened).count();
        if opened <= MAX_BOOSTER_HISTORY {
            return;
        }
        let mut to_drop = opened - MAX_BOOSTER_HISTORY;
        self.boosters.retain(|b| {
            if b.opened && to_drop > 0 {
                to_drop -= 1;
                false
            } else {
                true
            }
        });
    }

    fn report(&self, error: GameError) -> GameError {
        log::warn!("Booster command failed: {}", error);
        self.bus.emit(GameEvent::BoosterError {
            message: error.to_string(),
        });
        error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::events::{EventKind, EventRecorder};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    struct Fixture {
        loot: LootEngine,
        ledger: CurrencyLedger,
        inventory: Inventory,
        recorder: EventRecorder,
        rng: ChaCha8Rng,
    }

    fn fixture(balance: f64) -> Fixture {
        let bus = EventBus::new();
        let recorder = EventRecorder::attach(&bus);
        let fixture = Fixture {
            loot: LootEngine::new(bus.clone()),
            ledger: CurrencyLedger::with_balance(bus.clone(), balance, 1.0),
            inventory: Inventory::new(bus),
            recorder,
            rng: ChaCha8Rng::seed_from_u64(42),
        };
        fixture.recorder.clear();
        fixture
    }

    fn commons_only() -> RarityWeights {
        RarityWeights {
            common: 100.0,
            uncommon: 0.0,
            rare: 0.0,
            epic: 0.0,
            legendary: 0.0,
        }
    }

    #[test]
    fn test_roll_weighted_boundaries() {
        let weights = BoosterType::Basic.config().weights;
        assert_eq!(roll_weighted(&weights, 0.0), Rarity::Common);
        assert_eq!(roll_weighted(&weights, 70.0), Rarity::Common);
        assert_eq!(roll_weighted(&weights, 70.5), Rarity::Uncommon);
        assert_eq!(roll_weighted(&weights, 95.0), Rarity::Rare);
        assert_eq!(roll_weighted(&weights, 99.0), Rarity::Epic);
        assert_eq!(roll_weighted(&weights, 99.9), Rarity::Legendary);
    }

    #[test]
    fn test_roll_weighted_zero_weight_tier() {
        let weights = BoosterType::Special.config().weights;
        // A zero-weight common still satisfies `sum >= roll` at exactly 0.
        assert_eq!(roll_weighted(&weights, 0.0), Rarity::Common);
        assert_eq!(roll_weighted(&weights, 0.5), Rarity::Uncommon);
        assert_eq!(roll_weighted(&weights, 50.0), Rarity::Uncommon);
        assert_eq!(roll_weighted(&weights, 50.5), Rarity::Rare);
    }

    #[test]
    fn test_roll_weighted_falls_back_to_common() {
        let weights = RarityWeights {
            common: 10.0,
            uncommon: 10.0,
            rare: 10.0,
            epic: 10.0,
            legendary: 59.99,
        };
        assert_eq!(roll_weighted(&weights, 99.995), Rarity::Common);
    }

    #[test]
    fn test_purchase_debits_and_records() {
        let mut f = fixture(150.0);

        let booster = f.loot.purchase("basic", &mut f.ledger, 10).unwrap();

        assert_eq!(f.ledger.balance(), 50.0);
        assert!(!booster.opened);
        assert_eq!(booster.purchased_at, 10);
        assert_eq!(f.loot.unopened().count(), 1);
        assert_eq!(f.recorder.count(EventKind::BoosterPurchased), 1);
    }

    #[test]
    fn test_purchase_invalid_type() {
        let mut f = fixture(1000.0);

        let result = f.loot.purchase("mythic", &mut f.ledger, 0);

        assert_eq!(result, Err(GameError::InvalidBoosterType("mythic".into())));
        assert_eq!(f.ledger.balance(), 1000.0);
        assert_eq!(f.recorder.count(EventKind::BoosterError), 1);
    }

    #[test]
    fn test_purchase_insufficient_funds() {
        let mut f = fixture(5.0);

        let result = f.loot.purchase("basic", &mut f.ledger, 0);

        assert_eq!(
            result,
            Err(GameError::InsufficientFunds {
                required: 100.0,
                available: 5.0
            })
        );
        assert_eq!(f.ledger.balance(), 5.0);
        assert!(f.loot.boosters().is_empty());
        assert!(f.recorder.events().contains(&GameEvent::BoosterError {
            message: "Not enough currency. Required: 100, available: 5".into()
        }));
    }

    #[test]
    fn test_open_fills_pack_and_rejects_reopen() {
        let mut f = fixture(100.0);
        let booster = f.loot.purchase("basic", &mut f.ledger, 0).unwrap();

        let cards = f
            .loot
            .open(&booster.id, &mut f.inventory, &mut f.rng, 5)
            .unwrap();

        assert_eq!(cards.len(), 5);
        assert_eq!(f.inventory.total_copies(), 5);
        let stored = f.loot.booster(&booster.id).unwrap();
        assert!(stored.opened);
        assert_eq!(stored.cards.as_ref().map(Vec::len), Some(5));
        assert_eq!(f.loot.statistics().total_opened, 1);
        assert_eq!(f.loot.statistics().total_cards(), 5);
        assert_eq!(f.loot.history(10).len(), 1);
        assert_eq!(f.recorder.count(EventKind::BoosterOpened), 1);
        assert_eq!(f.recorder.count(EventKind::PityUpdated), 1);

        let again = f.loot.open(&booster.id, &mut f.inventory, &mut f.rng, 6);
        assert_eq!(again, Err(GameError::AlreadyOpened(booster.id.clone())));
        assert_eq!(f.inventory.total_copies(), 5);
    }

    #[test]
    fn test_open_unknown_booster() {
        let mut f = fixture(0.0);
        let result = f.loot.open("missing", &mut f.inventory, &mut f.rng, 0);
        assert_eq!(result, Err(GameError::UnknownBooster("missing".into())));
        assert_eq!(f.recorder.count(EventKind::BoosterError), 1);
    }

    #[test]
    fn test_pity_guarantees_legendary_by_fiftieth_draw() {
        let mut f = fixture(0.0);
        let weights = commons_only();

        let mut legendary_at = None;
        for draw in 1..=50 {
            let rarity = f.loot.draw_rarity(&weights, &mut f.rng);
            f.loot.pity.reset_up_to(rarity);
            if rarity == Rarity::Legendary {
                legendary_at = Some(draw);
                break;
            }
        }
        assert_eq!(legendary_at, Some(50));
    }

    #[test]
    fn test_pity_single_card_packs() {
        let mut f = fixture(0.0);
        f.loot.set_config(
            BoosterType::Basic,
            BoosterConfig {
                card_count: 1,
                cost: 0.0,
                weights: commons_only(),
            },
        );

        let mut rarities = Vec::new();
        for _ in 0..50 {
            f.ledger.credit(1.0);
            let booster = f.loot.purchase("basic", &mut f.ledger, 0).unwrap();
            let cards = f
                .loot
                .open(&booster.id, &mut f.inventory, &mut f.rng, 0)
                .unwrap();
            rarities.push(cards[0].rarity);
        }

        assert_eq!(rarities[9], Rarity::Rare);
        assert_eq!(rarities[19], Rarity::Epic);
        assert_eq!(rarities[49], Rarity::Legendary);
        assert!(rarities.contains(&Rarity::Legendary));
        assert_eq!(f.loot.pity(), PityCounters::default());
    }

    #[test]
    fn test_pity_reset_by_pack_highest() {
        let mut f = fixture(0.0);
        f.loot.pity = PityCounters {
            rare: 3,
            epic: 8,
            legendary: 30,
        };
        let weights = RarityWeights {
            common: 0.0,
            uncommon: 0.0,
            rare: 0.0,
            epic: 100.0,
            legendary: 0.0,
        };
        f.loot.set_config(
            BoosterType::Premium,
            BoosterConfig {
                card_count: 2,
                cost: 0.0,
                weights,
            },
        );
        let booster = f.loot.purchase("premium", &mut f.ledger, 0).unwrap();
        f.loot
            .open(&booster.id, &mut f.inventory, &mut f.rng, 0)
            .unwrap();

        assert_eq!(
            f.loot.pity(),
            PityCounters {
                rare: 0,
                epic: 0,
                legendary: 32
            }
        );
    }

    #[test]
    fn test_breached_pity_forces_every_remaining_slot() {
        let mut f = fixture(0.0);
        f.loot.pity = PityCounters {
            rare: 0,
            epic: 0,
            legendary: 49,
        };
        f.loot.set_config(
            BoosterType::Premium,
            BoosterConfig {
                card_count: 10,
                cost: 0.0,
                weights: commons_only(),
            },
        );
        let booster = f.loot.purchase("premium", &mut f.ledger, 0).unwrap();
        let cards = f
            .loot
            .open(&booster.id, &mut f.inventory, &mut f.rng, 0)
            .unwrap();

        let legendaries = cards
            .iter()
            .filter(|c| c.rarity == Rarity::Legendary)
            .count();
        assert_eq!(legendaries, 10);
        assert_eq!(f.loot.pity(), PityCounters::default());
    }

    #[test]
    fn test_breached_rare_pity_fills_rest_of_pack() {
        let mut f = fixture(0.0);
        f.loot.pity = PityCounters {
            rare: 7,
            epic: 0,
            legendary: 0,
        };
        f.loot.set_config(
            BoosterType::Basic,
            BoosterConfig {
                card_count: 5,
                cost: 0.0,
                weights: commons_only(),
            },
        );
        let booster = f.loot.purchase("basic", &mut f.ledger, 0).unwrap();
        let rarities: Vec<Rarity> = f
            .loot
            .open(&booster.id, &mut f.inventory, &mut f.rng, 0)
            .unwrap()
            .iter()
            .map(|c| c.rarity)
            .collect();

        assert_eq!(
            rarities,
            vec![
                Rarity::Common,
                Rarity::Common,
                Rarity::Rare,
                Rarity::Rare,
                Rarity::Rare
            ]
        );
        assert_eq!(
            f.loot.pity(),
            PityCounters {
                rare: 0,
                epic: 5,
                legendary: 5
            }
        );
    }

    #[test]
    fn test_history_limit() {
        let mut f = fixture(0.0);
        f.loot.set_config(
            BoosterType::Basic,
            BoosterConfig {
                card_count: 1,
                cost: 0.0,
                weights: commons_only(),
            },
        );
        let mut ids = Vec::new();
        for i in 0..15 {
            let booster = f.loot.purchase("basic", &mut f.ledger, i).unwrap();
            f.loot
                .open(&booster.id, &mut f.inventory, &mut f.rng, i)
                .unwrap();
            ids.push(booster.id);
        }

        let recent = f.loot.recent_history();
        assert_eq!(recent.len(), DEFAULT_HISTORY_LIMIT);
        assert_eq!(f.loot.history(100).len(), 15);
        assert_eq!(recent[9].booster_id, ids[14]);
        assert_eq!(recent[0].booster_id, ids[5]);
    }

    #[test]
    fn test_save_load_roundtrip() {
        let mut f = fixture(1000.0);
        let booster = f.loot.purchase("premium", &mut f.ledger, 0).unwrap();
        f.loot
            .open(&booster.id, &mut f.inventory, &mut f.rng, 1)
            .unwrap();
        f.loot.purchase("basic", &mut f.ledger, 2).unwrap();
        let record = f.loot.save();

        let mut restored = LootEngine::new(EventBus::new());
        restored.load(&record);

        assert_eq!(restored.save(), record);
        assert_eq!(restored.unopened().count(), 1);
        assert_eq!(restored.pity(), f.loot.pity());
    }

    #[test]
    fn test_basic_pack_distribution_is_close_to_weights() {
        let mut f = fixture(0.0);
        let weights = BoosterType::Basic.config().weights;
        f.loot.set_thresholds(PityThresholds {
            rare: u32::MAX,
            epic: u32::MAX,
            legendary: u32::MAX,
        });

        let draws = 20_000;
        let mut commons = 0;
        for _ in 0..draws {
            if f.loot.draw_rarity(&weights, &mut f.rng) == Rarity::Common {
                commons += 1;
            }
        }
        let share = commons as f64 / draws as f64;
        assert!((share - 0.70).abs() < 0.02, "common share {}", share);
    }
}
