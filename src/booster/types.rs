use crate::cards::Rarity;
use crate::core::constants::{PITY_EPIC_THRESHOLD, PITY_LEGENDARY_THRESHOLD, PITY_RARE_THRESHOLD};
use crate::core::error::GameError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoosterType {
    Basic,
    Premium,
    Special,
}

impl BoosterType {
    pub const ALL: [BoosterType; 3] = [BoosterType::Basic, BoosterType::Premium, BoosterType::Special];

    pub fn name(&self) -> &'static str {
        match self {
            BoosterType::Basic => "basic",
            BoosterType::Premium => "premium",
            BoosterType::Special => "special",
        }
    }

    pub fn parse(s: &str) -> Result<Self, GameError> {
        match s.trim().to_lowercase().as_str() {
            "basic" => Ok(BoosterType::Basic),
            "premium" => Ok(BoosterType::Premium),
            "special" => Ok(BoosterType::Special),
            _ => Err(GameError::InvalidBoosterType(s.to_string())),
        }
    }
}

/// Rarity weights out of 100, in tier order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RarityWeights {
    pub common: f64,
    pub uncommon: f64,
    pub rare: f64,
    pub epic: f64,
    pub legendary: f64,
}

impl RarityWeights {
    pub fn get(&self, rarity: Rarity) -> f64 {
        match rarity {
            Rarity::Common => self.common,
            Rarity::Uncommon => self.uncommon,
            Rarity::Rare => self.rare,
            Rarity::Epic => self.epic,
            Rarity::Legendary => self.legendary,
        }
    }

    pub fn total(&self) -> f64 {
        Rarity::ALL.iter().map(|r| self.get(*r)).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoosterConfig {
    pub card_count: usize,
    pub cost: f64,
    pub weights: RarityWeights,
}

/// Draws since each guarded rarity was last obtained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PityCounters {
    pub rare: u32,
    pub epic: u32,
    pub legendary: u32,
}

impl PityCounters {
    pub fn get(&self, rarity: Rarity) -> Option<u32> {
        match rarity {
            Rarity::Rare => Some(self.rare),
            Rarity::Epic => Some(self.epic),
            Rarity::Legendary => Some(self.legendary),
            _ => None,
        }
    }

    pub fn increment(&mut self) {
        self.rare += 1;
        self.epic += 1;
        self.legendary += 1;
    }

    /// Zero every counter whose rarity ranks at or below `highest`.
    pub fn reset_up_to(&mut self, highest: Rarity) {
        if Rarity::Rare <= highest {
            self.rare = 0;
        }
        if Rarity::Epic <= highest {
            self.epic = 0;
        }
        if Rarity::Legendary <= highest {
            self.legendary = 0;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PityThresholds {
    pub rare: u32,
    pub epic: u32,
    pub legendary: u32,
}

impl Default for PityThresholds {
    fn default() -> Self {
        Self {
            rare: PITY_RARE_THRESHOLD,
            epic: PITY_EPIC_THRESHOLD,
            legendary: PITY_LEGENDARY_THRESHOLD,
        }
    }
}

impl PityThresholds {
    /// Guarded rarities ordered strictest threshold first.
    pub fn by_strictness(&self) -> Vec<(Rarity, u32)> {
        let mut order = vec![
            (Rarity::Legendary, self.legendary),
            (Rarity::Epic, self.epic),
            (Rarity::Rare, self.rare),
        ];
        order.sort_by(|a, b| b.1.cmp(&a.1).then(b.0.cmp(&a.0)));
        order
    }
}

/// A purchased pack. Its card list is filled exactly once, on opening.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booster {
    pub id: String,
    pub booster_type: BoosterType,
    pub purchased_at: i64,
    pub opened: bool,
    /// Inventory ids of the drawn cards, in draw order.
    pub cards: Option<Vec<u64>>,
}

impl Booster {
    pub fn new(booster_type: BoosterType, purchased_at: i64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            booster_type,
            purchased_at,
            opened: false,
            cards: None,
        }
    }

    pub fn set_cards(&mut self, card_ids: Vec<u64>, expected: usize) -> Result<(), GameError> {
        if self.opened || self.cards.is_some() {
            return Err(GameError::CardsAlreadySet(self.id.clone()));
        }
        if card_ids.len() != expected {
            return Err(GameError::WrongCardCount {
                expected,
                actual: card_ids.len(),
            });
        }
        self.cards = Some(card_ids);
        self.opened = true;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryCard {
    pub card_id: u64,
    pub rarity: Rarity,
}

/// Compact record of one opened pack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoosterHistoryEntry {
    pub booster_id: String,
    pub booster_type: BoosterType,
    pub opened_at: i64,
    pub cards: Vec<HistoryCard>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoosterStatistics {
    pub total_opened: u64,
    pub rarity_distribution: BTreeMap<Rarity, u64>,
}

impl Default for BoosterStatistics {
    fn default() -> Self {
        Self {
            total_opened: 0,
            rarity_distribution: Rarity::ALL.iter().map(|r| (*r, 0)).collect(),
        }
    }
}

impl BoosterStatistics {
    pub fn count(&self, rarity: Rarity) -> u64 {
        self.rarity_distribution.get(&rarity).copied().unwrap_or(0)
    }

    pub fn total_cards(&self) -> u64 {
        self.rarity_distribution.values().sum()
    }
}

/// Persisted shape of the `boosters` key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoostersRecord {
    pub boosters: Vec<Booster>,
    pub pity: PityCounters,
    pub history: Vec<BoosterHistoryEntry>,
    pub statistics: BoosterStatistics,
}
