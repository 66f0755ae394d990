use crate::core::constants::{EPIC_VALUE_BONUS_PERCENT, LEGENDARY_VALUE_BONUS_PERCENT};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    Common = 0,
    Uncommon = 1,
    Rare = 2,
    Epic = 3,
    Legendary = 4,
}

impl Rarity {
    /// All tiers, lowest first.
    pub const ALL: [Rarity; 5] = [
        Rarity::Common,
        Rarity::Uncommon,
        Rarity::Rare,
        Rarity::Epic,
        Rarity::Legendary,
    ];

    /// Returns the display name for this rarity tier.
    pub fn name(&self) -> &'static str {
        match self {
            Rarity::Common => "Common",
            Rarity::Uncommon => "Uncommon",
            Rarity::Rare => "Rare",
            Rarity::Epic => "Epic",
            Rarity::Legendary => "Legendary",
        }
    }

    pub fn rank(&self) -> u8 {
        *self as u8
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "common" => Some(Rarity::Common),
            "uncommon" => Some(Rarity::Uncommon),
            "rare" => Some(Rarity::Rare),
            "epic" => Some(Rarity::Epic),
            "legendary" => Some(Rarity::Legendary),
            _ => None,
        }
    }

    pub fn value_multiplier(&self) -> u64 {
        match self {
            Rarity::Common => 1,
            Rarity::Uncommon => 2,
            Rarity::Rare => 5,
            Rarity::Epic => 10,
            Rarity::Legendary => 25,
        }
    }

    /// Extra value on top of the multiplier, in percent.
    pub fn value_bonus_percent(&self) -> u64 {
        match self {
            Rarity::Epic => EPIC_VALUE_BONUS_PERCENT,
            Rarity::Legendary => LEGENDARY_VALUE_BONUS_PERCENT,
            _ => 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: u64,
    pub name: String,
    pub rarity: Rarity,
    pub base_value: u64,
    pub copies: u32,
    #[serde(default)]
    pub locked: bool,
    /// Unix seconds of first acquisition.
    pub acquired_at: i64,
}

impl Card {
    /// Per-copy value: `floor(base × multiplier × bonus)`, computed in
    /// integer percent so epic/legendary bonuses floor exactly.
    pub fn current_value(&self) -> u64 {
        self.base_value * self.rarity.value_multiplier() * self.rarity.value_bonus_percent() / 100
    }

    /// Value of every copy in the stack.
    pub fn stack_value(&self) -> u64 {
        self.current_value() * self.copies as u64
    }
}
