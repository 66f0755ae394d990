//! Static card pools, one per rarity. Minting picks a name uniformly from the
//! pool and stamps the pool's base value onto the card.

use super::types::Rarity;

pub struct CardTemplate {
    pub rarity: Rarity,
    pub base_value: u64,
    pub names: &'static [&'static str],
}

const COMMON: CardTemplate = CardTemplate {
    rarity: Rarity::Common,
    base_value: 10,
    names: &[
        "Slime",
        "Goblin Scout",
        "Field Mouse",
        "Wooden Shield",
        "Training Dummy",
        "Stray Cat",
    ],
};

const UNCOMMON: CardTemplate = CardTemplate {
    rarity: Rarity::Uncommon,
    base_value: 12,
    names: &[
        "Forest Archer",
        "Iron Golem",
        "Apprentice Mage",
        "Wild Boar",
        "Tavern Bard",
    ],
};

const RARE: CardTemplate = CardTemplate {
    rarity: Rarity::Rare,
    base_value: 15,
    names: &[
        "Storm Falcon",
        "Knight Captain",
        "Crystal Sprite",
        "Shadow Thief",
    ],
};

const EPIC: CardTemplate = CardTemplate {
    rarity: Rarity::Epic,
    base_value: 20,
    names: &["Frost Wyvern", "Archmage Selene", "Ancient Treant"],
};

const LEGENDARY: CardTemplate = CardTemplate {
    rarity: Rarity::Legendary,
    base_value: 30,
    names: &["Celestial Dragon", "Phoenix Empress", "The Void King"],
};

pub fn template_for(rarity: Rarity) -> &'static CardTemplate {
    match rarity {
        Rarity::Common => &COMMON,
        Rarity::Uncommon => &UNCOMMON,
        Rarity::Rare => &RARE,
        Rarity::Epic => &EPIC,
        Rarity::Legendary => &LEGENDARY,
    }
}

/// Number of distinct (rarity, name) pairs that can ever be minted.
pub fn total_unique_cards() -> usize {
    Rarity::ALL
        .iter()
        .map(|r| template_for(*r).names.len())
        .sum()
}
