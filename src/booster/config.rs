//! Pack price and odds table.

use super::types::{BoosterConfig, BoosterType, RarityWeights};

impl BoosterType {
    pub fn config(&self) -> BoosterConfig {
        match self {
            BoosterType::Basic => BoosterConfig {
                card_count: 5,
                cost: 100.0,
                weights: RarityWeights {
                    common: 70.0,
                    uncommon: 20.0,
                    rare: 8.0,
                    epic: 1.8,
                    legendary: 0.2,
                },
            },
            BoosterType::Premium => BoosterConfig {
                card_count: 10,
                cost: 250.0,
                weights: RarityWeights {
                    common: 60.0,
                    uncommon: 25.0,
                    rare: 10.0,
                    epic: 4.0,
                    legendary: 1.0,
                },
            },
            BoosterType::Special => BoosterConfig {
                card_count: 5,
                cost: 500.0,
                weights: RarityWeights {
                    common: 0.0,
                    uncommon: 50.0,
                    rare: 30.0,
                    epic: 15.0,
                    legendary: 5.0,
                },
            },
        }
    }
}
