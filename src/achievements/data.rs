//! Static achievement definitions.

use super::types::{AchievementDef, AchievementId, ProgressLevel, Requirement};

const COLLECTOR_LEVELS: &[ProgressLevel] = &[
    ProgressLevel {
        requirement: 10,
        reward: 100.0,
    },
    ProgressLevel {
        requirement: 15,
        reward: 500.0,
    },
    // Every card in every pool
    ProgressLevel {
        requirement: 21,
        reward: 2000.0,
    },
];

/// All achievement definitions in display order.
pub const ALL_ACHIEVEMENTS: &[AchievementDef] = &[
    AchievementDef {
        id: AchievementId::FirstCoins,
        name: "First Steps",
        description: "Earn your first 100 coins",
        requirement: Requirement::Balance(100.0),
        reward: 10.0,
    },
    AchievementDef {
        id: AchievementId::Millionaire,
        name: "Millionaire",
        description: "Hold 1,000,000 coins",
        requirement: Requirement::Balance(1_000_000.0),
        reward: 1000.0,
    },
    AchievementDef {
        id: AchievementId::FirstGenerator,
        name: "Automation",
        description: "Buy your first generator level",
        requirement: Requirement::AnyGeneratorOwned,
        reward: 50.0,
    },
    AchievementDef {
        id: AchievementId::GeneratorMaster,
        name: "Generator Master",
        description: "Raise every generator to level 10",
        requirement: Requirement::AllGeneratorsAtLevel(10),
        reward: 5000.0,
    },
    AchievementDef {
        id: AchievementId::Collector,
        name: "Collector",
        description: "Collect unique cards",
        requirement: Requirement::UniqueCards(COLLECTOR_LEVELS),
        reward: 0.0,
    },
];

pub fn get_achievement_def(id: AchievementId) -> Option<&'static AchievementDef> {
    ALL_ACHIEVEMENTS.iter().find(|def| def.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::total_unique_cards;
    use std::collections::HashSet;

    #[test]
    fn test_ids_unique() {
        let ids: HashSet<_> = ALL_ACHIEVEMENTS.iter().map(|a| a.id).collect();
        assert_eq!(ids.len(), ALL_ACHIEVEMENTS.len());
    }

    #[test]
    fn test_every_id_has_def() {
        for id in [
            AchievementId::FirstCoins,
            AchievementId::Millionaire,
            AchievementId::FirstGenerator,
            AchievementId::GeneratorMaster,
            AchievementId::Collector,
        ] {
            assert!(get_achievement_def(id).is_some(), "{:?} missing", id);
        }
    }

    #[test]
    fn test_collector_levels_reachable() {
        let top = COLLECTOR_LEVELS.last().unwrap().requirement;
        assert_eq!(top as usize, total_unique_cards());
        for pair in COLLECTOR_LEVELS.windows(2) {
            assert!(pair[0].requirement < pair[1].requirement);
        }
    }
}
