//! Achievement types and the unlock tracker.

use super::data::{get_achievement_def, ALL_ACHIEVEMENTS};
use crate::core::events::{EventBus, GameEvent};
use crate::currency::CurrencyLedger;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Unique identifier for each achievement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AchievementId {
    // Currency
    FirstCoins,
    Millionaire,
    // Generators
    FirstGenerator,
    GeneratorMaster,
    // Collection (progressive)
    Collector,
}

/// What an achievement measures.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Requirement {
    /// Balance at or above the amount.
    Balance(f64),
    /// At least one generator above level 0.
    AnyGeneratorOwned,
    /// Every generator at or above the level.
    AllGeneratorsAtLevel(u32),
    /// Distinct inventory rows, paid out per level.
    UniqueCards(&'static [ProgressLevel]),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressLevel {
    pub requirement: u64,
    pub reward: f64,
}

/// Static definition of an achievement.
#[derive(Debug, Clone)]
pub struct AchievementDef {
    pub id: AchievementId,
    pub name: &'static str,
    pub description: &'static str,
    pub requirement: Requirement,
    /// Paid on unlock. Progressive achievements pay per level instead.
    pub reward: f64,
}

impl AchievementDef {
    pub fn is_progressive(&self) -> bool {
        matches!(self.requirement, Requirement::UniqueCards(_))
    }

    pub fn levels(&self) -> &'static [ProgressLevel] {
        match self.requirement {
            Requirement::UniqueCards(levels) => levels,
            _ => &[],
        }
    }
}

/// The slice of game state achievements are judged against.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AchievementSnapshot {
    pub balance: f64,
    pub generator_levels: Vec<u32>,
    pub unique_cards: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressiveState {
    pub id: AchievementId,
    pub current_level: usize,
}

/// Persisted shape of the `achievements` key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AchievementsRecord {
    pub unlocked: Vec<AchievementId>,
    pub progressive_levels: Vec<ProgressiveState>,
}

#[derive(Debug)]
pub struct Achievements {
    unlocked: BTreeSet<AchievementId>,
    progressive_levels: BTreeMap<AchievementId, usize>,
    bus: EventBus,
}

impl Achievements {
    pub fn new(bus: EventBus) -> Self {
        Self {
            unlocked: BTreeSet::new(),
            progressive_levels: BTreeMap::new(),
            bus,
        }
    }

    /// Check if an achievement is unlocked.
    pub fn is_unlocked(&self, id: AchievementId) -> bool {
        self.unlocked.contains(&id)
    }

    /// Levels reached on a progressive achievement.
    pub fn level(&self, id: AchievementId) -> usize {
        self.progressive_levels.get(&id).copied().unwrap_or(0)
    }

    pub fn total_count(&self) -> usize {
        ALL_ACHIEVEMENTS.len()
    }

    pub fn unlocked_count(&self) -> usize {
        self.unlocked.len()
    }

    /// Get unlock percentage (0.0 - 100.0).
    pub fn unlock_percentage(&self) -> f32 {
        let total = self.total_count();
        if total == 0 {
            return 0.0;
        }
        (self.unlocked_count() as f32 / total as f32) * 100.0
    }

    /// Evaluate every achievement, paying rewards into the ledger. Returns
    /// the ids that unlocked or advanced a level.
    pub fn check(
        &mut self,
        snapshot: &AchievementSnapshot,
        ledger: &mut CurrencyLedger,
    ) -> Vec<AchievementId> {
        let mut changed = Vec::new();
        for def in ALL_ACHIEVEMENTS {
            if self.is_unlocked(def.id) {
                continue;
            }
            let advanced = match def.requirement {
                Requirement::Balance(amount) => {
                    snapshot.balance >= amount && self.unlock(def.id, def.reward, ledger)
                }
                Requirement::AnyGeneratorOwned => {
                    snapshot.generator_levels.iter().any(|l| *l > 0)
                        && self.unlock(def.id, def.reward, ledger)
                }
                Requirement::AllGeneratorsAtLevel(level) => {
                    !snapshot.generator_levels.is_empty()
                        && snapshot.generator_levels.iter().all(|l| *l >= level)
                        && self.unlock(def.id, def.reward, ledger)
                }
                Requirement::UniqueCards(levels) => {
                    self.advance_levels(def.id, levels, snapshot.unique_cards as u64, ledger)
                }
            };
            if advanced {
                changed.push(def.id);
            }
        }
        changed
    }

    fn unlock(&mut self, id: AchievementId, reward: f64, ledger: &mut CurrencyLedger) -> bool {
        if !self.unlocked.insert(id) {
            return false;
        }
        log::info!("Achievement unlocked: {:?} (+{})", id, reward);
        ledger.credit(reward);
        self.bus.emit(GameEvent::AchievementUnlocked { id, reward });
        true
    }

    fn advance_levels(
        &mut self,
        id: AchievementId,
        levels: &[ProgressLevel],
        value: u64,
        ledger: &mut CurrencyLedger,
    ) -> bool {
        let mut current = self.level(id);
        let start = current;
        while let Some(next) = levels.get(current) {
            if value < next.requirement {
                break;
            }
            current += 1;
            self.progressive_levels.insert(id, current);
            ledger.credit(next.reward);
            self.bus.emit(GameEvent::AchievementProgress {
                id,
                level: current,
                reward: next.reward,
            });
        }
        if current >= levels.len() && current > start {
            self.unlocked.insert(id);
            self.bus.emit(GameEvent::AchievementUnlocked { id, reward: 0.0 });
        }
        current > start
    }

    pub fn save(&self) -> AchievementsRecord {
        AchievementsRecord {
            unlocked: self.unlocked.iter().copied().collect(),
            progressive_levels: self
                .progressive_levels
                .iter()
                .map(|(id, level)| ProgressiveState {
                    id: *id,
                    current_level: *level,
                })
                .collect(),
        }
    }

    /// Restore from a record. Levels beyond a definition's table are clamped.
    pub fn load(&mut self, record: &AchievementsRecord) {
        self.unlocked = record.unlocked.iter().copied().collect();
        self.progressive_levels.clear();
        for state in &record.progressive_levels {
            let Some(def) = get_achievement_def(state.id) else {
                continue;
            };
            if def.is_progressive() {
                let level = state.current_level.min(def.levels().len());
                self.progressive_levels.insert(state.id, level);
            }
        }
    }
}
