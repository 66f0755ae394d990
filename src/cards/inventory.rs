//! Card inventory with (rarity, name) deduplication.
//!
//! Each distinct (rarity, name) pair occupies exactly one row; acquiring the
//! same card again bumps that row's copy count.

use super::templates::template_for;
use super::types::{Card, Rarity};
use crate::collection::CollectionStats;
use crate::core::error::GameError;
use crate::core::events::{EventBus, GameEvent};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Persisted shape of the `cards` key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CardsRecord {
    pub cards: Vec<Card>,
    pub next_card_sequence: u64,
}

#[derive(Debug)]
pub struct Inventory {
    cards: BTreeMap<u64, Card>,
    index: HashMap<(Rarity, String), u64>,
    next_card_sequence: u64,
    bus: EventBus,
}

impl Inventory {
    pub fn new(bus: EventBus) -> Self {
        Self {
            cards: BTreeMap::new(),
            index: HashMap::new(),
            next_card_sequence: 1,
            bus,
        }
    }

    pub fn get(&self, card_id: u64) -> Option<&Card> {
        self.cards.get(&card_id)
    }

    pub fn find(&self, rarity: Rarity, name: &str) -> Option<&Card> {
        self.index
            .get(&(rarity, name.to_string()))
            .and_then(|id| self.cards.get(id))
    }

    /// Cards in id (acquisition) order.
    pub fn cards(&self) -> impl Iterator<Item = &Card> {
        self.cards.values()
    }

    pub fn unique_count(&self) -> usize {
        self.cards.len()
    }

    pub fn total_copies(&self) -> u64 {
        self.cards.values().map(|c| c.copies as u64).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn stats(&self) -> CollectionStats {
        CollectionStats::from_cards(self.cards.values())
    }

    /// Mint a random card of `rarity` from its template pool.
    pub fn mint(&mut self, rarity: Rarity, rng: &mut impl Rng, now: i64) -> Card {
        let template = template_for(rarity);
        let name = template.names[rng.gen_range(0..template.names.len())];
        self.add_card(name, rarity, template.base_value, now)
    }

    /// Add one copy of a card, merging into the existing row for the same
    /// (rarity, name). Returns a snapshot of the resulting row.
    pub fn add_card(&mut self, name: &str, rarity: Rarity, base_value: u64, now: i64) -> Card {
        if let Some(card) = self
            .index
            .get(&(rarity, name.to_string()))
            .and_then(|id| self.cards.get_mut(id))
        {
            card.copies += 1;
            let snapshot = card.clone();
            self.bus.emit(GameEvent::CardUpdated {
                card: snapshot.clone(),
            });
            return snapshot;
        }

        let card = Card {
            id: self.next_card_sequence,
            name: name.to_string(),
            rarity,
            base_value,
            copies: 1,
            locked: false,
            acquired_at: now,
        };
        self.next_card_sequence += 1;
        self.index.insert((rarity, card.name.clone()), card.id);
        self.cards.insert(card.id, card.clone());
        self.bus.emit(GameEvent::CardAdded { card: card.clone() });
        card
    }

    /// Remove `quantity` copies and return their realized value. The row
    /// disappears when its last copy goes.
    pub fn dispose(&mut self, card_id: u64, quantity: u32) -> Result<u64, GameError> {
        if quantity == 0 {
            return Err(GameError::InvalidQuantity);
        }
        let card = self
            .cards
            .get_mut(&card_id)
            .ok_or(GameError::UnknownCard(card_id))?;
        if card.locked {
            return Err(GameError::CardLocked(card_id));
        }
        if card.copies < quantity {
            return Err(GameError::NotEnoughCopies {
                card_id,
                requested: quantity,
                owned: card.copies,
            });
        }

        let realized = card.current_value() * quantity as u64;
        card.copies -= quantity;
        if card.copies == 0 {
            if let Some(removed) = self.cards.remove(&card_id) {
                self.index.remove(&(removed.rarity, removed.name));
            }
            self.bus.emit(GameEvent::CardRemoved { card_id });
        } else {
            let snapshot = card.clone();
            self.bus.emit(GameEvent::CardUpdated { card: snapshot });
        }
        Ok(realized)
    }

    pub fn lock(&mut self, card_id: u64) -> Result<(), GameError> {
        self.set_locked(card_id, true)
    }

    pub fn unlock(&mut self, card_id: u64) -> Result<(), GameError> {
        self.set_locked(card_id, false)
    }

    fn set_locked(&mut self, card_id: u64, locked: bool) -> Result<(), GameError> {
        let card = self
            .cards
            .get_mut(&card_id)
            .ok_or(GameError::UnknownCard(card_id))?;
        if card.locked != locked {
            card.locked = locked;
            let snapshot = card.clone();
            self.bus.emit(GameEvent::CardUpdated { card: snapshot });
        }
        Ok(())
    }

    pub fn save(&self) -> CardsRecord {
        CardsRecord {
            cards: self.cards.values().cloned().collect(),
            next_card_sequence: self.next_card_sequence,
        }
    }

    /// Replace the inventory from a record. Rows that share a (rarity, name)
    /// are folded into the lowest id, and empty rows are dropped.
    pub fn load(&mut self, record: &CardsRecord) {
        self.cards.clear();
        self.index.clear();

        let mut max_id = 0;
        for card in &record.cards {
            max_id = max_id.max(card.id);
            if card.copies == 0 {
                continue;
            }
            let key = (card.rarity, card.name.clone());
            match self.index.get(&key).and_then(|id| self.cards.get_mut(id)) {
                Some(existing) => {
                    existing.copies += card.copies;
                    existing.locked |= card.locked;
                    existing.acquired_at = existing.acquired_at.min(card.acquired_at);
                }
                None => {
                    self.index.insert(key, card.id);
                    self.cards.insert(card.id, card.clone());
                }
            }
        }
        self.next_card_sequence = record.next_card_sequence.max(max_id + 1);
    }
}
