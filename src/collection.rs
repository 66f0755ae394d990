//! Filtered, sorted projections of the inventory.
//!
//! The view owns no card data. It keeps the active filter and sort, and
//! republishes the projection and aggregate stats whenever it is refreshed.

use crate::cards::{Card, Inventory, Rarity};
use crate::core::events::{EventBus, GameEvent};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CardFilter {
    pub rarity: Option<Rarity>,
    pub locked: Option<bool>,
    pub min_value: Option<u64>,
    pub max_value: Option<u64>,
}

impl CardFilter {
    pub fn matches(&self, card: &Card) -> bool {
        if self.rarity.is_some_and(|r| r != card.rarity) {
            return false;
        }
        if self.locked.is_some_and(|l| l != card.locked) {
            return false;
        }
        let value = card.current_value();
        if self.min_value.is_some_and(|min| value < min) {
            return false;
        }
        if self.max_value.is_some_and(|max| value > max) {
            return false;
        }
        true
    }

    pub fn is_empty(&self) -> bool {
        *self == CardFilter::default()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortField {
    Name,
    #[default]
    Rarity,
    Value,
    Copies,
    AcquiredAt,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardSort {
    pub field: SortField,
    pub direction: SortDirection,
}

impl CardSort {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    fn compare(&self, a: &Card, b: &Card) -> Ordering {
        let ord = match self.field {
            SortField::Name => a.name.cmp(&b.name),
            SortField::Rarity => a.rarity.cmp(&b.rarity),
            SortField::Value => a.current_value().cmp(&b.current_value()),
            SortField::Copies => a.copies.cmp(&b.copies),
            SortField::AcquiredAt => a.acquired_at.cmp(&b.acquired_at),
        };
        let ord = match self.direction {
            SortDirection::Ascending => ord,
            SortDirection::Descending => ord.reverse(),
        };
        // Ties always resolve by id so the view is deterministic.
        ord.then(a.id.cmp(&b.id))
    }
}

/// Aggregate numbers over the whole inventory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectionStats {
    pub unique_cards: usize,
    pub total_copies: u64,
    pub by_rarity: BTreeMap<Rarity, u64>,
    pub total_value: u64,
    pub locked_cards: usize,
}

impl CollectionStats {
    pub fn from_cards<'a>(cards: impl IntoIterator<Item = &'a Card>) -> Self {
        let mut stats = CollectionStats::default();
        for rarity in Rarity::ALL {
            stats.by_rarity.insert(rarity, 0);
        }
        for card in cards {
            stats.unique_cards += 1;
            stats.total_copies += card.copies as u64;
            *stats.by_rarity.entry(card.rarity).or_insert(0) += card.copies as u64;
            stats.total_value += card.stack_value();
            if card.locked {
                stats.locked_cards += 1;
            }
        }
        stats
    }
}

/// Filter then sort the inventory into a fresh list.
pub fn current_view(inventory: &Inventory, filter: &CardFilter, sort: CardSort) -> Vec<Card> {
    let mut cards: Vec<Card> = inventory
        .cards()
        .filter(|card| filter.matches(card))
        .cloned()
        .collect();
    cards.sort_by(|a, b| sort.compare(a, b));
    cards
}

#[derive(Debug)]
pub struct CollectionView {
    filter: CardFilter,
    sort: CardSort,
    cached: Vec<Card>,
    bus: EventBus,
}

impl CollectionView {
    pub fn new(bus: EventBus) -> Self {
        Self {
            filter: CardFilter::default(),
            sort: CardSort::default(),
            cached: Vec::new(),
            bus,
        }
    }

    pub fn filter(&self) -> &CardFilter {
        &self.filter
    }

    pub fn sort(&self) -> CardSort {
        self.sort
    }

    /// The projection as of the last refresh.
    pub fn view(&self) -> &[Card] {
        &self.cached
    }

    pub fn set_filter(&mut self, filter: CardFilter, inventory: &Inventory) {
        self.filter = filter;
        self.refresh(inventory);
    }

    pub fn set_sort(&mut self, sort: CardSort, inventory: &Inventory) {
        self.sort = sort;
        self.refresh(inventory);
    }

    pub fn clear_filters(&mut self, inventory: &Inventory) {
        self.filter = CardFilter::default();
        self.refresh(inventory);
    }

    /// Recompute the projection and publish it along with fresh stats.
    pub fn refresh(&mut self, inventory: &Inventory) {
        self.cached = current_view(inventory, &self.filter, self.sort);
        self.bus.emit(GameEvent::CollectionViewUpdated {
            total: self.cached.len(),
        });
        self.bus.emit(GameEvent::CollectionStatsUpdated {
            stats: inventory.stats(),
        });
    }
}
