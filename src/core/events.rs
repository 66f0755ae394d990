//! Domain events and the in-process event bus.
//!
//! Subsystems emit [`GameEvent`]s onto a shared [`EventBus`]. Presentation
//! collaborators (screens, toasts, the autosave trigger) subscribe and get back
//! a [`Subscription`] handle; dropping the handle removes the listener.
//!
//! Dispatch is single-threaded and re-entrant: a listener may emit further
//! events or subscribe/unsubscribe while it runs. Nested emits are queued and
//! delivered after the current event, in order.

use crate::achievements::AchievementId;
use crate::booster::{Booster, PityCounters};
use crate::cards::Card;
use crate::collection::CollectionStats;
use crate::production::{Generator, OfflineReport};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

/// A single event produced by the simulation core.
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    // ── Currency ────────────────────────────────────────────────
    /// Balance moved. `delta` is negative for debits.
    BalanceChanged { old: f64, new: f64, delta: f64 },

    /// Click multiplier grew by `added`.
    MultiplierChanged { old: f64, new: f64, added: f64 },

    // ── Production ──────────────────────────────────────────────
    GeneratorAdded { generator: Generator },

    GeneratorUpgraded {
        id: String,
        level: u32,
        cost: f64,
        production: f64,
    },

    /// Aggregate production or running state changed.
    ProductionUpdated { total: f64, running: bool },

    /// One scheduler tick credited `amount`.
    Tick {
        amount: f64,
        generators: Vec<Generator>,
        timestamp: i64,
    },

    /// Lump-sum credit for time spent away.
    OfflineProgress { elapsed_seconds: i64, amount: f64 },

    // ── Boosters ────────────────────────────────────────────────
    BoosterPurchased { booster: Booster },

    BoosterOpened { booster: Booster, cards: Vec<Card> },

    BoosterError { message: String },

    PityUpdated { counters: PityCounters },

    // ── Cards ───────────────────────────────────────────────────
    CardAdded { card: Card },

    /// Copies, lock state, or other fields of an existing row changed.
    CardUpdated { card: Card },

    CardRemoved { card_id: u64 },

    // ── Collection ──────────────────────────────────────────────
    CollectionViewUpdated { total: usize },

    CollectionStatsUpdated { stats: CollectionStats },

    // ── Achievements ────────────────────────────────────────────
    AchievementUnlocked { id: AchievementId, reward: f64 },

    /// A progressive achievement reached `level` (1-based).
    AchievementProgress {
        id: AchievementId,
        level: usize,
        reward: f64,
    },

    // ── Persistence ─────────────────────────────────────────────
    SaveCompleted { timestamp: i64 },

    SaveError { message: String },

    LoadCompleted { offline: OfflineReport },

    LoadError { message: String },
}

/// Discriminant of [`GameEvent`], used to filter subscriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    BalanceChanged,
    MultiplierChanged,
    GeneratorAdded,
    GeneratorUpgraded,
    ProductionUpdated,
    Tick,
    OfflineProgress,
    BoosterPurchased,
    BoosterOpened,
    BoosterError,
    PityUpdated,
    CardAdded,
    CardUpdated,
    CardRemoved,
    CollectionViewUpdated,
    CollectionStatsUpdated,
    AchievementUnlocked,
    AchievementProgress,
    SaveCompleted,
    SaveError,
    LoadCompleted,
    LoadError,
}

impl GameEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            GameEvent::BalanceChanged { .. } => EventKind::BalanceChanged,
            GameEvent::MultiplierChanged { .. } => EventKind::MultiplierChanged,
            GameEvent::GeneratorAdded { .. } => EventKind::GeneratorAdded,
            GameEvent::GeneratorUpgraded { .. } => EventKind::GeneratorUpgraded,
            GameEvent::ProductionUpdated { .. } => EventKind::ProductionUpdated,
            GameEvent::Tick { .. } => EventKind::Tick,
            GameEvent::OfflineProgress { .. } => EventKind::OfflineProgress,
            GameEvent::BoosterPurchased { .. } => EventKind::BoosterPurchased,
            GameEvent::BoosterOpened { .. } => EventKind::BoosterOpened,
            GameEvent::BoosterError { .. } => EventKind::BoosterError,
            GameEvent::PityUpdated { .. } => EventKind::PityUpdated,
            GameEvent::CardAdded { .. } => EventKind::CardAdded,
            GameEvent::CardUpdated { .. } => EventKind::CardUpdated,
            GameEvent::CardRemoved { .. } => EventKind::CardRemoved,
            GameEvent::CollectionViewUpdated { .. } => EventKind::CollectionViewUpdated,
            GameEvent::CollectionStatsUpdated { .. } => EventKind::CollectionStatsUpdated,
            GameEvent::AchievementUnlocked { .. } => EventKind::AchievementUnlocked,
            GameEvent::AchievementProgress { .. } => EventKind::AchievementProgress,
            GameEvent::SaveCompleted { .. } => EventKind::SaveCompleted,
            GameEvent::SaveError { .. } => EventKind::SaveError,
            GameEvent::LoadCompleted { .. } => EventKind::LoadCompleted,
            GameEvent::LoadError { .. } => EventKind::LoadError,
        }
    }
}

type Listener = Box<dyn FnMut(&GameEvent)>;

struct Slot {
    id: u64,
    filter: Option<EventKind>,
    listener: Listener,
}

#[derive(Default)]
struct BusInner {
    slots: RefCell<Vec<Slot>>,
    removed_during_dispatch: RefCell<Vec<u64>>,
    queue: RefCell<VecDeque<GameEvent>>,
    dispatching: Cell<bool>,
    next_id: Cell<u64>,
}

impl BusInner {
    fn is_removed(&self, id: u64) -> bool {
        self.removed_during_dispatch.borrow().contains(&id)
    }
}

/// Shared, cheaply cloneable handle to the event bus.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Rc<BusInner>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Listen to every event.
    #[must_use = "dropping the subscription immediately unsubscribes"]
    pub fn subscribe(&self, listener: impl FnMut(&GameEvent) + 'static) -> Subscription {
        self.register(None, Box::new(listener))
    }

    /// Listen to one kind of event.
    #[must_use = "dropping the subscription immediately unsubscribes"]
    pub fn on(&self, kind: EventKind, listener: impl FnMut(&GameEvent) + 'static) -> Subscription {
        self.register(Some(kind), Box::new(listener))
    }

    fn register(&self, filter: Option<EventKind>, listener: Listener) -> Subscription {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);
        self.inner.slots.borrow_mut().push(Slot {
            id,
            filter,
            listener,
        });
        Subscription {
            id,
            bus: Rc::downgrade(&self.inner),
        }
    }

    pub fn emit(&self, event: GameEvent) {
        self.inner.queue.borrow_mut().push_back(event);
        if self.inner.dispatching.get() {
            return;
        }

        self.inner.dispatching.set(true);
        loop {
            let next = self.inner.queue.borrow_mut().pop_front();
            let Some(event) = next else { break };
            let kind = event.kind();

            // Listeners run with the slot list taken out so they can subscribe.
            let mut active = std::mem::take(&mut *self.inner.slots.borrow_mut());
            for slot in active.iter_mut() {
                if self.inner.is_removed(slot.id) {
                    continue;
                }
                if slot.filter.map_or(true, |f| f == kind) {
                    (slot.listener)(&event);
                }
            }

            active.append(&mut self.inner.slots.borrow_mut());
            let removed = std::mem::take(&mut *self.inner.removed_during_dispatch.borrow_mut());
            let (kept, dropped): (Vec<Slot>, Vec<Slot>) = active
                .into_iter()
                .partition(|slot| !removed.contains(&slot.id));
            *self.inner.slots.borrow_mut() = kept;
            drop(dropped);
        }
        self.inner.dispatching.set(false);

        // Unsubscribes triggered by the last round of drops.
        let leftover = std::mem::take(&mut *self.inner.removed_during_dispatch.borrow_mut());
        if !leftover.is_empty() {
            let dropped: Vec<Slot> = {
                let mut slots = self.inner.slots.borrow_mut();
                let (kept, dropped) = std::mem::take(&mut *slots)
                    .into_iter()
                    .partition(|slot| !leftover.contains(&slot.id));
                *slots = kept;
                dropped
            };
            drop(dropped);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.inner.slots.borrow().len()
    }
}

/// Scoped listener registration. Unsubscribes on drop.
pub struct Subscription {
    id: u64,
    bus: Weak<BusInner>,
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Some(inner) = self.bus.upgrade() else {
            return;
        };
        if inner.dispatching.get() {
            inner.removed_during_dispatch.borrow_mut().push(self.id);
            return;
        }
        // Release the borrow before the listener (and anything it owns) drops.
        let removed = {
            let mut slots = inner.slots.borrow_mut();
            slots
                .iter()
                .position(|slot| slot.id == self.id)
                .map(|index| slots.remove(index))
        };
        drop(removed);
    }
}

/// Collects every event emitted while attached. Handy for collaborators that
/// poll instead of reacting, and for tests.
pub struct EventRecorder {
    events: Rc<RefCell<Vec<GameEvent>>>,
    _subscription: Subscription,
}

impl EventRecorder {
    pub fn attach(bus: &EventBus) -> Self {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        let subscription = bus.subscribe(move |event| sink.borrow_mut().push(event.clone()));
        Self {
            events,
            _subscription: subscription,
        }
    }

    pub fn events(&self) -> Vec<GameEvent> {
        self.events.borrow().clone()
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|e| e.kind() == kind)
            .count()
    }

    pub fn take(&self) -> Vec<GameEvent> {
        std::mem::take(&mut *self.events.borrow_mut())
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }
}
