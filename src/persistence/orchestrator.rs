//! Saves and restores every subsystem through a [`KeyValueStore`].
//!
//! The orchestrator is the only place offline catch-up is credited: loading
//! computes it from the stored flush timestamp, then immediately writes a new
//! flush timestamp so a second load finds nothing to credit.

use super::error::PersistenceError;
use super::schema::{self, keys};
use super::store::KeyValueStore;
use crate::achievements::AchievementsRecord;
use crate::booster::BoostersRecord;
use crate::cards::CardsRecord;
use crate::core::config::GameConfig;
use crate::core::events::{EventBus, GameEvent, Subscription};
use crate::core::game_state::GameState;
use crate::currency::CurrencyRecord;
use crate::production::{
    apply_offline, bootstrap_roster, plan_offline, record_production, GeneratorsRecord,
    OfflineReport,
};
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};
use std::cell::Cell;
use std::collections::BTreeMap;
use std::rc::Rc;

/// Encoded records for one save, keyed by record name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveSnapshot {
    pub timestamp: i64,
    pub records: BTreeMap<&'static str, String>,
}

impl SaveSnapshot {
    /// Encode every subsystem of `state` as of `now`.
    pub fn capture(state: &GameState, now: i64) -> Result<Self, PersistenceError> {
        let mut generators = state.production.save();
        generators.last_flush_timestamp = now;

        let mut records = BTreeMap::new();
        records.insert(keys::CURRENCY, schema::encode(&state.ledger.save())?);
        records.insert(keys::GENERATORS, schema::encode(&generators)?);
        records.insert(keys::CARDS, schema::encode(&state.inventory.save())?);
        records.insert(keys::COLLECTION, schema::encode(&())?);
        records.insert(keys::BOOSTERS, schema::encode(&state.loot.save())?);
        records.insert(keys::ACHIEVEMENTS, schema::encode(&state.achievements.save())?);
        Ok(Self {
            timestamp: now,
            records,
        })
    }

    /// SHA-256 over every record, hex encoded.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        for (key, value) in &self.records {
            hasher.update(key.as_bytes());
            hasher.update([0u8]);
            hasher.update(value.as_bytes());
            hasher.update([0u8]);
        }
        hasher
            .finalize()
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect()
    }
}

/// Parsed records from a store. Absent or unreadable keys are `None`.
#[derive(Debug, Default)]
struct StoredRecords {
    currency: Option<CurrencyRecord>,
    generators: Option<GeneratorsRecord>,
    cards: Option<CardsRecord>,
    boosters: Option<BoostersRecord>,
    achievements: Option<AchievementsRecord>,
    unreadable: Vec<(&'static str, PersistenceError)>,
}

impl StoredRecords {
    /// Decode each key on its own so one bad record cannot hide the others.
    fn read(store: &impl KeyValueStore) -> Self {
        let mut records = Self::default();
        // Parsed as unit so a malformed value still surfaces as a load error.
        let _: Option<()> = records.read_key(store, keys::COLLECTION);
        records.currency = records.read_key(store, keys::CURRENCY);
        records.generators = records.read_key(store, keys::GENERATORS);
        records.cards = records.read_key(store, keys::CARDS);
        records.boosters = records.read_key(store, keys::BOOSTERS);
        records.achievements = records.read_key(store, keys::ACHIEVEMENTS);
        records
    }

    fn read_key<T: DeserializeOwned>(
        &mut self,
        store: &impl KeyValueStore,
        key: &'static str,
    ) -> Option<T> {
        let decoded: Result<Option<T>, PersistenceError> = store
            .get(key)
            .and_then(|raw| raw.map(|raw| schema::decode(key, &raw)).transpose());
        match decoded {
            Ok(record) => record,
            Err(e) => {
                self.unreadable.push((key, e));
                None
            }
        }
    }

    fn has_core_record(&self) -> bool {
        self.currency.is_some() || self.generators.is_some()
    }
}

/// Result of [`SaveOrchestrator::load`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoadOutcome {
    /// State restored; carries the offline credit applied.
    Loaded(OfflineReport),
    /// Neither `currency` nor `generators` is stored.
    NoSave,
    /// Records exist but neither `currency` nor `generators` could be
    /// read. State and store are untouched.
    Failed,
}

#[derive(Debug)]
pub struct SaveOrchestrator {
    min_save_interval: i64,
    autosave_interval: i64,
    max_offline: i64,
    last_flush: Option<i64>,
    last_autosave: i64,
    dirty: Rc<Cell<bool>>,
    _subscription: Subscription,
    bus: EventBus,
}

fn marks_dirty(event: &GameEvent) -> bool {
    matches!(
        event,
        GameEvent::BalanceChanged { .. }
            | GameEvent::MultiplierChanged { .. }
            | GameEvent::GeneratorAdded { .. }
            | GameEvent::GeneratorUpgraded { .. }
            | GameEvent::BoosterPurchased { .. }
            | GameEvent::BoosterOpened { .. }
            | GameEvent::PityUpdated { .. }
            | GameEvent::CardAdded { .. }
            | GameEvent::CardUpdated { .. }
            | GameEvent::CardRemoved { .. }
            | GameEvent::AchievementUnlocked { .. }
            | GameEvent::AchievementProgress { .. }
    )
}

impl SaveOrchestrator {
    pub fn new(bus: &EventBus, config: &GameConfig) -> Self {
        let dirty = Rc::new(Cell::new(false));
        let flag = Rc::clone(&dirty);
        let subscription = bus.subscribe(move |event| {
            if marks_dirty(event) {
                flag.set(true);
            }
        });
        Self {
            min_save_interval: config.min_save_interval(),
            autosave_interval: config.autosave_interval(),
            max_offline: config.max_offline(),
            last_flush: None,
            last_autosave: 0,
            dirty,
            _subscription: subscription,
            bus: bus.clone(),
        }
    }

    /// Whether anything changed since the last successful save.
    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    /// Time of the last successful save in this session.
    pub fn last_flush(&self) -> Option<i64> {
        self.last_flush
    }

    /// A previous session left both the run marker and its generators.
    pub fn has_prior_save(&self, store: &impl KeyValueStore) -> bool {
        let check = || -> Result<bool, PersistenceError> {
            Ok(store.contains(keys::HAS_RUN_BEFORE)? && store.contains(keys::GENERATORS)?)
        };
        check().unwrap_or_else(|e| {
            log::warn!("Could not inspect save store: {}", e);
            false
        })
    }

    /// Write every subsystem. Unforced saves inside the minimum interval
    /// are skipped and return false.
    pub fn save_all(
        &mut self,
        state: &mut GameState,
        store: &mut impl KeyValueStore,
        force: bool,
        now: i64,
    ) -> bool {
        if !force {
            if let Some(last) = self.last_flush {
                if now - last < self.min_save_interval {
                    log::debug!("Save skipped, last flush {}s ago", now - last);
                    return false;
                }
            }
        }

        let snapshot = match SaveSnapshot::capture(state, now) {
            Ok(snapshot) => snapshot,
            Err(e) => return self.report_save_error(e),
        };

        let mut first_error = None;
        for (key, value) in &snapshot.records {
            if let Err(e) = store.set(key, value) {
                log::error!("Failed to write '{}': {}", key, e);
                first_error.get_or_insert(e);
            }
        }
        if let Some(e) = first_error {
            return self.report_save_error(e);
        }
        let marker = match schema::encode(&true) {
            Ok(marker) => marker,
            Err(e) => return self.report_save_error(e),
        };
        if let Err(e) = store.set(keys::HAS_RUN_BEFORE, &marker) {
            return self.report_save_error(e);
        }

        state.production.set_last_flush_timestamp(now);
        self.last_flush = Some(now);
        self.last_autosave = now;
        self.dirty.set(false);
        if log::log_enabled!(log::Level::Debug) {
            log::debug!("Saved game at {} ({})", now, &snapshot.digest()[..12]);
        }
        self.bus.emit(GameEvent::SaveCompleted { timestamp: now });
        true
    }

    fn report_save_error(&self, error: PersistenceError) -> bool {
        log::error!("Save failed: {}", error);
        self.bus.emit(GameEvent::SaveError {
            message: error.to_string(),
        });
        false
    }

    /// Restore every subsystem and credit offline production once.
    pub fn load(
        &mut self,
        state: &mut GameState,
        store: &mut impl KeyValueStore,
        now: i64,
    ) -> LoadOutcome {
        let records = StoredRecords::read(&*store);
        for (key, e) in &records.unreadable {
            log::error!("Skipping unreadable '{}' record: {}", key, e);
            self.bus.emit(GameEvent::LoadError {
                message: format!("{}: {}", key, e),
            });
        }
        if !records.has_core_record() {
            if records.unreadable.is_empty() {
                return LoadOutcome::NoSave;
            }
            log::error!("Load failed, no readable currency or generators");
            return LoadOutcome::Failed;
        }

        state.production.stop();

        let report = match &records.generators {
            Some(generators) if generators.last_flush_timestamp > 0 => plan_offline(
                record_production(generators),
                generators.last_flush_timestamp,
                now,
                self.max_offline,
            ),
            _ => OfflineReport::default(),
        };

        if let Some(currency) = &records.currency {
            state.ledger.load(currency);
        }
        apply_offline(&report, &mut state.ledger, &state.bus);

        match &records.generators {
            Some(generators) if !generators.generators.is_empty() => {
                state.production.load(generators)
            }
            _ => {
                bootstrap_roster(&mut state.production);
            }
        }
        state.production.set_last_flush_timestamp(now);

        if let Some(cards) = &records.cards {
            state.inventory.load(cards);
        }
        state.refresh_collection();
        if let Some(achievements) = &records.achievements {
            state.achievements.load(achievements);
        }
        if let Some(boosters) = &records.boosters {
            state.loot.load(boosters);
        }

        state.production.start(now);
        log::info!(
            "Loaded save: {} generators, {} cards, offline +{:.0}",
            state.production.generators().len(),
            state.inventory.unique_count(),
            report.amount
        );
        self.bus.emit(GameEvent::LoadCompleted { offline: report });
        self.save_all(state, store, true, now);
        LoadOutcome::Loaded(report)
    }

    pub fn load_all(
        &mut self,
        state: &mut GameState,
        store: &mut impl KeyValueStore,
        now: i64,
    ) -> bool {
        matches!(self.load(state, store, now), LoadOutcome::Loaded(_))
    }

    /// Save if the autosave period elapsed and something changed.
    pub fn maybe_autosave(
        &mut self,
        state: &mut GameState,
        store: &mut impl KeyValueStore,
        now: i64,
    ) -> bool {
        if now - self.last_autosave < self.autosave_interval {
            return false;
        }
        self.last_autosave = now;
        if !self.is_dirty() {
            return false;
        }
        self.save_all(state, store, false, now)
    }

    /// Remove every record and the run marker.
    pub fn clear(&mut self, store: &mut impl KeyValueStore) -> bool {
        let mut ok = true;
        for key in keys::RECORDS.iter().chain([&keys::HAS_RUN_BEFORE]) {
            if let Err(e) = store.remove(key) {
                log::error!("Failed to remove '{}': {}", key, e);
                ok = false;
            }
        }
        self.last_flush = None;
        ok
    }
}
