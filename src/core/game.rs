//! Command surface over a [`GameState`] bound to a save store.
//!
//! Every command either mutates state and emits its events, or returns an
//! error leaving state untouched. Time is passed in explicitly as unix
//! seconds so callers (the binary, tests, the simulator) own the clock.

use super::config::GameConfig;
use super::error::GameError;
use super::events::EventBus;
use super::game_state::GameState;
use crate::achievements::AchievementId;
use crate::booster::Booster;
use crate::cards::Card;
use crate::collection::{CardFilter, CardSort};
use crate::persistence::{KeyValueStore, LoadOutcome, SaveOrchestrator};
use crate::production::{bootstrap_roster, UpgradeOutcome};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// What one call to [`Game::update`] did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateReport {
    pub ticks: u32,
    pub achievements: Vec<AchievementId>,
    pub saved: bool,
}

pub struct Game<S: KeyValueStore> {
    state: GameState,
    store: S,
    orchestrator: SaveOrchestrator,
    rng: ChaCha8Rng,
    config: GameConfig,
}

impl<S: KeyValueStore> Game<S> {
    pub fn new(config: GameConfig, store: S) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        let state = GameState::new(&config);
        let orchestrator = SaveOrchestrator::new(&state.bus, &config);
        Self {
            state,
            store,
            orchestrator,
            rng,
            config,
        }
    }

    /// Same as [`Game::new`] with a fixed RNG seed.
    pub fn with_seed(mut config: GameConfig, store: S, seed: u64) -> Self {
        config.rng_seed = Some(seed);
        Self::new(config, store)
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn bus(&self) -> &EventBus {
        &self.state.bus
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn orchestrator(&self) -> &SaveOrchestrator {
        &self.orchestrator
    }

    /// Restore the previous session, or set up a first run.
    ///
    /// A first run gets the starter roster and an immediate save. If the
    /// stored save is unreadable the roster is still provided but nothing is
    /// written, so the damaged records stay on disk until the next save.
    pub fn start(&mut self, now: i64) -> LoadOutcome {
        let outcome = self.orchestrator.load(&mut self.state, &mut self.store, now);
        match outcome {
            LoadOutcome::Loaded(_) => {}
            LoadOutcome::NoSave => {
                log::info!("No save found, starting a new game");
                self.bootstrap(now);
                self.orchestrator
                    .save_all(&mut self.state, &mut self.store, true, now);
            }
            LoadOutcome::Failed => {
                log::warn!("Save could not be read, continuing with a fresh game");
                self.bootstrap(now);
            }
        }
        outcome
    }

    fn bootstrap(&mut self, now: i64) {
        bootstrap_roster(&mut self.state.production);
        self.state.production.set_last_flush_timestamp(now);
        self.state.production.start(now);
        self.state.refresh_collection();
    }

    /// One manual click.
    pub fn click(&mut self) -> f64 {
        let value = self.state.ledger.click_value();
        if self.state.ledger.handle_manual_action() {
            value
        } else {
            0.0
        }
    }

    pub fn purchase_booster(&mut self, booster_type: &str, now: i64) -> Result<Booster, GameError> {
        self.state
            .loot
            .purchase(booster_type, &mut self.state.ledger, now)
    }

    pub fn open_booster(&mut self, booster_id: &str, now: i64) -> Result<Vec<Card>, GameError> {
        let cards =
            self.state
                .loot
                .open(booster_id, &mut self.state.inventory, &mut self.rng, now)?;
        self.state.refresh_collection();
        Ok(cards)
    }

    pub fn upgrade_generator(&mut self, id: &str, now: i64) -> Result<UpgradeOutcome, GameError> {
        self.state
            .production
            .upgrade(id, &mut self.state.ledger, now)
    }

    /// Sell `quantity` copies, crediting their realized value.
    pub fn dispose_card(&mut self, card_id: u64, quantity: u32) -> Result<u64, GameError> {
        let realized = self.state.inventory.dispose(card_id, quantity)?;
        self.state.ledger.credit(realized as f64);
        self.state.refresh_collection();
        Ok(realized)
    }

    pub fn lock_card(&mut self, card_id: u64) -> Result<(), GameError> {
        self.state.inventory.lock(card_id)?;
        self.state.refresh_collection();
        Ok(())
    }

    pub fn unlock_card(&mut self, card_id: u64) -> Result<(), GameError> {
        self.state.inventory.unlock(card_id)?;
        self.state.refresh_collection();
        Ok(())
    }

    pub fn set_filter(&mut self, filter: CardFilter) {
        let state = &mut self.state;
        state.collection.set_filter(filter, &state.inventory);
    }

    pub fn set_sort(&mut self, sort: CardSort) {
        let state = &mut self.state;
        state.collection.set_sort(sort, &state.inventory);
    }

    pub fn clear_filters(&mut self) {
        let state = &mut self.state;
        state.collection.clear_filters(&state.inventory);
    }

    /// Save unless one happened within the minimum save interval.
    pub fn save_now(&mut self, now: i64) -> bool {
        self.orchestrator
            .save_all(&mut self.state, &mut self.store, false, now)
    }

    pub fn load_now(&mut self, now: i64) -> bool {
        self.orchestrator
            .load_all(&mut self.state, &mut self.store, now)
    }

    /// Drive the clock: run due production ticks, evaluate achievements,
    /// then autosave if due.
    pub fn update(&mut self, now: i64) -> UpdateReport {
        let ticks = self
            .state
            .production
            .advance(&mut self.state.ledger, now);
        let achievements = self.state.check_achievements();
        let saved = self
            .orchestrator
            .maybe_autosave(&mut self.state, &mut self.store, now);
        UpdateReport {
            ticks,
            achievements,
            saved,
        }
    }

    /// Stop production and force a final save.
    pub fn shutdown(&mut self, now: i64) -> bool {
        self.state.production.stop();
        self.orchestrator
            .save_all(&mut self.state, &mut self.store, true, now)
    }

    /// Wipe the store and start over with a fresh state.
    pub fn reset(&mut self, now: i64) -> bool {
        if !self.orchestrator.clear(&mut self.store) {
            return false;
        }
        self.state = GameState::with_bus(self.state.bus.clone(), &self.config);
        self.bootstrap(now);
        self.orchestrator
            .save_all(&mut self.state, &mut self.store, true, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::events::{EventKind, EventRecorder};
    use crate::persistence::MemoryStore;

    fn new_game(balance: f64) -> Game<MemoryStore> {
        let config = GameConfig {
            starting_balance: balance,
            ..Default::default()
        };
        let mut game = Game::with_seed(config, MemoryStore::new(), 7);
        game.start(0);
        game
    }

    #[test]
    fn test_first_start_bootstraps_and_saves() {
        let game = new_game(0.0);
        assert_eq!(game.state().production.generators().len(), 4);
        assert!(game.orchestrator().has_prior_save(game.store()));
    }

    #[test]
    fn test_click_credits_click_value() {
        let mut game = new_game(0.0);
        assert_eq!(game.click(), 1.0);
        assert_eq!(game.state().ledger.balance(), 1.0);
    }

    #[test]
    fn test_open_booster_adds_cards() {
        let mut game = new_game(1_000.0);
        let booster = game.purchase_booster("basic", 1).unwrap();
        let cards = game.open_booster(&booster.id, 2).unwrap();
        assert_eq!(cards.len(), 5);
        assert_eq!(game.state().inventory.total_copies(), 5);
        assert!(!game.state().collection.view().is_empty());
    }

    #[test]
    fn test_dispose_credits_value() {
        let mut game = new_game(1_000.0);
        let booster = game.purchase_booster("basic", 1).unwrap();
        let cards = game.open_booster(&booster.id, 2).unwrap();
        let card = &cards[0];
        let before = game.state().ledger.balance();
        let value = game.state().inventory.get(card.id).unwrap().current_value();

        assert_eq!(game.dispose_card(card.id, 1).unwrap(), value);
        assert_eq!(game.state().ledger.balance(), before + value as f64);
    }

    #[test]
    fn test_locked_card_cannot_be_disposed() {
        let mut game = new_game(1_000.0);
        let booster = game.purchase_booster("basic", 1).unwrap();
        let card_id = game.open_booster(&booster.id, 2).unwrap()[0].id;
        game.lock_card(card_id).unwrap();
        assert_eq!(
            game.dispose_card(card_id, 1),
            Err(GameError::CardLocked(card_id))
        );
        game.unlock_card(card_id).unwrap();
        assert!(game.dispose_card(card_id, 1).is_ok());
    }

    #[test]
    fn test_update_ticks_and_autosaves() {
        let mut game = new_game(1_000.0);
        game.upgrade_generator("auto_clicker", 0).unwrap();
        let recorder = EventRecorder::attach(game.bus());

        let report = game.update(10);
        assert_eq!(report.ticks, 10);
        assert!(!report.saved);

        let report = game.update(30);
        assert_eq!(report.ticks, 20);
        assert!(report.saved);
        assert_eq!(recorder.count(EventKind::SaveCompleted), 1);
    }

    #[test]
    fn test_update_unlocks_achievements() {
        let mut game = new_game(100.0);
        let report = game.update(1);
        assert_eq!(report.achievements, vec![AchievementId::FirstCoins]);
    }

    #[test]
    fn test_shutdown_forces_save() {
        let mut game = new_game(0.0);
        game.click();
        assert!(game.shutdown(1));
        assert!(!game.state().production.is_running());
    }

    #[test]
    fn test_reset_starts_over() {
        let mut game = new_game(1_000.0);
        game.upgrade_generator("auto_clicker", 0).unwrap();
        assert!(game.reset(5));
        assert_eq!(game.state().ledger.balance(), 1_000.0);
        assert!(game
            .state()
            .production
            .generators()
            .iter()
            .all(|g| g.level == 0));
    }
}
