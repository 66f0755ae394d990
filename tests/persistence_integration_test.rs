//! Integration test: save/load through the orchestrator
//!
//! Covers the round trip of every subsystem, offline catch-up (clamped and
//! applied exactly once), byte-stable saves, legacy records, and write
//! failures that must not stop the game.

use cardidle::achievements::AchievementId;
use cardidle::core::{EventKind, EventRecorder, Game, GameConfig};
use cardidle::persistence::{keys, FileStore, KeyValueStore, LoadOutcome, MemoryStore, SaveSnapshot};
use std::fs;

const DAY: i64 = 86_400;

fn config(balance: f64) -> GameConfig {
    GameConfig {
        starting_balance: balance,
        ..Default::default()
    }
}

fn played_game(start: i64) -> Game<MemoryStore> {
    let mut game = Game::with_seed(config(5_000.0), MemoryStore::new(), 11);
    game.start(start);
    game.upgrade_generator("card_shop", start).unwrap();
    game.upgrade_generator("auto_clicker", start).unwrap();
    let booster = game.purchase_booster("premium", start).unwrap();
    let cards = game.open_booster(&booster.id, start).unwrap();
    game.lock_card(cards[0].id).unwrap();
    game.purchase_booster("basic", start).unwrap();
    game.update(start);
    game
}

fn reload(store: MemoryStore, now: i64) -> (Game<MemoryStore>, LoadOutcome) {
    let mut game = Game::with_seed(config(0.0), store, 12);
    let outcome = game.start(now);
    (game, outcome)
}

#[test]
fn test_round_trip_restores_every_subsystem() {
    let start = 1_700_000_000;
    let mut game = played_game(start);
    assert!(game.shutdown(start));
    let before = SaveSnapshot::capture(game.state(), start).unwrap();

    let (restored, outcome) = reload(game.into_store(), start);
    assert!(matches!(outcome, LoadOutcome::Loaded(report) if report.is_empty()));

    let after = SaveSnapshot::capture(restored.state(), start).unwrap();
    assert_eq!(before, after);

    let state = restored.state();
    assert_eq!(state.production.generator("card_shop").unwrap().level, 1);
    assert!(state.production.is_running());
    assert_eq!(state.loot.unopened().count(), 1);
    assert_eq!(state.inventory.total_copies(), 10);
    assert!(state.inventory.cards().any(|c| c.locked));
    assert!(state.achievements.is_unlocked(AchievementId::FirstGenerator));
}

#[test]
fn test_offline_gain_is_clamped() {
    let start = 1_700_000_000;
    let mut game = Game::with_seed(config(1_000.0), MemoryStore::new(), 1);
    game.start(start);
    game.upgrade_generator("card_shop", start).unwrap();
    game.shutdown(start);

    let (restored, outcome) = reload(game.into_store(), start + 10 * DAY);
    let LoadOutcome::Loaded(report) = outcome else {
        panic!("expected a load, got {:?}", outcome);
    };

    assert!(report.capped);
    assert_eq!(report.elapsed_seconds, DAY);
    assert_eq!(report.amount, DAY as f64 * 5.0);
    assert_eq!(restored.state().ledger.balance(), 900.0 + DAY as f64 * 5.0);
}

#[test]
fn test_offline_gain_under_cap() {
    let start = 1_700_000_000;
    let mut game = Game::with_seed(config(1_000.0), MemoryStore::new(), 1);
    game.start(start);
    game.upgrade_generator("auto_clicker", start).unwrap();
    game.shutdown(start);

    let (restored, outcome) = reload(game.into_store(), start + 3_600);
    assert!(matches!(outcome, LoadOutcome::Loaded(r) if !r.capped && r.amount == 3_600.0));
    assert_eq!(restored.state().ledger.balance(), 985.0 + 3_600.0);
}

#[test]
fn test_loading_twice_does_not_double_count() {
    let start = 1_700_000_000;
    let mut game = Game::with_seed(config(1_000.0), MemoryStore::new(), 1);
    game.start(start);
    game.upgrade_generator("card_shop", start).unwrap();
    game.shutdown(start);

    let later = start + 1_000;
    let (mut restored, _) = reload(game.into_store(), later);
    let balance = restored.state().ledger.balance();
    assert_eq!(balance, 900.0 + 5_000.0);

    assert!(restored.load_now(later));
    assert_eq!(restored.state().ledger.balance(), balance);
}

#[test]
fn test_forced_saves_are_byte_identical() {
    let start = 1_700_000_000;
    let mut game = played_game(start);
    game.shutdown(start + 10);
    let first: Vec<Option<String>> = keys::RECORDS
        .iter()
        .map(|k| game.store().get(k).unwrap())
        .collect();

    game.shutdown(start + 10);
    let second: Vec<Option<String>> = keys::RECORDS
        .iter()
        .map(|k| game.store().get(k).unwrap())
        .collect();
    assert_eq!(first, second);
}

#[test]
fn test_save_now_is_rate_limited() {
    let start = 1_700_000_000;
    let mut game = Game::with_seed(config(0.0), MemoryStore::new(), 1);
    game.start(start);
    game.click();
    assert!(!game.save_now(start + 1));
    assert!(game.save_now(start + 3));
}

#[test]
fn test_write_failure_keeps_game_running() {
    let start = 1_700_000_000;
    let mut game = Game::with_seed(config(1_000.0), MemoryStore::new(), 1);
    game.start(start);
    game.upgrade_generator("auto_clicker", start).unwrap();
    let recorder = EventRecorder::attach(game.bus());

    game.store_mut().set_reject_writes(true);
    let report = game.update(start + 30);
    assert_eq!(report.ticks, 30);
    assert!(!report.saved);
    assert_eq!(recorder.count(EventKind::SaveError), 1);

    let report = game.update(start + 40);
    assert_eq!(report.ticks, 10);

    game.store_mut().set_reject_writes(false);
    assert!(game.shutdown(start + 41));
    assert_eq!(recorder.count(EventKind::SaveCompleted), 1);
}

#[test]
fn test_corrupt_save_is_left_alone() {
    let mut store = MemoryStore::new();
    store.set(keys::CURRENCY, "{\"version\":1,\"data\":").unwrap();
    store.set(keys::GENERATORS, "{\"version\":7,\"data\":{}}").unwrap();

    let (game, outcome) = reload(store, 100);
    assert_eq!(outcome, LoadOutcome::Failed);
    assert_eq!(game.state().production.generators().len(), 4);
    assert_eq!(
        game.store().get(keys::CURRENCY).unwrap().as_deref(),
        Some("{\"version\":1,\"data\":")
    );
}

#[test]
fn test_partial_booster_record_keeps_other_subsystems() {
    let start = 1_700_000_000;
    let mut game = Game::with_seed(config(1_000.0), MemoryStore::new(), 1);
    game.start(start);
    game.upgrade_generator("auto_clicker", start).unwrap();
    game.shutdown(start);

    let mut store = game.into_store();
    store
        .set(keys::BOOSTERS, r#"{"version":1,"data":{"boosters":[]}}"#)
        .unwrap();

    let (restored, outcome) = reload(store, start);
    assert!(matches!(outcome, LoadOutcome::Loaded(_)));
    assert_eq!(restored.state().ledger.balance(), 985.0);
    assert_eq!(
        restored.state().production.generator("auto_clicker").unwrap().level,
        1
    );
    assert_eq!(restored.state().loot.pity(), Default::default());
}

#[test]
fn test_corrupt_record_is_skipped_and_rewritten() {
    let start = 1_700_000_000;
    let mut game = played_game(start);
    game.shutdown(start);
    let copies = game.state().inventory.total_copies();

    let mut store = game.into_store();
    store.set(keys::BOOSTERS, "not json").unwrap();

    let mut restored = Game::with_seed(config(0.0), store, 12);
    let recorder = EventRecorder::attach(restored.bus());
    assert!(matches!(restored.start(start), LoadOutcome::Loaded(_)));

    assert_eq!(recorder.count(EventKind::LoadError), 1);
    assert_eq!(restored.state().inventory.total_copies(), copies);
    assert_eq!(restored.state().production.generator("card_shop").unwrap().level, 1);
    assert_eq!(restored.state().loot.boosters().len(), 0);

    // The forced save after loading replaces the unreadable value.
    let raw = restored.store().get(keys::BOOSTERS).unwrap().unwrap();
    assert!(raw.starts_with("{\"version\":1,"));
}

#[test]
fn test_legacy_records_load() {
    let mut store = MemoryStore::new();
    store
        .set(keys::CURRENCY, r#"{"currency":750,"baseClickValue":2,"multiplier":1}"#)
        .unwrap();
    store
        .set(
            keys::GENERATORS,
            r#"{"generators":[["auto_clicker",{"id":"auto_clicker","level":2,"baseProduction":1,"baseCost":15,"currentProduction":2}]]}"#,
        )
        .unwrap();

    let (game, outcome) = reload(store, 1_700_000_000);
    // Legacy saves carry no flush time, so nothing is credited.
    assert!(matches!(outcome, LoadOutcome::Loaded(r) if r.is_empty()));
    assert_eq!(game.state().ledger.balance(), 750.0);
    assert_eq!(game.state().ledger.click_value(), 2.0);
    assert_eq!(game.state().production.aggregate_production(), 2.0);

    let raw = game.store().get(keys::GENERATORS).unwrap().unwrap();
    assert!(raw.starts_with("{\"version\":1,"));
}

#[test]
fn test_file_store_round_trip() {
    let dir = std::env::temp_dir().join(format!("cardidle-it-{}", uuid::Uuid::new_v4()));
    let start = 1_700_000_000;
    {
        let store = FileStore::at(&dir).unwrap();
        let mut game = Game::with_seed(config(1_000.0), store, 3);
        game.start(start);
        game.upgrade_generator("card_shop", start).unwrap();
        assert!(game.shutdown(start));
    }

    let store = FileStore::at(&dir).unwrap();
    let mut game = Game::with_seed(config(0.0), store, 3);
    assert!(game.orchestrator().has_prior_save(game.store()));
    assert!(matches!(game.start(start + 10), LoadOutcome::Loaded(_)));
    assert_eq!(game.state().ledger.balance(), 950.0);

    fs::remove_dir_all(dir).unwrap();
}
