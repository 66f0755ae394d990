//! Headless driver for the card idle game.
//!
//! Runs the production loop against the on-disk save, and offers a few
//! one-shot commands for inspecting or poking at it.

use cardidle::build_info;
use cardidle::core::{Game, GameConfig};
use cardidle::currency::format_amount;
use cardidle::persistence::{FileStore, LoadOutcome, PersistenceError};
use chrono::Utc;
use std::io;
use std::thread;
use std::time::Duration;

const DEFAULT_RUN_SECONDS: u64 = 60;
const CONFIG_FILE: &str = "config.json";

fn to_io(e: PersistenceError) -> io::Error {
    match e {
        PersistenceError::Io(e) => e,
        other => io::Error::other(other),
    }
}

fn now() -> i64 {
    Utc::now().timestamp()
}

fn print_help() {
    println!("CardIdle - idle clicker card game\n");
    println!("Usage: cardidle [command]\n");
    println!("Commands:");
    println!("  run [SECONDS]     Run production in real time (default: {})", DEFAULT_RUN_SECONDS);
    println!("  status            Show balance, generators and collection");
    println!("  click [N]         Click N times (default: 1)");
    println!("  upgrade ID        Buy one level of a generator");
    println!("  open TYPE         Buy and open a booster (basic, premium, special)");
    println!("  reset             Delete the save and start over");
    println!("  --version         Show version information");
    println!("  --help            Show this help message");
}

fn print_status(game: &Game<FileStore>) {
    let state = game.state();
    let status = state.production.status();
    println!(
        "Balance: {}  (+{}/s, {})",
        format_amount(state.ledger.balance()),
        format_amount(status.total_production),
        if status.running { "running" } else { "idle" }
    );
    println!("Generators:");
    for generator in state.production.generators() {
        println!(
            "  {:<14} L{:<3} {:>8}/s  next {}",
            generator.id,
            generator.level,
            format_amount(generator.current_production),
            format_amount(generator.upgrade_cost())
        );
    }
    let stats = state.inventory.stats();
    println!(
        "Cards: {} unique, {} copies, worth {}",
        stats.unique_cards,
        stats.total_copies,
        format_amount(stats.total_value as f64)
    );
    for (rarity, copies) in &stats.by_rarity {
        println!("  {:<10} {}", rarity.name(), copies);
    }
    println!(
        "Boosters: {} unopened, {} opened",
        state.loot.unopened().count(),
        state.loot.statistics().total_opened
    );
    for entry in state.loot.recent_history().iter().rev() {
        let rarities: Vec<&str> = entry.cards.iter().map(|c| c.rarity.name()).collect();
        println!("  {:<8} {}", entry.booster_type.name(), rarities.join(", "));
    }
    println!(
        "Achievements: {}/{} ({:.0}%)",
        state.achievements.unlocked_count(),
        state.achievements.total_count(),
        state.achievements.unlock_percentage()
    );
}

fn run(game: &mut Game<FileStore>, seconds: u64) {
    let until = now() + seconds as i64;
    loop {
        let current = now();
        let report = game.update(current);
        for id in &report.achievements {
            println!("Achievement: {:?}", id);
        }
        if current >= until {
            break;
        }
        thread::sleep(Duration::from_millis(250));
    }
}

fn main() -> io::Result<()> {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(String::as_str).unwrap_or("run");

    match command {
        "--version" | "-v" => {
            println!(
                "cardidle {} ({})",
                build_info::BUILD_DATE,
                build_info::BUILD_COMMIT
            );
            return Ok(());
        }
        "--help" | "-h" => {
            print_help();
            return Ok(());
        }
        "run" | "status" | "click" | "upgrade" | "open" | "reset" => {}
        other => {
            eprintln!("Unknown command: {}", other);
            eprintln!("Run 'cardidle --help' for usage.");
            std::process::exit(1);
        }
    }

    let store = FileStore::new().map_err(to_io)?;
    let config = GameConfig::load_or_default(&store.dir().join(CONFIG_FILE))?;
    let mut game = Game::new(config, store);

    if let LoadOutcome::Loaded(offline) = game.start(now()) {
        if !offline.is_empty() {
            println!(
                "Welcome back! Earned {} over {}s offline.",
                format_amount(offline.amount),
                offline.elapsed_seconds
            );
        }
    }

    match command {
        "run" => {
            let seconds = match args.get(2) {
                Some(s) => s.parse().unwrap_or(DEFAULT_RUN_SECONDS),
                None => DEFAULT_RUN_SECONDS,
            };
            run(&mut game, seconds);
            print_status(&game);
        }
        "click" => {
            let times: u32 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(1);
            let earned: f64 = (0..times).map(|_| game.click()).sum();
            println!(
                "Earned {}, balance {}",
                format_amount(earned),
                format_amount(game.state().ledger.balance())
            );
        }
        "upgrade" => {
            let Some(id) = args.get(2) else {
                eprintln!("upgrade requires a generator id");
                std::process::exit(1);
            };
            match game.upgrade_generator(id, now()) {
                Ok(outcome) => println!(
                    "{} is now level {} ({}/s), next level costs {}",
                    outcome.id,
                    outcome.level,
                    format_amount(outcome.production),
                    format_amount(outcome.next_cost)
                ),
                Err(e) => eprintln!("{}", e),
            }
        }
        "open" => {
            let booster_type = args.get(2).map(String::as_str).unwrap_or("basic");
            let opened = game
                .purchase_booster(booster_type, now())
                .and_then(|booster| game.open_booster(&booster.id, now()));
            match opened {
                Ok(cards) => {
                    for card in cards {
                        println!(
                            "  [{}] {} (worth {})",
                            card.rarity.name(),
                            card.name,
                            card.current_value()
                        );
                    }
                }
                Err(e) => eprintln!("{}", e),
            }
        }
        "reset" => {
            if game.reset(now()) {
                println!("Save cleared.");
            } else {
                eprintln!("Could not clear the save.");
            }
        }
        _ => print_status(&game),
    }

    game.shutdown(now());
    Ok(())
}
