//! CardIdle Headless Pack Simulator
//!
//! Buys and opens boosters in bulk with a seeded RNG and reports the rarity
//! distribution against the configured odds, plus how long players wait
//! between legendaries under the pity rules.
//!
//! Usage:
//!   cargo run --bin simulator -- [OPTIONS]
//!
//! Options:
//!   --packs N       Packs to open per run (default: 1000)
//!   --type NAME     Booster type: basic, premium, special (default: basic)
//!   --seed N        RNG seed (default: 42)
//!   --runs N        Number of runs with incrementing seeds (default: 1)
//!   --quiet         Only final summary line

use cardidle::booster::{BoosterType, LootEngine};
use cardidle::cards::{Inventory, Rarity};
use cardidle::core::EventBus;
use cardidle::currency::CurrencyLedger;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;

// ── CLI Configuration ────────────────────────────────────────────────

struct SimConfig {
    packs: u64,
    booster_type: BoosterType,
    seed: u64,
    runs: u32,
    quiet: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            packs: 1_000,
            booster_type: BoosterType::Basic,
            seed: 42,
            runs: 1,
            quiet: false,
        }
    }
}

fn fail(message: &str) -> ! {
    eprintln!("{message}");
    print_usage();
    std::process::exit(1);
}

fn number<T: std::str::FromStr>(args: &[String], i: usize, flag: &str) -> T {
    args.get(i)
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| fail(&format!("{flag} requires a number")))
}

fn parse_args() -> SimConfig {
    let args: Vec<String> = std::env::args().collect();
    let mut config = SimConfig::default();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--packs" => {
                i += 1;
                config.packs = number(&args, i, "--packs");
            }
            "--type" => {
                i += 1;
                let name = args.get(i).map(String::as_str).unwrap_or("");
                config.booster_type = BoosterType::parse(name).unwrap_or_else(|e| fail(&e.to_string()));
            }
            "--seed" => {
                i += 1;
                config.seed = number(&args, i, "--seed");
            }
            "--runs" => {
                i += 1;
                config.runs = number(&args, i, "--runs");
            }
            "--quiet" => config.quiet = true,
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other => fail(&format!("Unknown argument: {other}")),
        }
        i += 1;
    }
    config
}

fn print_usage() {
    eprintln!(
        "CardIdle Pack Simulator\n\
         \n\
         Usage: simulator [OPTIONS]\n\
         \n\
         Options:\n\
         \x20 --packs N       Packs to open per run (default: 1000)\n\
         \x20 --type NAME     Booster type: basic, premium, special (default: basic)\n\
         \x20 --seed N        RNG seed (default: 42)\n\
         \x20 --runs N        Number of runs with incrementing seeds (default: 1)\n\
         \x20 --quiet         Only final summary line\n\
         \x20 --help, -h      Show this help"
    );
}

// ── Simulation Statistics ────────────────────────────────────────────

#[derive(Debug, Default, Clone)]
struct SimStats {
    packs: u64,
    draws: u64,
    by_rarity: BTreeMap<Rarity, u64>,
    /// Draws between consecutive legendaries (and from the start to the first).
    legendary_gaps: Vec<u64>,
    unique_cards: usize,
    total_copies: u64,
}

impl SimStats {
    fn share(&self, rarity: Rarity) -> f64 {
        if self.draws == 0 {
            return 0.0;
        }
        self.by_rarity.get(&rarity).copied().unwrap_or(0) as f64 / self.draws as f64
    }

    fn max_legendary_gap(&self) -> u64 {
        self.legendary_gaps.iter().copied().max().unwrap_or(0)
    }

    fn mean_legendary_gap(&self) -> f64 {
        if self.legendary_gaps.is_empty() {
            return 0.0;
        }
        self.legendary_gaps.iter().sum::<u64>() as f64 / self.legendary_gaps.len() as f64
    }
}

fn run_simulation(config: &SimConfig, seed: u64) -> SimStats {
    let bus = EventBus::new();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut loot = LootEngine::new(bus.clone());
    let mut inventory = Inventory::new(bus.clone());
    let cost = loot.config(config.booster_type).cost;
    let mut ledger = CurrencyLedger::with_balance(bus, cost * config.packs as f64, 1.0);

    let mut stats = SimStats::default();
    let mut since_legendary = 0u64;
    for pack in 0..config.packs {
        let now = pack as i64;
        let opened = loot
            .purchase(config.booster_type.name(), &mut ledger, now)
            .and_then(|booster| loot.open(&booster.id, &mut inventory, &mut rng, now));
        let cards = match opened {
            Ok(cards) => cards,
            Err(e) => {
                eprintln!("Stopped after {pack} packs: {e}");
                break;
            }
        };

        stats.packs += 1;
        for card in cards {
            stats.draws += 1;
            since_legendary += 1;
            *stats.by_rarity.entry(card.rarity).or_insert(0) += 1;
            if card.rarity == Rarity::Legendary {
                stats.legendary_gaps.push(since_legendary);
                since_legendary = 0;
            }
        }
    }

    stats.unique_cards = inventory.unique_count();
    stats.total_copies = inventory.total_copies();
    stats
}

fn print_summary(stats: &SimStats, seed: u64, config: &SimConfig) {
    let weights = config.booster_type.config().weights;
    let total_weight = weights.total();
    println!(
        "{} packs of {} (seed={seed}): {} draws",
        stats.packs,
        config.booster_type.name(),
        stats.draws
    );
    println!("  {:<10} {:>8} {:>8} {:>8}", "rarity", "count", "actual", "odds");
    for rarity in Rarity::ALL {
        let odds = if total_weight > 0.0 {
            weights.get(rarity) / total_weight
        } else {
            0.0
        };
        println!(
            "  {:<10} {:>8} {:>7.2}% {:>7.2}%",
            rarity.name(),
            stats.by_rarity.get(&rarity).copied().unwrap_or(0),
            stats.share(rarity) * 100.0,
            odds * 100.0
        );
    }
    println!(
        "  legendary gap: mean {:.1}, max {} draws",
        stats.mean_legendary_gap(),
        stats.max_legendary_gap()
    );
    println!(
        "  collection: {} unique, {} copies",
        stats.unique_cards, stats.total_copies
    );
}

fn main() {
    let config = parse_args();

    if !config.quiet {
        eprintln!(
            "CardIdle Simulator: {} {} packs x {} run(s), seed={}",
            config.packs,
            config.booster_type.name(),
            config.runs,
            config.seed,
        );
    }

    let mut all_stats = Vec::with_capacity(config.runs as usize);
    for run in 0..config.runs {
        let seed = config.seed + run as u64;
        let stats = run_simulation(&config, seed);
        if config.runs == 1 {
            print_summary(&stats, seed, &config);
        } else if !config.quiet {
            println!(
                "  Run {}: legendary={} max_gap={} unique={}",
                run + 1,
                stats.by_rarity.get(&Rarity::Legendary).copied().unwrap_or(0),
                stats.max_legendary_gap(),
                stats.unique_cards
            );
        }
        all_stats.push(stats);
    }

    if config.runs > 1 {
        let runs = all_stats.len().max(1) as f64;
        let legendary_share: f64 =
            all_stats.iter().map(|s| s.share(Rarity::Legendary)).sum::<f64>() / runs;
        let worst_gap = all_stats.iter().map(SimStats::max_legendary_gap).max().unwrap_or(0);
        println!(
            "Summary: {} runs, legendary share {:.2}%, worst gap {} draws",
            all_stats.len(),
            legendary_share * 100.0,
            worst_gap
        );
    }
}
