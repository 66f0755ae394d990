//! Tick-driven generator economy.
//!
//! The engine is either Stopped or Running. It runs only while the aggregate
//! production is positive; upgrading the first generator starts it, and the
//! persistence layer stops it around offline reconciliation.

use super::types::{Generator, GeneratorsRecord, ProductionStatus, UpgradeOutcome};
use crate::core::constants::{MAX_TICKS_PER_ADVANCE, TICK_INTERVAL_SECONDS};
use crate::core::error::GameError;
use crate::core::events::{EventBus, GameEvent};
use crate::currency::CurrencyLedger;

#[derive(Debug)]
pub struct ProductionEngine {
    generators: Vec<Generator>,
    total_production: f64,
    running: bool,
    tick_interval: i64,
    last_tick: i64,
    last_flush_timestamp: i64,
    bus: EventBus,
}

impl ProductionEngine {
    pub fn new(bus: EventBus) -> Self {
        Self::with_tick_interval(bus, TICK_INTERVAL_SECONDS)
    }

    pub fn with_tick_interval(bus: EventBus, tick_interval: i64) -> Self {
        Self {
            generators: Vec::new(),
            total_production: 0.0,
            running: false,
            tick_interval: tick_interval.max(1),
            last_tick: 0,
            last_flush_timestamp: 0,
            bus,
        }
    }

    pub(crate) fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn generators(&self) -> &[Generator] {
        &self.generators
    }

    pub fn generator(&self, id: &str) -> Option<&Generator> {
        self.generators.iter().find(|g| g.id == id)
    }

    pub fn has_generators(&self) -> bool {
        !self.generators.is_empty()
    }

    /// Income per second across all generators.
    pub fn aggregate_production(&self) -> f64 {
        self.total_production
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn upgrade_cost(&self, id: &str) -> Option<f64> {
        self.generator(id).map(Generator::upgrade_cost)
    }

    pub fn last_flush_timestamp(&self) -> i64 {
        self.last_flush_timestamp
    }

    pub fn set_last_flush_timestamp(&mut self, timestamp: i64) {
        self.last_flush_timestamp = timestamp;
    }

    pub fn status(&self) -> ProductionStatus {
        ProductionStatus {
            total_production: self.total_production,
            running: self.running,
            last_tick: self.last_tick,
        }
    }

    /// Register a level-0 generator. Returns false if the id is taken.
    pub fn add_generator(
        &mut self,
        id: &str,
        base_production: f64,
        base_cost: f64,
        description: &str,
    ) -> bool {
        if self.generator(id).is_some() {
            return false;
        }
        let generator = Generator::new(id, base_production, base_cost, description);
        self.generators.push(generator.clone());
        self.bus.emit(GameEvent::GeneratorAdded { generator });
        true
    }

    /// Buy one level of `id`, paying from the ledger.
    pub fn upgrade(
        &mut self,
        id: &str,
        ledger: &mut CurrencyLedger,
        now: i64,
    ) -> Result<UpgradeOutcome, GameError> {
        let generator = self
            .generators
            .iter_mut()
            .find(|g| g.id == id)
            .ok_or_else(|| GameError::UnknownGenerator(id.to_string()))?;

        let cost = generator.upgrade_cost();
        if !ledger.debit(cost) {
            return Err(GameError::InsufficientFunds {
                required: cost,
                available: ledger.balance(),
            });
        }

        generator.level += 1;
        generator.last_purchase_cost = cost;
        generator.recompute_production();
        let outcome = UpgradeOutcome {
            id: generator.id.clone(),
            level: generator.level,
            cost,
            production: generator.current_production,
            next_cost: generator.upgrade_cost(),
        };
        self.recompute_total();

        log::debug!(
            "Upgraded {} to level {} for {}",
            outcome.id,
            outcome.level,
            outcome.cost
        );
        self.bus.emit(GameEvent::GeneratorUpgraded {
            id: outcome.id.clone(),
            level: outcome.level,
            cost: outcome.cost,
            production: outcome.production,
        });

        if !self.running && self.total_production > 0.0 {
            self.start(now);
        } else {
            self.publish_status();
        }
        Ok(outcome)
    }

    /// Enter Running if there is anything to produce. Returns the new state.
    pub fn start(&mut self, now: i64) -> bool {
        if self.total_production <= 0.0 {
            return false;
        }
        if !self.running {
            self.running = true;
            self.last_tick = now;
            self.publish_status();
        }
        true
    }

    pub fn stop(&mut self) {
        if self.running {
            self.running = false;
            self.publish_status();
        }
    }

    /// One scheduler period: credit the aggregate production for one
    /// interval. Returns the amount credited.
    pub fn tick(&mut self, ledger: &mut CurrencyLedger, now: i64) -> f64 {
        if !self.running || self.total_production <= 0.0 {
            return 0.0;
        }
        let amount = self.total_production * self.tick_interval as f64;
        ledger.credit(amount);
        self.last_tick = now;
        self.bus.emit(GameEvent::Tick {
            amount,
            generators: self.generators.clone(),
            timestamp: now,
        });
        amount
    }

    /// Run every whole period elapsed since the last tick. A long stall is
    /// truncated to `MAX_TICKS_PER_ADVANCE` periods and the remainder
    /// dropped. Returns the number of ticks run.
    pub fn advance(&mut self, ledger: &mut CurrencyLedger, now: i64) -> u32 {
        if !self.running {
            return 0;
        }
        let elapsed = now - self.last_tick;
        if elapsed < self.tick_interval {
            return 0;
        }

        let due = elapsed / self.tick_interval;
        let ticks = due.min(MAX_TICKS_PER_ADVANCE as i64) as u32;
        if due > ticks as i64 {
            log::warn!("Scheduler stalled for {}s, dropping {} ticks", elapsed, due - ticks as i64);
            self.last_tick = now - ticks as i64 * self.tick_interval;
        }
        for _ in 0..ticks {
            let at = self.last_tick + self.tick_interval;
            self.tick(ledger, at);
        }
        ticks
    }

    pub fn save(&self) -> GeneratorsRecord {
        GeneratorsRecord {
            generators: self.generators.clone(),
            last_flush_timestamp: self.last_flush_timestamp,
        }
    }

    /// Replace the roster from a record. Derived production is recomputed
    /// rather than trusted. Does not start the scheduler.
    pub fn load(&mut self, record: &GeneratorsRecord) {
        self.generators = record
            .generators
            .iter()
            .cloned()
            .map(|mut g| {
                g.recompute_production();
                g
            })
            .collect();
        self.last_flush_timestamp = record.last_flush_timestamp;
        self.recompute_total();
        self.publish_status();
    }

    fn recompute_total(&mut self) {
        self.total_production = self.generators.iter().map(|g| g.current_production).sum();
    }

    fn publish_status(&self) {
        self.bus.emit(GameEvent::ProductionUpdated {
            total: self.total_production,
            running: self.running,
        });
    }
}
