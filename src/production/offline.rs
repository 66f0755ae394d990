//! Offline catch-up.
//!
//! Credits production for the time between the last flush and now as one
//! lump sum. Planning is separated from applying so the persistence layer
//! can compute the report from the stored generator record before any
//! subsystem is rehydrated.

use super::logic::ProductionEngine;
use super::types::GeneratorsRecord;
use crate::core::events::{EventBus, GameEvent};
use crate::currency::CurrencyLedger;
use serde::{Deserialize, Serialize};

/// Report of offline progression results
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OfflineReport {
    /// Credited seconds, after clamping.
    pub elapsed_seconds: i64,
    pub amount: f64,
    pub production_rate: f64,
    /// True if the real gap exceeded the offline cap.
    pub capped: bool,
}

impl OfflineReport {
    pub fn is_empty(&self) -> bool {
        self.amount <= 0.0
    }
}

/// Aggregate production a stored roster would yield.
pub fn record_production(record: &GeneratorsRecord) -> f64 {
    record
        .generators
        .iter()
        .map(|g| g.base_production * g.level as f64)
        .sum()
}

/// Compute the catch-up for `now − last_flush` seconds at `production_rate`.
///
/// Negative elapsed time (clock skew) yields an empty report.
pub fn plan_offline(
    production_rate: f64,
    last_flush: i64,
    now: i64,
    max_offline_seconds: i64,
) -> OfflineReport {
    let elapsed_seconds = now - last_flush;
    if elapsed_seconds <= 0 {
        return OfflineReport::default();
    }

    let capped = elapsed_seconds > max_offline_seconds;
    let credited = elapsed_seconds.min(max_offline_seconds);
    let amount = if production_rate > 0.0 {
        credited as f64 * production_rate
    } else {
        0.0
    };

    OfflineReport {
        elapsed_seconds: credited,
        amount,
        production_rate,
        capped,
    }
}

/// Credit a planned report. Returns whether anything was paid.
pub fn apply_offline(report: &OfflineReport, ledger: &mut CurrencyLedger, bus: &EventBus) -> bool {
    if report.elapsed_seconds <= 0 || report.is_empty() {
        return false;
    }
    if !ledger.credit(report.amount) {
        return false;
    }
    log::info!(
        "Offline progress: {}s at {}/s = {}",
        report.elapsed_seconds,
        report.production_rate,
        report.amount
    );
    bus.emit(GameEvent::OfflineProgress {
        elapsed_seconds: report.elapsed_seconds,
        amount: report.amount,
    });
    true
}

/// Plan and apply against a live engine, then move its flush timestamp to
/// `now` so the same gap is never paid twice.
pub fn reconcile_offline(
    engine: &mut ProductionEngine,
    ledger: &mut CurrencyLedger,
    now: i64,
    max_offline_seconds: i64,
) -> OfflineReport {
    let report = plan_offline(
        engine.aggregate_production(),
        engine.last_flush_timestamp(),
        now,
        max_offline_seconds,
    );
    apply_offline(&report, ledger, engine.bus());
    engine.set_last_flush_timestamp(now);
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::constants::MAX_OFFLINE_SECONDS;
    use crate::core::events::{EventKind, EventRecorder};

    fn producing_engine(bus: &EventBus, ledger: &mut CurrencyLedger, last_flush: i64) -> ProductionEngine {
        let mut engine = ProductionEngine::new(bus.clone());
        engine.add_generator("auto_clicker", 5.0, 10.0, "");
        ledger.credit(10.0);
        engine.upgrade("auto_clicker", ledger, last_flush).unwrap();
        engine.stop();
        engine.set_last_flush_timestamp(last_flush);
        engine
    }

    #[test]
    fn test_plan_offline_basic() {
        let report = plan_offline(2.0, 1000, 1060, MAX_OFFLINE_SECONDS);
        assert_eq!(report.elapsed_seconds, 60);
        assert_eq!(report.amount, 120.0);
        assert!(!report.capped);
    }

    #[test]
    fn test_plan_offline_capped_at_max() {
        let two_days = 2 * MAX_OFFLINE_SECONDS;
        let report = plan_offline(1.0, 0, two_days, MAX_OFFLINE_SECONDS);

        assert_eq!(report.elapsed_seconds, MAX_OFFLINE_SECONDS);
        assert_eq!(report.amount, MAX_OFFLINE_SECONDS as f64);
        assert!(report.capped);
    }

    #[test]
    fn test_plan_offline_negative_elapsed_returns_default() {
        let report = plan_offline(3.0, 5000, 1000, MAX_OFFLINE_SECONDS);
        assert_eq!(report, OfflineReport::default());
        assert_eq!(report.elapsed_seconds, 0);
    }

    #[test]
    fn test_plan_offline_without_production_pays_nothing() {
        let report = plan_offline(0.0, 0, 3600, MAX_OFFLINE_SECONDS);
        assert_eq!(report.elapsed_seconds, 3600);
        assert!(report.is_empty());
    }

    #[test]
    fn test_reconcile_credits_and_emits() {
        let bus = EventBus::new();
        let mut ledger = CurrencyLedger::new(bus.clone());
        let now = chrono::Utc::now().timestamp();
        let mut engine = producing_engine(&bus, &mut ledger, now - 7200);
        let recorder = EventRecorder::attach(&bus);

        let report = reconcile_offline(&mut engine, &mut ledger, now, MAX_OFFLINE_SECONDS);

        assert_eq!(report.elapsed_seconds, 7200);
        assert_eq!(ledger.balance(), 36_000.0);
        assert_eq!(engine.last_flush_timestamp(), now);
        assert!(recorder.events().contains(&GameEvent::OfflineProgress {
            elapsed_seconds: 7200,
            amount: 36_000.0
        }));
    }

    #[test]
    fn test_reconcile_twice_does_not_double_count() {
        let bus = EventBus::new();
        let mut ledger = CurrencyLedger::new(bus.clone());
        let now = chrono::Utc::now().timestamp();
        let mut engine = producing_engine(&bus, &mut ledger, now - 3600);
        let recorder = EventRecorder::attach(&bus);

        let first = reconcile_offline(&mut engine, &mut ledger, now, MAX_OFFLINE_SECONDS);
        let balance_after_first = ledger.balance();
        let second = reconcile_offline(&mut engine, &mut ledger, now, MAX_OFFLINE_SECONDS);

        assert!(first.amount > 0.0);
        assert!(second.is_empty());
        assert_eq!(ledger.balance(), balance_after_first);
        assert_eq!(recorder.count(EventKind::OfflineProgress), 1);
    }

    #[test]
    fn test_reconcile_clock_skew_pays_nothing() {
        let bus = EventBus::new();
        let mut ledger = CurrencyLedger::new(bus.clone());
        let now = chrono::Utc::now().timestamp();
        let mut engine = producing_engine(&bus, &mut ledger, now + 3600);

        let report = reconcile_offline(&mut engine, &mut ledger, now, MAX_OFFLINE_SECONDS);

        assert_eq!(report.elapsed_seconds, 0);
        assert_eq!(ledger.balance(), 0.0);
        assert_eq!(engine.last_flush_timestamp(), now);
    }

    #[test]
    fn test_record_production() {
        let mut engine = ProductionEngine::new(EventBus::new());
        let mut ledger = CurrencyLedger::with_balance(EventBus::new(), 1000.0, 1.0);
        engine.add_generator("a", 2.0, 10.0, "");
        engine.add_generator("b", 3.0, 10.0, "");
        engine.upgrade("a", &mut ledger, 0).unwrap();
        engine.upgrade("a", &mut ledger, 0).unwrap();
        assert_eq!(record_production(&engine.save()), 4.0);
    }
}
