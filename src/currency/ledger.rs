//! The single-currency ledger: balance, click value and click multiplier.

use crate::core::constants::{BASE_CLICK_VALUE, BASE_MULTIPLIER, STARTING_BALANCE};
use crate::core::events::{EventBus, GameEvent};
use serde::{Deserialize, Serialize};

/// Persisted shape of the `currency` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurrencyRecord {
    pub balance: f64,
    pub base_click_value: f64,
    pub multiplier: f64,
}

impl Default for CurrencyRecord {
    fn default() -> Self {
        Self {
            balance: 0.0,
            base_click_value: BASE_CLICK_VALUE,
            multiplier: BASE_MULTIPLIER,
        }
    }
}

fn is_positive_amount(amount: f64) -> bool {
    amount.is_finite() && amount > 0.0
}

#[derive(Debug)]
pub struct CurrencyLedger {
    balance: f64,
    base_click_value: f64,
    multiplier: f64,
    bus: EventBus,
}

impl CurrencyLedger {
    pub fn new(bus: EventBus) -> Self {
        Self::with_balance(bus, STARTING_BALANCE, BASE_CLICK_VALUE)
    }

    pub fn with_balance(bus: EventBus, initial_balance: f64, base_click_value: f64) -> Self {
        Self {
            balance: sanitize_balance(initial_balance),
            base_click_value: if is_positive_amount(base_click_value) {
                base_click_value
            } else {
                BASE_CLICK_VALUE
            },
            multiplier: BASE_MULTIPLIER,
            bus,
        }
    }

    pub fn balance(&self) -> f64 {
        self.balance
    }

    pub fn base_click_value(&self) -> f64 {
        self.base_click_value
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    /// Value of one manual action at the current multiplier.
    pub fn click_value(&self) -> f64 {
        self.base_click_value * self.multiplier
    }

    /// Add `amount` to the balance. Rejects non-positive amounts without mutating.
    pub fn credit(&mut self, amount: f64) -> bool {
        if !is_positive_amount(amount) {
            return false;
        }
        let old = self.balance;
        self.balance += amount;
        self.bus.emit(GameEvent::BalanceChanged {
            old,
            new: self.balance,
            delta: amount,
        });
        true
    }

    /// Remove `amount` from the balance. Rejects non-positive amounts and
    /// amounts above the balance; the balance never goes negative.
    pub fn debit(&mut self, amount: f64) -> bool {
        if !is_positive_amount(amount) || amount > self.balance {
            return false;
        }
        let old = self.balance;
        self.balance -= amount;
        self.bus.emit(GameEvent::BalanceChanged {
            old,
            new: self.balance,
            delta: -amount,
        });
        true
    }

    pub fn can_afford(&self, amount: f64) -> bool {
        amount.is_finite() && amount >= 0.0 && amount <= self.balance
    }

    pub fn register_multiplier_bonus(&mut self, value: f64) -> bool {
        if !is_positive_amount(value) {
            return false;
        }
        let old = self.multiplier;
        self.multiplier += value;
        self.bus.emit(GameEvent::MultiplierChanged {
            old,
            new: self.multiplier,
            added: value,
        });
        true
    }

    /// Credit one manual click.
    pub fn handle_manual_action(&mut self) -> bool {
        self.credit(self.click_value())
    }

    pub fn save(&self) -> CurrencyRecord {
        CurrencyRecord {
            balance: self.balance,
            base_click_value: self.base_click_value,
            multiplier: self.multiplier,
        }
    }

    /// Replace ledger state from a record. Out-of-range values are clamped
    /// rather than rejected so a damaged record still loads.
    pub fn load(&mut self, record: &CurrencyRecord) {
        let old = self.balance;
        self.balance = sanitize_balance(record.balance);
        if is_positive_amount(record.base_click_value) {
            self.base_click_value = record.base_click_value;
        }
        self.multiplier = if record.multiplier.is_finite() {
            record.multiplier.max(BASE_MULTIPLIER)
        } else {
            BASE_MULTIPLIER
        };
        self.bus.emit(GameEvent::BalanceChanged {
            old,
            new: self.balance,
            delta: self.balance - old,
        });
    }
}

fn sanitize_balance(balance: f64) -> f64 {
    if balance.is_finite() {
        balance.max(0.0)
    } else {
        0.0
    }
}
