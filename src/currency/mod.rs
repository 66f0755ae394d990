//! Currency ledger and amount formatting.

pub mod format;
pub mod ledger;

pub use format::format_amount;
pub use ledger::{CurrencyLedger, CurrencyRecord};
