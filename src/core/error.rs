//! Error types for game commands.

use thiserror::Error;

/// Broad classification used by collaborators to pick a presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input from the caller: unknown ids, unknown pack types, zero quantities.
    Validation,
    /// The ledger could not cover the cost. Nothing was debited.
    InsufficientFunds,
    /// The command would break an inventory or booster invariant.
    InvariantViolation,
}

/// Errors returned by game commands. State is untouched whenever one is returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GameError {
    #[error("Invalid booster type: {0}")]
    InvalidBoosterType(String),

    #[error("Unknown generator: {0}")]
    UnknownGenerator(String),

    #[error("Unknown booster: {0}")]
    UnknownBooster(String),

    #[error("Unknown card: {0}")]
    UnknownCard(u64),

    #[error("Quantity must be positive")]
    InvalidQuantity,

    #[error("Not enough currency. Required: {required}, available: {available}")]
    InsufficientFunds { required: f64, available: f64 },

    #[error("Card {0} is locked")]
    CardLocked(u64),

    #[error("Not enough copies of card {card_id}: requested {requested}, owned {owned}")]
    NotEnoughCopies {
        card_id: u64,
        requested: u32,
        owned: u32,
    },

    #[error("Booster {0} has already been opened")]
    AlreadyOpened(String),

    #[error("Booster {0} already holds its cards")]
    CardsAlreadySet(String),

    #[error("Wrong card count for booster: expected {expected}, got {actual}")]
    WrongCardCount { expected: usize, actual: usize },
}

impl GameError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GameError::InvalidBoosterType(_)
            | GameError::UnknownGenerator(_)
            | GameError::UnknownBooster(_)
            | GameError::UnknownCard(_)
            | GameError::InvalidQuantity => ErrorKind::Validation,
            GameError::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            GameError::CardLocked(_)
            | GameError::NotEnoughCopies { .. }
            | GameError::AlreadyOpened(_)
            | GameError::CardsAlreadySet(_)
            | GameError::WrongCardCount { .. } => ErrorKind::InvariantViolation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            GameError::InvalidBoosterType("mega".into()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            GameError::InsufficientFunds {
                required: 100.0,
                available: 5.0
            }
            .kind(),
            ErrorKind::InsufficientFunds
        );
        assert_eq!(
            GameError::AlreadyOpened("abc".into()).kind(),
            ErrorKind::InvariantViolation
        );
    }

    #[test]
    fn test_error_messages() {
        let err = GameError::InsufficientFunds {
            required: 100.0,
            available: 5.0,
        };
        assert_eq!(
            err.to_string(),
            "Not enough currency. Required: 100, available: 5"
        );
        assert_eq!(
            GameError::InvalidBoosterType("mega".into()).to_string(),
            "Invalid booster type: mega"
        );
    }
}
