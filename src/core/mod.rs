//! Core game state, configuration, and the event bus.

pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod game;
pub mod game_state;

pub use config::GameConfig;
pub use error::{ErrorKind, GameError};
pub use events::{EventBus, EventKind, EventRecorder, GameEvent, Subscription};
pub use game::{Game, UpdateReport};
pub use game_state::GameState;
