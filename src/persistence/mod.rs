//! Save/load of every subsystem behind a key-value store.

pub mod error;
pub mod orchestrator;
pub mod schema;
pub mod store;

pub use error::PersistenceError;
pub use orchestrator::{LoadOutcome, SaveOrchestrator, SaveSnapshot};
pub use schema::keys;
pub use store::{decode_record, encode_record, FileStore, KeyValueStore, MemoryStore};
