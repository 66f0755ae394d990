use std::io;
use thiserror::Error;

/// Failures at the storage boundary. The orchestrator catches these, logs
/// them and turns them into save/load events; none are fatal.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Record '{key}' has an invalid header")]
    InvalidHeader { key: String },

    #[error("Record '{key}' failed checksum verification")]
    ChecksumMismatch { key: String },

    #[error("Record '{key}' has unsupported schema version {version}")]
    UnsupportedVersion { key: String, version: u64 },

    #[error("Record '{key}' could not be migrated: {reason}")]
    Migration { key: String, reason: String },

    #[error("Could not determine a data directory")]
    NoDataDir,

    #[error("Store rejected write to '{key}'")]
    WriteRejected { key: String },
}
