//! Key-value backends for save records.
//!
//! [`FileStore`] writes one file per key with a checksummed envelope:
//! - Record magic (8 bytes)
//! - Payload length (4 bytes)
//! - Payload (UTF-8 JSON, variable length)
//! - SHA256 checksum over magic + length + payload (32 bytes)

use super::error::PersistenceError;
use crate::core::constants::RECORD_MAGIC;
use directories::ProjectDirs;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

const RECORD_EXTENSION: &str = "dat";

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistenceError>;

    fn remove(&mut self, key: &str) -> Result<(), PersistenceError>;

    /// Stored keys in ascending order.
    fn keys(&self) -> Result<Vec<String>, PersistenceError>;

    fn contains(&self, key: &str) -> Result<bool, PersistenceError> {
        Ok(self.get(key)?.is_some())
    }
}

/// In-process store. Can be told to reject writes to exercise failure paths.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: BTreeMap<String, String>,
    reject_writes: bool,
    write_count: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_reject_writes(&mut self, reject: bool) {
        self.reject_writes = reject;
    }

    /// Successful `set` calls so far.
    pub fn write_count(&self) -> usize {
        self.write_count
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.records.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
        if self.reject_writes {
            return Err(PersistenceError::WriteRejected {
                key: key.to_string(),
            });
        }
        self.records.insert(key.to_string(), value.to_string());
        self.write_count += 1;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), PersistenceError> {
        if self.reject_writes {
            return Err(PersistenceError::WriteRejected {
                key: key.to_string(),
            });
        }
        self.records.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, PersistenceError> {
        Ok(self.records.keys().cloned().collect())
    }
}

/// One checksummed file per key under a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Store under the platform data directory, e.g.
    /// `~/.local/share/cardidle` on Linux.
    pub fn new() -> Result<Self, PersistenceError> {
        let project_dirs =
            ProjectDirs::from("", "", "cardidle").ok_or(PersistenceError::NoDataDir)?;
        Self::at(project_dirs.data_dir())
    }

    pub fn at(dir: &Path) -> Result<Self, PersistenceError> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", key, RECORD_EXTENSION))
    }
}

fn checksum(len_bytes: &[u8; 4], payload: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(RECORD_MAGIC.to_le_bytes());
    hasher.update(len_bytes);
    hasher.update(payload);
    let mut out = [0u8; 32];
    out.copy_from_slice(&hasher.finalize());
    out
}

/// Wrap a payload in the record envelope.
pub fn encode_record(payload: &str) -> Vec<u8> {
    let data = payload.as_bytes();
    let len_bytes = (data.len() as u32).to_le_bytes();
    let mut out = Vec::with_capacity(8 + 4 + data.len() + 32);
    out.extend_from_slice(&RECORD_MAGIC.to_le_bytes());
    out.extend_from_slice(&len_bytes);
    out.extend_from_slice(data);
    out.extend_from_slice(&checksum(&len_bytes, data));
    out
}

/// Verify and unwrap a record envelope.
pub fn decode_record(key: &str, bytes: &[u8]) -> Result<String, PersistenceError> {
    let invalid = || PersistenceError::InvalidHeader {
        key: key.to_string(),
    };
    if bytes.len() < 8 + 4 + 32 {
        return Err(invalid());
    }

    let (magic, rest) = bytes.split_at(8);
    let magic = u64::from_le_bytes(magic.try_into().map_err(|_| invalid())?);
    if magic != RECORD_MAGIC {
        return Err(invalid());
    }

    let (len_bytes, rest) = rest.split_at(4);
    let len_bytes: [u8; 4] = len_bytes.try_into().map_err(|_| invalid())?;
    let len = u32::from_le_bytes(len_bytes) as usize;
    if rest.len() != len + 32 {
        return Err(invalid());
    }

    let (payload, stored_checksum) = rest.split_at(len);
    if checksum(&len_bytes, payload).as_slice() != stored_checksum {
        return Err(PersistenceError::ChecksumMismatch {
            key: key.to_string(),
        });
    }

    String::from_utf8(payload.to_vec()).map_err(|_| invalid())
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&path)?;
        decode_record(key, &bytes).map(Some)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
        let path = self.path_for(key);
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, encode_record(value))?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), PersistenceError> {
        let path = self.path_for(key);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, PersistenceError> {
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(RECORD_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                keys.push(stem.to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }
}
