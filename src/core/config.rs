//! Runtime tuning knobs.
//!
//! Every field defaults to the matching constant in [`super::constants`], so a
//! partial JSON config only overrides what it names.

use super::constants::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub starting_balance: f64,
    pub base_click_value: f64,
    pub tick_interval_seconds: i64,
    pub autosave_interval_seconds: i64,
    pub min_save_interval_seconds: i64,
    pub max_offline_seconds: i64,
    /// RNG seed for loot draws. `None` seeds from OS entropy.
    pub rng_seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            starting_balance: STARTING_BALANCE,
            base_click_value: BASE_CLICK_VALUE,
            tick_interval_seconds: TICK_INTERVAL_SECONDS,
            autosave_interval_seconds: AUTOSAVE_INTERVAL_SECONDS,
            min_save_interval_seconds: MIN_SAVE_INTERVAL_SECONDS,
            max_offline_seconds: MAX_OFFLINE_SECONDS,
            rng_seed: None,
        }
    }
}

impl GameConfig {
    /// Autosave period clamped to the supported 3-60 second window.
    pub fn autosave_interval(&self) -> i64 {
        self.autosave_interval_seconds
            .clamp(MIN_AUTOSAVE_INTERVAL_SECONDS, MAX_AUTOSAVE_INTERVAL_SECONDS)
    }

    pub fn tick_interval(&self) -> i64 {
        self.tick_interval_seconds.max(1)
    }

    pub fn min_save_interval(&self) -> i64 {
        self.min_save_interval_seconds.max(0)
    }

    pub fn max_offline(&self) -> i64 {
        self.max_offline_seconds.max(0)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Load a config file, falling back to defaults when it is missing.
    pub fn load_or_default(path: &Path) -> io::Result<Self> {
        match fs::read_to_string(path) {
            Ok(json) => {
                Self::from_json(&json).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e),
        }
    }
}
