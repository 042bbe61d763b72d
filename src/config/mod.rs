//! Runtime configuration.
//!
//! Loaded from `~/.chatview/config.json`. Every field has a default, so a
//! missing file or a partial one is fine. `CHATVIEW_CACHE_MODE` overrides
//! the file's `cache.mode`.

pub mod watcher;

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cache::CacheMode;
use crate::error::{ChatViewError, Result};

/// Environment variable overriding `cache.mode`.
pub const CACHE_MODE_ENV: &str = "CHATVIEW_CACHE_MODE";

const DEFAULT_POLL_INTERVAL_MS: u64 = 2_000;

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub cache: CacheConfig,
}

/// Display cache settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Lookup strategy. `direct` disables memoization entirely.
    pub mode: CacheMode,
    /// How often the config watcher checks the file for changes.
    pub poll_interval_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            mode: CacheMode::Cached,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl CacheConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Config {
    /// Default config file location.
    pub fn path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".chatview")
            .join("config.json")
    }

    /// Load from the default location, applying environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from_path(&Self::path())?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load a config file. A missing file yields the defaults.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let config: Config = match std::fs::read_to_string(path) {
            Ok(data) => serde_json::from_str(&data)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No config file, using defaults");
                Config::default()
            }
            Err(e) => return Err(e.into()),
        };
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from `lookup` (normally the process environment).
    ///
    /// Unrecognized values are logged and ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(raw) = lookup(CACHE_MODE_ENV) {
            match CacheMode::parse(&raw) {
                Some(mode) => self.cache.mode = mode,
                None => warn!(
                    var = CACHE_MODE_ENV,
                    value = %raw,
                    "Ignoring unrecognized cache mode override"
                ),
            }
        }
    }

    fn validate(&self) -> Result<()> {
        if self.cache.poll_interval_ms == 0 {
            return Err(ChatViewError::Config(
                "cache.poll_interval_ms must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}
