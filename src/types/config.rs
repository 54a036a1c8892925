//! Configuration for lrustore.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{LruStoreError, LruStoreResult};

/// Main configuration for lrustore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Cache settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Durable store settings.
    #[serde(default)]
    pub store: StoreConfig,
}

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log format (text, json).
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

/// What a cache miss that hits the durable store does to the cache.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReadPolicy {
    /// Serve the durable value without caching it.
    #[default]
    CacheAside,
    /// Serve the durable value and insert it into the cache.
    ReadThrough,
}

/// LRU cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of cached entries. Signed so that a negative value in
    /// the file is reported as a capacity error instead of a parse error.
    #[serde(default = "default_cache_capacity")]
    pub capacity: i64,

    /// Behaviour on a durable-store hit.
    #[serde(default)]
    pub read_policy: ReadPolicy,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: default_cache_capacity(),
            read_policy: ReadPolicy::default(),
        }
    }
}

fn default_cache_capacity() -> i64 {
    1000
}

/// Available durable store backends.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    /// Process-local map, lost on exit.
    Memory,
    /// Single JSON document rewritten on every write.
    Json,
    /// SQLite database.
    Sqlite,
}

/// Durable store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Backend to use.
    #[serde(default = "default_backend")]
    pub backend: StoreBackend,

    /// Path of the JSON document or SQLite database.
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            path: default_store_path(),
        }
    }
}

fn default_backend() -> StoreBackend {
    StoreBackend::Json
}

fn default_store_path() -> PathBuf {
    PathBuf::from(".lrustore/data.json")
}

impl Config {
    /// Loads configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> LruStoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Saves configuration to a TOML file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> LruStoreResult<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Creates default configuration.
    pub fn default_config() -> Self {
        Self {
            general: GeneralConfig::default(),
            cache: CacheConfig::default(),
            store: StoreConfig::default(),
        }
    }

    /// Checks values serde cannot check on its own.
    pub fn validate(&self) -> LruStoreResult<()> {
        if self.cache.capacity < 0 {
            return Err(LruStoreError::InvalidCapacity(self.cache.capacity));
        }

        match self.general.log_format.as_str() {
            "text" | "json" => {}
            other => {
                return Err(LruStoreError::config(format!(
                    "unknown log_format '{}' (expected text or json)",
                    other
                )))
            }
        }

        if self.store.backend != StoreBackend::Memory && self.store.path.as_os_str().is_empty() {
            return Err(LruStoreError::config("store.path must not be empty"));
        }

        Ok(())
    }

    /// Makes a relative `store.path` relative to `base` (usually the
    /// directory holding the configuration file).
    pub fn resolve_relative_to(&mut self, base: &Path) {
        if self.store.path.is_relative() {
            self.store.path = base.join(&self.store.path);
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}
