//! Implementation of the lrustore CLI commands.

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::store::{self, CacheBackedStore, MemoryStore};
use crate::types::config::Config;
use crate::{LruStoreError, LruStoreResult};

/// Initializes configuration in the specified directory.
pub fn init(path: Option<PathBuf>) -> LruStoreResult<()> {
    let target_dir = path.unwrap_or_else(|| PathBuf::from("."));

    // Create directory if it doesn't exist
    if !target_dir.exists() {
        std::fs::create_dir_all(&target_dir)?;
        tracing::info!("Directory created: {}", target_dir.display());
    }

    let config_path = target_dir.join("lrustore.toml");

    if config_path.exists() {
        println!("Configuration already exists at: {}", config_path.display());
        return Ok(());
    }

    let data_dir = target_dir.join(".lrustore");
    if !data_dir.exists() {
        std::fs::create_dir_all(&data_dir)?;
        tracing::info!(".lrustore/ directory created");
    }

    update_gitignore(&target_dir)?;

    let config = Config::default_config();
    config.save(&config_path)?;

    println!("lrustore initialized.");
    println!("Configuration created at: {}", config_path.display());
    println!("Data directory: .lrustore/");

    Ok(())
}

/// Adds `.lrustore/` to the directory's .gitignore, creating it if needed.
fn update_gitignore(target_dir: &Path) -> LruStoreResult<()> {
    let gitignore_path = target_dir.join(".gitignore");
    let entry = ".lrustore/";
    let comment = "# lrustore - local data";

    if gitignore_path.exists() {
        let content = std::fs::read_to_string(&gitignore_path)?;

        if content
            .lines()
            .any(|line| line.trim() == entry || line.trim() == ".lrustore")
        {
            tracing::debug!(".gitignore already contains .lrustore/");
            return Ok(());
        }

        let mut new_content = content.trim_end().to_string();
        if !new_content.is_empty() {
            new_content.push_str("\n\n");
        }
        new_content.push_str(comment);
        new_content.push('\n');
        new_content.push_str(entry);
        new_content.push('\n');

        std::fs::write(&gitignore_path, new_content)?;
    } else {
        std::fs::write(&gitignore_path, format!("{}\n{}\n", comment, entry))?;
    }

    Ok(())
}

/// Parses a CLI value as JSON, keeping it as a plain string otherwise.
pub fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Stores `value` under `key` in the configured store.
pub fn put(key: &str, value: &str, config: &Config) -> LruStoreResult<()> {
    let mut store = store::open(config)?;
    store.insert(key.to_string(), parse_value(value))?;

    tracing::info!(key = %key, backend = ?config.store.backend, "value stored");
    println!("stored {}", key);
    Ok(())
}

/// Prints the value stored under `key`.
pub fn get(key: &str, config: &Config) -> LruStoreResult<()> {
    let mut store = store::open(config)?;

    match store.get(&key.to_string())? {
        Some(value) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(())
        }
        None => Err(LruStoreError::other(format!("key '{}' not found", key))),
    }
}

/// Replays insert a, b, c / get b / insert d / get c and prints the cache
/// after every step.
pub fn demo(capacity: usize) -> LruStoreResult<()> {
    let mut store = CacheBackedStore::new(capacity, MemoryStore::<String, i64>::new());

    for (key, value) in [("a", 1), ("b", 2), ("c", 3)] {
        store.insert(key.to_string(), value)?;
    }
    println!("Cache after initial insertion:");
    print!("{}", store.cache());

    store.get(&"b".to_string())?;
    println!("Cache after get(b):");
    print!("{}", store.cache());

    let evicted = store.cache().peek_lru().map(|(k, v)| (k.clone(), *v));
    store.insert("d".to_string(), 4)?;
    println!("Cache after insert(d):");
    print!("{}", store.cache());
    if let Some((key, value)) = evicted.filter(|(k, _)| !store.cache().contains(k)) {
        println!("Evicted: ({}, {})", key, value);
    }

    store.get(&"c".to_string())?;
    println!("Cache after get(c):");
    print!("{}", store.cache());

    if let Some(value) = store.get(&"a".to_string())? {
        println!("get(a) served from durable store: {}", value);
    }

    let stats = store.stats();
    println!(
        "hits={} misses={} durable_hits={} evictions={}",
        stats.hits, stats.misses, stats.durable_hits, stats.evictions
    );

    Ok(())
}

/// Shows the version.
pub fn version() {
    println!("lrustore {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Key/value store with an LRU cache in front of durable storage");
}
