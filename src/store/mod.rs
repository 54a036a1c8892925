//! Durable storage and the cache-backed facade.
//!
//! ## Components
//!
//! - **DurableStore**: narrow read/write contract every backend satisfies
//! - **CacheBackedStore**: LRU cache in front of a durable store
//!   (cache-aside reads, write-through writes)
//! - **SharedStore**: lock-guarded handle for use from several threads
//! - **Backends**: [`MemoryStore`], [`JsonFileStore`], `SqliteStore`

mod backed;
mod json_file;
mod memory;
mod shared;
#[cfg(feature = "sqlite")]
mod sqlite;

pub use backed::{CacheBackedStore, CacheStats};
pub use json_file::JsonFileStore;
pub use memory::MemoryStore;
pub use shared::SharedStore;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;

use serde_json::Value;

use crate::types::config::{Config, StoreBackend, StoreConfig};
use crate::types::errors::BackendError;
use crate::LruStoreResult;

/// The system of record behind a [`CacheBackedStore`].
///
/// `read` is total: an absent key is `Ok(None)`, and `Err` means the store
/// itself could not be reached or decoded. `write` upserts a single key and
/// must only return `Ok` once the value is visible to later reads.
pub trait DurableStore<K, V> {
    /// Looks up `key`.
    fn read(&self, key: &K) -> Result<Option<V>, BackendError>;

    /// Stores `value` under `key`, replacing any previous value.
    fn write(&mut self, key: &K, value: &V) -> Result<(), BackendError>;
}

impl<K, V, S> DurableStore<K, V> for Box<S>
where
    S: DurableStore<K, V> + ?Sized,
{
    fn read(&self, key: &K) -> Result<Option<V>, BackendError> {
        (**self).read(key)
    }

    fn write(&mut self, key: &K, value: &V) -> Result<(), BackendError> {
        (**self).write(key, value)
    }
}

/// Backend selected at runtime from configuration.
pub type DynStore = Box<dyn DurableStore<String, Value> + Send>;

/// Opens the backend described by `config`.
pub fn open_backend(config: &StoreConfig) -> LruStoreResult<DynStore> {
    let store: DynStore = match config.backend {
        StoreBackend::Memory => Box::new(MemoryStore::<String, Value>::new()),
        StoreBackend::Json => Box::new(JsonFileStore::<Value>::open(&config.path)?),
        #[cfg(feature = "sqlite")]
        StoreBackend::Sqlite => Box::new(SqliteStore::<Value>::open(&config.path)?),
        #[cfg(not(feature = "sqlite"))]
        StoreBackend::Sqlite => {
            return Err(crate::LruStoreError::config(
                "sqlite backend requested but lrustore was built without the `sqlite` feature",
            ))
        }
    };

    tracing::debug!(
        backend = ?config.backend,
        path = %config.path.display(),
        "durable store opened"
    );

    Ok(store)
}

/// Builds a cache-backed store of JSON values from a full configuration.
pub fn open(config: &Config) -> LruStoreResult<CacheBackedStore<String, Value, DynStore>> {
    config.validate()?;
    let backend = open_backend(&config.store)?;
    CacheBackedStore::from_config(&config.cache, backend)
}
