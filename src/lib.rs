//! # lrustore
//!
//! Key/value storage with an O(1) in-memory LRU cache in front of a durable
//! backing store.
//!
//! Writes go to the durable store first and only then into the cache; reads
//! are served from the cache and fall back to the durable store on a miss.
//!
//! ## Modules
//!
//! - [`cache`] - `RecencyIndex`, the LRU engine
//! - [`store`] - `CacheBackedStore`, the durable-store contract and backends
//! - [`cli`] - Command line interface
//! - [`types`] - Configuration and error types
//!
//! ## Example
//!
//! ```
//! use lrustore::cache::RecencyIndex;
//!
//! let mut index = RecencyIndex::new(3);
//! index.insert("a", 1);
//! index.insert("b", 2);
//! index.insert("c", 3);
//! assert_eq!(index.get("b"), Some(&2));
//! assert_eq!(index.insert("d", 4), Some(("a", 1)));
//! assert_eq!(index.to_string(), "\t(d: 4)\n\t(b: 2)\n\t(c: 3)\n");
//! ```

pub mod cache;
#[cfg(feature = "cli")]
pub mod cli;
pub mod store;
pub mod types;

pub use cache::RecencyIndex;
pub use store::{CacheBackedStore, CacheStats, DurableStore, SharedStore};
pub use types::config::Config;
pub use types::errors::{BackendError, LruStoreError, LruStoreResult, StoreError};
