//! Write-through, cache-aside facade over a durable store.
//!
//! Writes reach the durable store before the cache, so the cache never holds
//! a value the store did not acknowledge. Reads try the cache first and fall
//! back to the store on a miss.

use std::fmt::Display;
use std::hash::Hash;

use serde::Serialize;

use super::DurableStore;
use crate::cache::RecencyIndex;
use crate::types::config::{CacheConfig, ReadPolicy};
use crate::types::errors::StoreError;
use crate::LruStoreResult;

/// Cache statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Current number of cached entries.
    pub size: usize,

    /// Maximum capacity.
    pub capacity: usize,

    /// Reads served from the cache.
    pub hits: u64,

    /// Reads that missed the cache.
    pub misses: u64,

    /// Misses answered by the durable store.
    pub durable_hits: u64,

    /// Entries pushed out of the cache.
    pub evictions: u64,
}

impl CacheStats {
    /// Fraction of reads served from the cache.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// LRU cache in front of a durable key/value store.
pub struct CacheBackedStore<K, V, S> {
    cache: RecencyIndex<K, V>,
    store: S,
    policy: ReadPolicy,
    hits: u64,
    misses: u64,
    durable_hits: u64,
    evictions: u64,
}

impl<K, V, S> CacheBackedStore<K, V, S>
where
    K: Hash + Eq + Clone + Display,
    V: Clone,
    S: DurableStore<K, V>,
{
    /// Creates a store with the default [`ReadPolicy::CacheAside`].
    pub fn new(capacity: usize, store: S) -> Self {
        Self::with_policy(capacity, store, ReadPolicy::default())
    }

    /// Creates a store with an explicit read policy.
    pub fn with_policy(capacity: usize, store: S, policy: ReadPolicy) -> Self {
        Self::from_index(RecencyIndex::new(capacity), store, policy)
    }

    /// Creates a store from cache configuration, rejecting a negative
    /// capacity.
    pub fn from_config(config: &CacheConfig, store: S) -> LruStoreResult<Self> {
        let cache = RecencyIndex::try_with_capacity(config.capacity)?;
        Ok(Self::from_index(cache, store, config.read_policy))
    }

    fn from_index(cache: RecencyIndex<K, V>, store: S, policy: ReadPolicy) -> Self {
        Self {
            cache,
            store,
            policy,
            hits: 0,
            misses: 0,
            durable_hits: 0,
            evictions: 0,
        }
    }

    /// Persists `value` under `key`, then caches it.
    ///
    /// If the durable write fails the cache is not touched and
    /// [`StoreError::PersistFailed`] is returned. An entry evicted by the
    /// cache insert stays readable through the durable store.
    pub fn insert(&mut self, key: K, value: V) -> Result<(), StoreError> {
        if let Err(source) = self.store.write(&key, &value) {
            tracing::warn!(key = %key, error = %source, "durable write failed, cache untouched");
            return Err(StoreError::PersistFailed {
                key: key.to_string(),
                source,
            });
        }

        self.cache_insert(key, value);
        Ok(())
    }

    /// Looks up `key`, consulting the durable store on a cache miss.
    ///
    /// Under [`ReadPolicy::CacheAside`] a durable hit is returned without
    /// being cached; under [`ReadPolicy::ReadThrough`] it is cached as the
    /// most recently used entry.
    pub fn get(&mut self, key: &K) -> Result<Option<V>, StoreError> {
        if let Some(value) = self.cache.get(key) {
            self.hits += 1;
            tracing::trace!(key = %key, "cache hit");
            return Ok(Some(value.clone()));
        }

        self.misses += 1;
        let found = self.store.read(key).map_err(|source| {
            tracing::warn!(key = %key, error = %source, "durable read failed");
            StoreError::ReadFailed {
                key: key.to_string(),
                source,
            }
        })?;

        match found {
            Some(value) => {
                self.durable_hits += 1;
                tracing::debug!(key = %key, policy = ?self.policy, "served from durable store");
                if self.policy == ReadPolicy::ReadThrough {
                    self.cache_insert(key.clone(), value.clone());
                }
                Ok(Some(value))
            }
            None => {
                tracing::trace!(key = %key, "not found");
                Ok(None)
            }
        }
    }

    /// Drops `key` from the cache only. Durable data is untouched.
    pub fn invalidate(&mut self, key: &K) -> bool {
        self.cache.remove(key).is_some()
    }

    /// Empties the cache only.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    fn cache_insert(&mut self, key: K, value: V) {
        if let Some((evicted, _)) = self.cache.insert(key, value) {
            self.evictions += 1;
            tracing::debug!(key = %evicted, "evicted from cache");
        }
    }
}

impl<K, V, S> CacheBackedStore<K, V, S> {
    /// Returns cache statistics.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.cache.len(),
            capacity: self.cache.capacity(),
            hits: self.hits,
            misses: self.misses,
            durable_hits: self.durable_hits,
            evictions: self.evictions,
        }
    }

    /// Read-only view of the cache, e.g. for snapshots.
    pub fn cache(&self) -> &RecencyIndex<K, V> {
        &self.cache
    }

    /// The durable store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Active read policy.
    pub fn policy(&self) -> ReadPolicy {
        self.policy
    }

    /// Consumes the facade, returning the durable store.
    pub fn into_inner(self) -> S {
        self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::types::errors::BackendError;
    use crate::LruStoreError;

    /// Memory store whose reads and writes can be switched off.
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore<String, i32>,
        fail_writes: bool,
        fail_reads: bool,
        reads: std::cell::Cell<usize>,
    }

    impl DurableStore<String, i32> for FlakyStore {
        fn read(&self, key: &String) -> Result<Option<i32>, BackendError> {
            self.reads.set(self.reads.get() + 1);
            if self.fail_reads {
                return Err(BackendError::unavailable("read offline"));
            }
            self.inner.read(key)
        }

        fn write(&mut self, key: &String, value: &i32) -> Result<(), BackendError> {
            if self.fail_writes {
                return Err(BackendError::unavailable("write offline"));
            }
            self.inner.write(key, value)
        }
    }

    fn k(s: &str) -> String {
        s.to_string()
    }

    fn order<S>(store: &CacheBackedStore<String, i32, S>) -> Vec<String> {
        store.cache().iter().map(|(k, _)| k.clone()).collect()
    }

    #[test]
    fn test_insert_writes_through() {
        let mut store = CacheBackedStore::new(2, MemoryStore::new());
        store.insert(k("a"), 1).unwrap();

        assert_eq!(store.store().read(&k("a")).unwrap(), Some(1));
        assert_eq!(store.cache().peek("a"), Some(&1));
    }

    #[test]
    fn test_cache_hit_skips_durable_store() {
        let mut store = CacheBackedStore::new(2, FlakyStore::default());
        store.insert(k("a"), 1).unwrap();

        assert_eq!(store.get(&k("a")).unwrap(), Some(1));
        assert_eq!(store.store().reads.get(), 0);
        assert_eq!(store.stats().hits, 1);
    }

    #[test]
    fn test_evicted_entry_served_from_durable_store() {
        let mut store = CacheBackedStore::new(2, FlakyStore::default());
        store.insert(k("a"), 1).unwrap();
        store.insert(k("b"), 2).unwrap();
        store.insert(k("c"), 3).unwrap();

        assert!(!store.cache().contains("a"));
        assert_eq!(store.get(&k("a")).unwrap(), Some(1));
        assert_eq!(store.store().reads.get(), 1);

        let stats = store.stats();
        assert_eq!(stats.evictions, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.durable_hits, 1);
    }

    #[test]
    fn test_cache_aside_does_not_repopulate() {
        let mut store = CacheBackedStore::new(2, MemoryStore::new());
        store.insert(k("a"), 1).unwrap();
        store.insert(k("b"), 2).unwrap();
        store.insert(k("c"), 3).unwrap();

        assert_eq!(store.get(&k("a")).unwrap(), Some(1));
        assert_eq!(order(&store), vec![k("c"), k("b")]);
        assert_eq!(store.stats().evictions, 1);
    }

    #[test]
    fn test_read_through_repopulates() {
        let mut store =
            CacheBackedStore::with_policy(2, MemoryStore::new(), ReadPolicy::ReadThrough);
        store.insert(k("a"), 1).unwrap();
        store.insert(k("b"), 2).unwrap();
        store.insert(k("c"), 3).unwrap();

        assert_eq!(store.get(&k("a")).unwrap(), Some(1));
        assert_eq!(order(&store), vec![k("a"), k("c")]);
        assert_eq!(store.stats().evictions, 2);

        // Now a cache hit.
        assert_eq!(store.get(&k("a")).unwrap(), Some(1));
        assert_eq!(store.stats().hits, 1);
    }

    #[test]
    fn test_write_failure_leaves_cache_untouched() {
        let mut store = CacheBackedStore::new(2, FlakyStore::default());
        store.insert(k("a"), 1).unwrap();

        store.store.fail_writes = true;
        let err = store.insert(k("a"), 99).unwrap_err();
        assert!(matches!(err, StoreError::PersistFailed { ref key, .. } if key == "a"));

        let err = store.insert(k("b"), 2).unwrap_err();
        assert_eq!(err.key(), "b");

        assert_eq!(order(&store), vec![k("a")]);
        assert_eq!(store.get(&k("a")).unwrap(), Some(1));
        assert_eq!(store.get(&k("b")).unwrap(), None);
    }

    #[test]
    fn test_read_failure_propagates() {
        let mut store = CacheBackedStore::new(1, FlakyStore::default());
        store.insert(k("a"), 1).unwrap();
        store.insert(k("b"), 2).unwrap();

        store.store.fail_reads = true;
        let err = store.get(&k("a")).unwrap_err();
        assert!(matches!(err, StoreError::ReadFailed { .. }));
        assert_eq!(order(&store), vec![k("b")]);

        // Cached keys are still served.
        assert_eq!(store.get(&k("b")).unwrap(), Some(2));
    }

    #[test]
    fn test_missing_everywhere_is_none() {
        let mut store: CacheBackedStore<String, i32, _> =
            CacheBackedStore::new(2, MemoryStore::new());
        assert_eq!(store.get(&k("nope")).unwrap(), None);
        assert_eq!(store.stats().misses, 1);
        assert_eq!(store.stats().durable_hits, 0);
    }

    #[test]
    fn test_zero_capacity_always_reads_durable() {
        let mut store = CacheBackedStore::new(0, FlakyStore::default());
        store.insert(k("a"), 1).unwrap();

        assert!(store.cache().is_empty());
        assert_eq!(store.get(&k("a")).unwrap(), Some(1));
        assert_eq!(store.store().reads.get(), 1);
        assert_eq!(store.stats().evictions, 1);
    }

    #[test]
    fn test_overwrite_visible_after_eviction() {
        let mut store = CacheBackedStore::new(1, MemoryStore::new());
        store.insert(k("a"), 1).unwrap();
        store.insert(k("a"), 2).unwrap();
        store.insert(k("b"), 3).unwrap();

        assert_eq!(store.get(&k("a")).unwrap(), Some(2));
    }

    #[test]
    fn test_invalidate_and_clear_keep_durable_data() {
        let mut store = CacheBackedStore::new(4, MemoryStore::new());
        store.insert(k("a"), 1).unwrap();
        store.insert(k("b"), 2).unwrap();

        assert!(store.invalidate(&k("a")));
        assert!(!store.invalidate(&k("a")));
        assert_eq!(store.get(&k("a")).unwrap(), Some(1));

        store.clear_cache();
        assert!(store.cache().is_empty());
        assert_eq!(store.get(&k("b")).unwrap(), Some(2));
        assert_eq!(store.into_inner().len(), 2);
    }

    #[test]
    fn test_from_config() {
        let config = CacheConfig {
            capacity: 3,
            read_policy: ReadPolicy::ReadThrough,
        };
        let store: CacheBackedStore<String, i32, _> =
            CacheBackedStore::from_config(&config, MemoryStore::new()).unwrap();
        assert_eq!(store.stats().capacity, 3);
        assert_eq!(store.policy(), ReadPolicy::ReadThrough);

        let bad = CacheConfig {
            capacity: -1,
            ..CacheConfig::default()
        };
        let result: LruStoreResult<CacheBackedStore<String, i32, _>> =
            CacheBackedStore::from_config(&bad, MemoryStore::new());
        assert!(matches!(result, Err(LruStoreError::InvalidCapacity(-1))));
    }

    #[test]
    fn test_stats_hit_rate() {
        let mut store = CacheBackedStore::new(10, MemoryStore::new());
        store.insert(k("a"), 1).unwrap();

        store.get(&k("a")).unwrap();
        store.get(&k("x")).unwrap();
        store.get(&k("a")).unwrap();

        let stats = store.stats();
        assert_eq!(stats.size, 1);
        assert_eq!(stats.capacity, 10);
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate() - 0.666).abs() < 0.01);
        assert_eq!(CacheStats::default().hit_rate(), 0.0);
    }
}
