//! Thread-safe handle to a [`CacheBackedStore`].
//!
//! A single `parking_lot::Mutex` guards the cache together with the durable
//! store, and every method holds it for the whole operation. Two inserts can
//! therefore never interleave their durable write and cache update.

use std::fmt::Display;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::Mutex;

use super::{CacheBackedStore, CacheStats, DurableStore};
use crate::types::errors::StoreError;

/// Cloneable, lock-guarded [`CacheBackedStore`].
pub struct SharedStore<K, V, S> {
    inner: Arc<Mutex<CacheBackedStore<K, V, S>>>,
}

impl<K, V, S> Clone for SharedStore<K, V, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V, S> SharedStore<K, V, S>
where
    K: Hash + Eq + Clone + Display,
    V: Clone,
    S: DurableStore<K, V>,
{
    /// Wraps `store`.
    pub fn new(store: CacheBackedStore<K, V, S>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    /// See [`CacheBackedStore::insert`].
    pub fn insert(&self, key: K, value: V) -> Result<(), StoreError> {
        self.inner.lock().insert(key, value)
    }

    /// See [`CacheBackedStore::get`].
    pub fn get(&self, key: &K) -> Result<Option<V>, StoreError> {
        self.inner.lock().get(key)
    }

    /// See [`CacheBackedStore::invalidate`].
    pub fn invalidate(&self, key: &K) -> bool {
        self.inner.lock().invalidate(key)
    }

    /// Cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.inner.lock().stats()
    }

    /// Cached entries, most recently used first.
    pub fn snapshot(&self) -> Vec<(K, V)> {
        self.inner.lock().cache().snapshot()
    }

    /// Runs `f` with exclusive access, for compound operations that must not
    /// interleave with other callers.
    pub fn with_locked<R>(&self, f: impl FnOnce(&mut CacheBackedStore<K, V, S>) -> R) -> R {
        let mut guard = self.inner.lock();
        f(&mut guard)
    }
}
