//! Process-local durable store.

use std::collections::HashMap;
use std::hash::Hash;

use super::DurableStore;
use crate::types::errors::BackendError;

/// `HashMap`-backed store. Durable only for the lifetime of the process.
#[derive(Debug, Clone)]
pub struct MemoryStore<K, V> {
    entries: HashMap<K, V>,
}

impl<K, V> MemoryStore<K, V> {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> Default for MemoryStore<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> DurableStore<K, V> for MemoryStore<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    fn read(&self, key: &K) -> Result<Option<V>, BackendError> {
        Ok(self.entries.get(key).cloned())
    }

    fn write(&mut self, key: &K, value: &V) -> Result<(), BackendError> {
        self.entries.insert(key.clone(), value.clone());
        Ok(())
    }
}
