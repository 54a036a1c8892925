//! Fixed-capacity LRU index with O(1) lookup, promotion and eviction.
//!
//! Entries sit in an [`EntryArena`] and form a doubly linked list through
//! their `prev`/`next` handles, most-recently-used at the head and
//! least-recently-used at the tail. A `HashMap<K, Handle>` gives O(1) access
//! to any entry's slot.
//!
//! ```text
//!   map: { a -> #2, b -> #0, c -> #1 }
//!
//!   head ─► [#0 b] ◄──► [#1 c] ◄──► [#2 a] ◄── tail
//!            MRU                      LRU
//! ```

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use super::arena::{EntryArena, Handle};
use crate::{LruStoreError, LruStoreResult};

/// Upper bound on slots reserved up front, so a huge capacity does not
/// allocate memory that may never be used.
const PREALLOC_LIMIT: usize = 4096;

/// Least-recently-used index over keys `K` and values `V`.
pub struct RecencyIndex<K, V> {
    map: HashMap<K, Handle>,
    arena: EntryArena<K, V>,
    head: Option<Handle>,
    tail: Option<Handle>,
    capacity: usize,
}

impl<K, V> RecencyIndex<K, V>
where
    K: Hash + Eq + Clone,
{
    /// Creates an empty index holding at most `capacity` entries.
    ///
    /// A capacity of zero is allowed: every insert is immediately handed
    /// back as evicted.
    pub fn new(capacity: usize) -> Self {
        let reserve = capacity.min(PREALLOC_LIMIT);
        Self {
            map: HashMap::with_capacity(reserve),
            arena: EntryArena::with_capacity(reserve),
            head: None,
            tail: None,
            capacity,
        }
    }

    /// Creates an index from a signed capacity, as read from configuration.
    ///
    /// Negative values are rejected with [`LruStoreError::InvalidCapacity`].
    pub fn try_with_capacity(capacity: i64) -> LruStoreResult<Self> {
        let capacity =
            usize::try_from(capacity).map_err(|_| LruStoreError::InvalidCapacity(capacity))?;
        Ok(Self::new(capacity))
    }

    /// Inserts or overwrites `key`, making it the most recently used entry.
    ///
    /// Returns the entry pushed out to stay within capacity, if any.
    /// Overwriting an existing key never evicts.
    pub fn insert(&mut self, key: K, value: V) -> Option<(K, V)> {
        if self.capacity == 0 {
            return Some((key, value));
        }

        if let Some(&handle) = self.map.get(&key) {
            if let Some(entry) = self.arena.get_mut(handle) {
                entry.value = value;
            }
            self.move_to_front(handle);
            return None;
        }

        let evicted = if self.map.len() >= self.capacity {
            self.pop_lru()
        } else {
            None
        };

        let handle = self.arena.alloc(key.clone(), value);
        self.attach_front(handle);
        self.map.insert(key, handle);

        evicted
    }

    /// Returns the value for `key` and marks it most recently used.
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let handle = *self.map.get(key)?;
        self.move_to_front(handle);
        self.arena.get(handle).map(|entry| &entry.value)
    }

    /// Returns the value for `key` without touching recency.
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let handle = *self.map.get(key)?;
        self.arena.get(handle).map(|entry| &entry.value)
    }

    /// Checks membership without touching recency.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.map.contains_key(key)
    }

    /// Removes `key`, returning its value.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let handle = self.map.remove(key)?;
        self.detach(handle);
        self.arena.release(handle).map(|entry| entry.value)
    }

    fn pop_lru(&mut self) -> Option<(K, V)> {
        let handle = self.tail?;
        self.detach(handle);
        let entry = self.arena.release(handle)?;
        self.map.remove(&entry.key);
        Some((entry.key, entry.value))
    }
}

impl<K, V> RecencyIndex<K, V> {
    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    /// Whether the index holds no entries.
    pub fn is_empty(&self) -> bool {
        self.arena.len() == 0
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The entry that the next overflowing insert would evict.
    pub fn peek_lru(&self) -> Option<(&K, &V)> {
        let entry = self.arena.get(self.tail?)?;
        Some((&entry.key, &entry.value))
    }

    /// Drops every entry. Capacity is unchanged.
    pub fn clear(&mut self) {
        self.map.clear();
        self.arena.clear();
        self.head = None;
        self.tail = None;
    }

    /// Iterates entries from most to least recently used.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            arena: &self.arena,
            next: self.head,
            remaining: self.arena.len(),
        }
    }

    /// Owned copy of the entries, most recently used first.
    pub fn snapshot(&self) -> Vec<(K, V)>
    where
        K: Clone,
        V: Clone,
    {
        self.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    /// Verifies that the map and the linked list describe the same entries.
    pub fn check_invariants(&self) -> Result<(), String>
    where
        K: Hash + Eq,
    {
        if self.arena.len() > self.capacity {
            return Err(format!(
                "len {} exceeds capacity {}",
                self.arena.len(),
                self.capacity
            ));
        }
        if self.map.len() != self.arena.len() {
            return Err(format!(
                "map holds {} keys but arena holds {} entries",
                self.map.len(),
                self.arena.len()
            ));
        }

        let mut walked = 0;
        let mut prev = None;
        let mut cursor = self.head;
        while let Some(handle) = cursor {
            let entry = self
                .arena
                .get(handle)
                .ok_or_else(|| format!("list links to free slot {}", handle.index()))?;
            if entry.prev != prev {
                return Err(format!("broken prev link at slot {}", handle.index()));
            }
            if self.map.get(&entry.key) != Some(&handle) {
                return Err(format!("slot {} is not indexed by its key", handle.index()));
            }
            walked += 1;
            if walked > self.arena.len() {
                return Err("cycle in recency list".to_string());
            }
            prev = cursor;
            cursor = entry.next;
        }

        if prev != self.tail {
            return Err("tail does not terminate the list".to_string());
        }
        if walked != self.map.len() {
            return Err(format!(
                "list has {} entries but map has {} keys",
                walked,
                self.map.len()
            ));
        }
        Ok(())
    }

    fn detach(&mut self, handle: Handle) {
        let (prev, next) = match self.arena.get_mut(handle) {
            Some(entry) => (entry.prev.take(), entry.next.take()),
            None => return,
        };

        match prev.and_then(|p| self.arena.get_mut(p)) {
            Some(entry) => entry.next = next,
            None => self.head = next,
        }
        match next.and_then(|n| self.arena.get_mut(n)) {
            Some(entry) => entry.prev = prev,
            None => self.tail = prev,
        }
    }

    fn attach_front(&mut self, handle: Handle) {
        let old_head = self.head;
        if let Some(entry) = self.arena.get_mut(handle) {
            entry.prev = None;
            entry.next = old_head;
        }

        match old_head.and_then(|h| self.arena.get_mut(h)) {
            Some(entry) => entry.prev = Some(handle),
            None => self.tail = Some(handle),
        }
        self.head = Some(handle);
    }

    fn move_to_front(&mut self, handle: Handle) {
        if self.head == Some(handle) {
            return;
        }
        self.detach(handle);
        self.attach_front(handle);
    }
}

/// Iterator over a [`RecencyIndex`], most recently used first.
pub struct Iter<'a, K, V> {
    arena: &'a EntryArena<K, V>,
    next: Option<Handle>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let arena = self.arena;
        let entry = arena.get(self.next?)?;
        self.next = entry.next;
        self.remaining = self.remaining.saturating_sub(1);
        Some((&entry.key, &entry.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<'a, K, V> IntoIterator for &'a RecencyIndex<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// One `\t(key: value)` line per entry, most recently used first.
impl<K: fmt::Display, V: fmt::Display> fmt::Display for RecencyIndex<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in self.iter() {
            writeln!(f, "\t({}: {})", key, value)?;
        }
        Ok(())
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for RecencyIndex<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecencyIndex")
            .field("capacity", &self.capacity)
            .field("len", &self.arena.len())
            .field("entries", &self.iter().collect::<Vec<_>>())
            .finish()
    }
}
