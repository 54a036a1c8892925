//! Slot arena holding the entries of the recency list.
//!
//! Entries live in a `Vec` of optional slots and refer to each other through
//! [`Handle`]s (slot indices) instead of pointers. Freed slots are recycled
//! through a free list, so a handle stays valid until its entry is removed.

/// Stable reference to an occupied arena slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle(usize);

impl Handle {
    /// Slot index behind this handle.
    pub fn index(self) -> usize {
        self.0
    }
}

/// One cached entry plus its links in the recency list.
#[derive(Debug)]
pub(crate) struct Entry<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) prev: Option<Handle>,
    pub(crate) next: Option<Handle>,
}

#[derive(Debug)]
pub(crate) struct EntryArena<K, V> {
    slots: Vec<Option<Entry<K, V>>>,
    free: Vec<usize>,
    len: usize,
}

impl<K, V> EntryArena<K, V> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            len: 0,
        }
    }

    /// Stores an unlinked entry and returns its handle.
    pub(crate) fn alloc(&mut self, key: K, value: V) -> Handle {
        let entry = Entry {
            key,
            value,
            prev: None,
            next: None,
        };

        let idx = match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = Some(entry);
                idx
            }
            None => {
                self.slots.push(Some(entry));
                self.slots.len() - 1
            }
        };
        self.len += 1;
        Handle(idx)
    }

    /// Frees a slot. The caller must have unlinked it first.
    pub(crate) fn release(&mut self, handle: Handle) -> Option<Entry<K, V>> {
        let entry = self.slots.get_mut(handle.0)?.take()?;
        self.free.push(handle.0);
        self.len -= 1;
        Some(entry)
    }

    pub(crate) fn get(&self, handle: Handle) -> Option<&Entry<K, V>> {
        self.slots.get(handle.0).and_then(Option::as_ref)
    }

    pub(crate) fn get_mut(&mut self, handle: Handle) -> Option<&mut Entry<K, V>> {
        self.slots.get_mut(handle.0).and_then(Option::as_mut)
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.len = 0;
    }
}
