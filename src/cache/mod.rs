//! In-memory LRU cache.
//!
//! [`RecencyIndex`] keeps at most `capacity` entries and evicts the least
//! recently used one on overflow. Entries are stored in a slot arena and
//! linked by integer handles, giving O(1) lookup, promotion and eviction.

mod arena;
mod lru;

pub use arena::Handle;
pub use lru::{Iter, RecencyIndex};
