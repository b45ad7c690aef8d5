#![warn(missing_docs)]
//! In-memory storage for shardcache groups.
//!
//! - [`LruCache`]: a byte-bounded least-recently-used store with O(1)
//!   lookups, updates and evictions. It is a single-threaded data structure.
//! - [`SharedLru`]: the store behind one coarse lock, built lazily on first
//!   write. This is what a group uses as its local cache.
//!
//! # Caveats
//!
//! - Data is **not persisted**: the cache is lost on process restart.
//! - All traffic for one wrapper serializes on its lock. Lookups refresh
//!   recency, so they need exclusive access too.

mod lru;
mod shared;

pub use lru::{EvictionCallback, Iter, LruCache};
pub use shared::SharedLru;
