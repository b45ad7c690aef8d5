//! Lock-guarded LRU store shared by all tasks of one group.

use std::sync::{Mutex, MutexGuard, PoisonError};

use shardcache_core::ByteView;

use crate::lru::LruCache;

/// Thread-safe wrapper around one [`LruCache`] of [`ByteView`]s.
///
/// Every operation takes a single exclusive lock for its full duration,
/// including any eviction cascade it triggers. The underlying store is only
/// allocated on the first [`add`](SharedLru::add).
#[derive(Debug)]
pub struct SharedLru {
    max_bytes: u64,
    inner: Mutex<Option<LruCache<ByteView>>>,
}

impl SharedLru {
    /// Creates an empty wrapper; `max_bytes == 0` means unbounded.
    pub fn new(max_bytes: u64) -> Self {
        Self {
            max_bytes,
            inner: Mutex::new(None),
        }
    }

    /// Inserts or updates `key`.
    pub fn add(&self, key: impl Into<String>, value: ByteView) {
        let max_bytes = self.max_bytes;
        self.lock()
            .get_or_insert_with(|| LruCache::new(max_bytes))
            .add(key, value);
    }

    /// Looks up `key`, refreshing its recency on a hit.
    pub fn get(&self, key: &str) -> Option<ByteView> {
        self.lock().as_mut()?.get(key).cloned()
    }

    /// Removes `key`.
    pub fn remove(&self, key: &str) -> Option<ByteView> {
        self.lock().as_mut()?.remove(key)
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.lock().as_ref().map_or(0, LruCache::len)
    }

    /// Returns `true` if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes currently charged to the store.
    pub fn used_bytes(&self) -> u64 {
        self.lock().as_ref().map_or(0, LruCache::used_bytes)
    }

    /// Configured byte limit; `0` means unbounded.
    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    fn lock(&self) -> MutexGuard<'_, Option<LruCache<ByteView>>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
