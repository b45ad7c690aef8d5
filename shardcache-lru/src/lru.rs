//! Byte-bounded least-recently-used store.
//!
//! Entries live in a slot arena and are linked into a recency list by slot
//! index, so moving an entry to the front or evicting from the back never
//! touches more than a handful of slots. A key index maps each key to its
//! slot.
//!
//! ```text
//!   index: HashMap<String, usize>        slots: Vec<Option<Node<V>>>
//!   ┌──────┬──────┐                       ┌──────┬──────────────────────────────┐
//!   │ "k3" │  2   │ ────────────────────► │  2   │ { k3, v3, prev: None, next: 0 } │ ◄── head (MRU)
//!   │ "k1" │  0   │ ────────────────────► │  0   │ { k1, v1, prev: 2, next: 1 }    │
//!   │ "k2" │  1   │ ────────────────────► │  1   │ { k2, v2, prev: 0, next: None } │ ◄── tail (LRU)
//!   └──────┴──────┘                       └──────┴──────────────────────────────┘
//! ```
//!
//! ## Accounting
//!
//! The size of an entry is `key.len() + value.weight()`. After every
//! [`add`](LruCache::add) the store evicts from the tail until the used bytes
//! fit into `max_bytes` again. A `max_bytes` of `0` disables eviction.
//!
//! ## Performance
//! - `get` / `add` / `remove`: O(1) average
//! - `remove_oldest`: O(1)
//!
//! The store is a plain data structure with `&mut self` methods. Wrap it in
//! [`SharedLru`](crate::SharedLru) to share it between tasks.

use std::collections::HashMap;
use std::fmt;

use shardcache_core::Weighted;
use tracing::trace;

/// Callback invoked with every evicted entry.
pub type EvictionCallback<V> = Box<dyn FnMut(String, V) + Send>;

struct Node<V> {
    key: String,
    value: V,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Least-recently-used store bounded by the total byte size of its entries.
///
/// # Examples
///
/// ```
/// use shardcache_lru::LruCache;
///
/// let mut lru = LruCache::new(14);
/// lru.add("k1", "12345".to_owned());
/// lru.add("k2", "678".to_owned());
///
/// // Touch k1 so k2 becomes the eviction candidate.
/// assert!(lru.get("k1").is_some());
/// lru.add("k3", "9".to_owned());
///
/// assert!(lru.get("k2").is_none());
/// assert_eq!(lru.len(), 2);
/// ```
pub struct LruCache<V> {
    max_bytes: u64,
    used_bytes: u64,
    slots: Vec<Option<Node<V>>>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    index: HashMap<String, usize>,
    on_evicted: Option<EvictionCallback<V>>,
}

impl<V: Weighted> LruCache<V> {
    /// Creates a store holding at most `max_bytes` bytes; `0` means unbounded.
    pub fn new(max_bytes: u64) -> Self {
        Self {
            max_bytes,
            used_bytes: 0,
            slots: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            index: HashMap::new(),
            on_evicted: None,
        }
    }

    /// Creates a store that reports every evicted entry to `on_evicted`.
    pub fn with_eviction_callback<F>(max_bytes: u64, on_evicted: F) -> Self
    where
        F: FnMut(String, V) + Send + 'static,
    {
        Self {
            on_evicted: Some(Box::new(on_evicted)),
            ..Self::new(max_bytes)
        }
    }

    /// Inserts or updates `key`, making it the most recently used entry.
    ///
    /// Evicts least recently used entries afterwards until the store fits its
    /// byte limit again.
    pub fn add(&mut self, key: impl Into<String>, value: V) {
        let key = key.into();
        if let Some(&id) = self.index.get(&key) {
            if let Some(node) = self.node_mut(id) {
                let added = value.weight() as u64;
                let old = std::mem::replace(&mut node.value, value);
                self.used_bytes = self.used_bytes + added - old.weight() as u64;
            }
            self.move_to_front(id);
        } else {
            let size = entry_size(&key, &value);
            let id = self.alloc(Node {
                key: key.clone(),
                value,
                prev: None,
                next: None,
            });
            self.attach_front(id);
            self.index.insert(key, id);
            self.used_bytes += size;
        }

        while self.max_bytes != 0 && self.used_bytes > self.max_bytes {
            if !self.evict_oldest() {
                break;
            }
        }
    }

    /// Looks up `key` and marks it as most recently used.
    pub fn get(&mut self, key: &str) -> Option<&V> {
        let id = *self.index.get(key)?;
        self.move_to_front(id);
        self.node(id).map(|node| &node.value)
    }

    /// Looks up `key` without touching its recency.
    pub fn peek(&self, key: &str) -> Option<&V> {
        let id = *self.index.get(key)?;
        self.node(id).map(|node| &node.value)
    }

    /// Returns `true` if `key` is present.
    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Removes `key` without invoking the eviction callback.
    pub fn remove(&mut self, key: &str) -> Option<V> {
        let id = self.index.remove(key)?;
        self.take(id).map(|node| node.value)
    }

    /// Evicts the least recently used entry, if any.
    pub fn remove_oldest(&mut self) {
        self.evict_oldest();
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns `true` if the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Bytes currently charged to the store.
    pub fn used_bytes(&self) -> u64 {
        self.used_bytes
    }

    /// Configured byte limit; `0` means unbounded.
    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Iterates entries from most to least recently used.
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            cache: self,
            current: self.head,
        }
    }

    fn evict_oldest(&mut self) -> bool {
        let Some(id) = self.tail else {
            return false;
        };
        let Some(node) = self.take(id) else {
            return false;
        };
        self.index.remove(&node.key);
        trace!(key = %node.key, used_bytes = self.used_bytes, "evicted least recently used entry");
        if let Some(on_evicted) = self.on_evicted.as_mut() {
            on_evicted(node.key, node.value);
        }
        true
    }

    /// Unlinks slot `id`, frees it and releases its bytes.
    ///
    /// The caller is responsible for the key index.
    fn take(&mut self, id: usize) -> Option<Node<V>> {
        self.detach(id);
        let node = self.slots.get_mut(id)?.take()?;
        self.free.push(id);
        self.used_bytes -= entry_size(&node.key, &node.value);
        Some(node)
    }
}

impl<V> LruCache<V> {
    fn node(&self, id: usize) -> Option<&Node<V>> {
        self.slots.get(id).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, id: usize) -> Option<&mut Node<V>> {
        self.slots.get_mut(id).and_then(Option::as_mut)
    }

    fn alloc(&mut self, node: Node<V>) -> usize {
        match self.free.pop() {
            Some(id) => {
                self.slots[id] = Some(node);
                id
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        }
    }

    fn move_to_front(&mut self, id: usize) {
        if self.head == Some(id) {
            return;
        }
        self.detach(id);
        self.attach_front(id);
    }

    fn attach_front(&mut self, id: usize) {
        let old_head = self.head;
        if let Some(node) = self.node_mut(id) {
            node.prev = None;
            node.next = old_head;
        }
        match old_head {
            Some(head) => {
                if let Some(node) = self.node_mut(head) {
                    node.prev = Some(id);
                }
            }
            None => self.tail = Some(id),
        }
        self.head = Some(id);
    }

    fn detach(&mut self, id: usize) {
        let Some((prev, next)) = self.node(id).map(|node| (node.prev, node.next)) else {
            return;
        };
        match prev {
            Some(prev_id) => {
                if let Some(node) = self.node_mut(prev_id) {
                    node.next = next;
                }
            }
            None => self.head = next,
        }
        match next {
            Some(next_id) => {
                if let Some(node) = self.node_mut(next_id) {
                    node.prev = prev;
                }
            }
            None => self.tail = prev,
        }
        if let Some(node) = self.node_mut(id) {
            node.prev = None;
            node.next = None;
        }
    }
}

fn entry_size<V: Weighted>(key: &str, value: &V) -> u64 {
    (key.len() + value.weight()) as u64
}

impl<V> fmt::Debug for LruCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruCache")
            .field("max_bytes", &self.max_bytes)
            .field("used_bytes", &self.used_bytes)
            .field("len", &self.index.len())
            .field("on_evicted", &self.on_evicted.is_some())
            .finish()
    }
}

/// Iterator over `(key, value)` pairs from most to least recently used.
pub struct Iter<'a, V> {
    cache: &'a LruCache<V>,
    current: Option<usize>,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (&'a str, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.cache.node(self.current?)?;
        self.current = node.next;
        Some((node.key.as_str(), &node.value))
    }
}
