//! Consistent-hash ring mapping keys to node names.
//!
//! Every real node is placed on the ring `replicas` times. The virtual
//! position `i` of node `name` is `hash(format!("{i}{name}"))`. A key belongs
//! to the first virtual position at or after its own hash, wrapping around to
//! the smallest position past the end of the ring.
//!
//! ```
//! use shardcache::HashRing;
//!
//! let mut ring = HashRing::new(50);
//! ring.add_nodes(["http://10.0.0.1:8001", "http://10.0.0.2:8001"]);
//!
//! let owner = ring.locate("Tom").unwrap();
//! assert_eq!(ring.locate("Tom"), Some(owner));
//! ```

use std::collections::HashMap;

/// Hash function used to place nodes and keys on the ring.
pub type HashFn = fn(&[u8]) -> u32;

/// Default replication factor.
pub const DEFAULT_REPLICAS: usize = 50;

/// Consistent-hash ring over node names.
#[derive(Debug, Clone)]
pub struct HashRing {
    hash: HashFn,
    replicas: usize,
    positions: Vec<u32>,
    owners: HashMap<u32, String>,
}

impl HashRing {
    /// Creates an empty ring hashing with CRC-32 (IEEE).
    pub fn new(replicas: usize) -> Self {
        Self::with_hasher(replicas, crc32fast::hash)
    }

    /// Creates an empty ring with a custom hash function.
    pub fn with_hasher(replicas: usize, hash: HashFn) -> Self {
        Self {
            hash,
            replicas,
            positions: Vec::new(),
            owners: HashMap::new(),
        }
    }

    /// Places each node on the ring `replicas` times.
    pub fn add_nodes<I, S>(&mut self, nodes: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for node in nodes {
            let node = node.as_ref();
            for position in self.virtual_positions(node) {
                self.positions.push(position);
                self.owners.insert(position, node.to_owned());
            }
        }
        self.positions.sort_unstable();
        self.positions.dedup();
    }

    /// Removes every virtual position still owned by each node.
    ///
    /// A position shared with another node through a hash collision stays
    /// with that node.
    pub fn remove_nodes<I, S>(&mut self, nodes: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for node in nodes {
            let node = node.as_ref();
            for position in self.virtual_positions(node) {
                if self.owners.get(&position).map(String::as_str) == Some(node) {
                    self.owners.remove(&position);
                }
            }
        }
        self.positions = self.owners.keys().copied().collect();
        self.positions.sort_unstable();
    }

    /// Returns the node owning `key`, or `None` if the ring is empty.
    pub fn locate(&self, key: &str) -> Option<&str> {
        if self.positions.is_empty() {
            return None;
        }
        let hash = (self.hash)(key.as_bytes());
        let idx = self.positions.partition_point(|&position| position < hash);
        let position = self.positions[idx % self.positions.len()];
        self.owners.get(&position).map(String::as_str)
    }

    /// Returns `true` if no node is placed on the ring.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Number of virtual positions on the ring.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Replication factor.
    pub fn replicas(&self) -> usize {
        self.replicas
    }

    fn virtual_positions(&self, node: &str) -> Vec<u32> {
        (0..self.replicas)
            .map(|i| (self.hash)(format!("{i}{node}").as_bytes()))
            .collect()
    }
}

impl Default for HashRing {
    fn default() -> Self {
        Self::new(DEFAULT_REPLICAS)
    }
}
