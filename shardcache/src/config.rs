//! Serde-friendly configuration for groups and rings.

use bounded_integer::bounded_integer;
use serde::{Deserialize, Serialize};

use crate::ring::DEFAULT_REPLICAS;

bounded_integer! {
    /// Virtual positions per node on the hash ring (1-4096).
    #[repr(u16)]
    pub struct Replicas { 1..=4096 }
}

const DEFAULT_REPLICA_COUNT: Replicas = match Replicas::new(DEFAULT_REPLICAS as u16) {
    Some(replicas) => replicas,
    None => panic!("default replica count out of range"),
};

impl Replicas {
    /// Replica count as a `usize`, ready for [`HashRing::new`](crate::HashRing::new).
    pub fn as_usize(self) -> usize {
        usize::from(self.get())
    }
}

impl Default for Replicas {
    fn default() -> Self {
        DEFAULT_REPLICA_COUNT
    }
}

/// Declarative description of one group.
///
/// ```yaml
/// name: scores
/// max_bytes: 1048576   # optional, 0 (the default) means unbounded
/// ```
///
/// The loader is code, so it is supplied separately through
/// [`GroupBuilder::from_config`](crate::GroupBuilder::from_config).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupConfig {
    /// Group name, used in peer URLs and registry lookups.
    pub name: String,
    /// Byte limit of the local cache.
    #[serde(default)]
    pub max_bytes: u64,
}

impl GroupConfig {
    /// Unbounded group config with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            max_bytes: 0,
        }
    }
}
