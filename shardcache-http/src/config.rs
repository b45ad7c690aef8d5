//! Declarative pool configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use shardcache::Replicas;

use crate::pool::DEFAULT_BASE_PATH;

/// Settings for one node's [`HttpPool`](crate::HttpPool).
///
/// ```yaml
/// self_addr: "http://127.0.0.1:8001"
/// base_path: "/_shardcache/"
/// replicas: 50
/// peers:
///   - "http://127.0.0.1:8001"
///   - "http://127.0.0.1:8002"
/// timeout: 2s
/// ```
///
/// Only `self_addr` is required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// This node's own base URL, exactly as it appears in `peers`.
    pub self_addr: String,
    /// URL prefix of the peer protocol.
    #[serde(default = "default_base_path")]
    pub base_path: String,
    /// Virtual positions per peer on the hash ring.
    #[serde(default)]
    pub replicas: Replicas,
    /// Base URLs of every node in the cluster, this one included.
    #[serde(default)]
    pub peers: Vec<String>,
    /// Deadline for one peer request (e.g. "500ms", "2s"). No deadline when absent.
    #[serde(default, with = "humantime_serde")]
    pub timeout: Option<Duration>,
}

impl PoolConfig {
    /// Config with default settings and no peers.
    pub fn new(self_addr: impl Into<String>) -> Self {
        Self {
            self_addr: self_addr.into(),
            base_path: default_base_path(),
            replicas: Replicas::default(),
            peers: Vec::new(),
            timeout: None,
        }
    }
}

fn default_base_path() -> String {
    DEFAULT_BASE_PATH.to_owned()
}
