//! Peer selection for one node of an HTTP cluster.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use reqwest::Client;
use shardcache::{HashRing, PeerGetter, PeerPicker, Replicas};
use tracing::debug;

use crate::config::PoolConfig;
use crate::getter::HttpGetter;

/// URL prefix of the peer protocol unless configured otherwise.
pub const DEFAULT_BASE_PATH: &str = "/_shardcache/";

struct PoolState {
    ring: HashRing,
    getters: HashMap<String, Arc<HttpGetter>>,
}

/// The set of peers one node knows about.
///
/// `HttpPool` is this node's [`PeerPicker`]: keys owned by another peer are
/// routed to an [`HttpGetter`] for that peer, keys owned by this node are
/// left to the local loader.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use shardcache::PeerPicker;
/// use shardcache_http::HttpPool;
///
/// let pool = Arc::new(HttpPool::new("http://10.0.0.1:8001"));
/// pool.set_peers(["http://10.0.0.1:8001", "http://10.0.0.2:8001"]);
///
/// // Either this node owns the key or the other one does.
/// match pool.pick_peer("Tom") {
///     Some(getter) => { let _ = getter; }
///     None => {}
/// }
/// ```
pub struct HttpPool {
    self_addr: String,
    base_path: String,
    replicas: Replicas,
    timeout: Option<Duration>,
    client: Client,
    state: Mutex<PoolState>,
}

impl HttpPool {
    /// Pool for the node reachable at `self_addr`, with default settings and
    /// no peers.
    pub fn new(self_addr: impl Into<String>) -> Self {
        let replicas = Replicas::default();
        Self {
            self_addr: self_addr.into(),
            base_path: DEFAULT_BASE_PATH.to_owned(),
            replicas,
            timeout: None,
            client: Client::new(),
            state: Mutex::new(PoolState {
                ring: HashRing::new(replicas.as_usize()),
                getters: HashMap::new(),
            }),
        }
    }

    /// Pool built from declarative settings, with `config.peers` already set.
    pub fn from_config(config: &PoolConfig) -> Self {
        let mut pool = Self::new(config.self_addr.clone())
            .with_base_path(&config.base_path)
            .with_replicas(config.replicas);
        pool.timeout = config.timeout;
        pool.set_peers(&config.peers);
        pool
    }

    /// URL prefix of the peer protocol. A trailing `/` is added if missing.
    pub fn with_base_path(mut self, base_path: &str) -> Self {
        self.base_path = normalize_base_path(base_path);
        self
    }

    /// Virtual positions per peer. Takes effect on the next [`set_peers`](Self::set_peers).
    pub fn with_replicas(mut self, replicas: Replicas) -> Self {
        self.replicas = replicas;
        self
    }

    /// Deadline for each peer request. Takes effect on the next [`set_peers`](Self::set_peers).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// HTTP client shared by every getter. Takes effect on the next [`set_peers`](Self::set_peers).
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// This node's own base URL.
    pub fn self_addr(&self) -> &str {
        &self.self_addr
    }

    /// URL prefix of the peer protocol.
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Replaces the peer set.
    ///
    /// The ring and the getters are rebuilt from scratch and swapped in
    /// together, so a concurrent [`pick_peer`](PeerPicker::pick_peer) sees
    /// either the old set or the new one.
    pub fn set_peers<I, S>(&self, peers: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let peers: Vec<String> = peers.into_iter().map(|peer| peer.as_ref().to_owned()).collect();
        let mut ring = HashRing::new(self.replicas.as_usize());
        ring.add_nodes(&peers);
        let getters: HashMap<String, Arc<HttpGetter>> = peers
            .into_iter()
            .map(|peer| {
                let getter = HttpGetter::with_client(
                    self.client.clone(),
                    format!("{peer}{}", self.base_path),
                    self.timeout,
                );
                (peer, Arc::new(getter))
            })
            .collect();
        debug!(node = %self.self_addr, peers = getters.len(), "peer set replaced");
        *self.lock() = PoolState { ring, getters };
    }

    /// Base URLs of the current peers, sorted.
    pub fn peers(&self) -> Vec<String> {
        let mut peers: Vec<String> = self.lock().getters.keys().cloned().collect();
        peers.sort_unstable();
        peers
    }

    fn lock(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PeerPicker for HttpPool {
    fn pick_peer(&self, key: &str) -> Option<Arc<dyn PeerGetter>> {
        let state = self.lock();
        let peer = state.ring.locate(key)?;
        if peer.is_empty() || peer == self.self_addr {
            return None;
        }
        debug!(node = %self.self_addr, peer, key, "pick peer");
        let getter = state.getters.get(peer)?;
        Some(Arc::clone(getter) as Arc<dyn PeerGetter>)
    }
}

impl fmt::Debug for HttpPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpPool")
            .field("self_addr", &self.self_addr)
            .field("base_path", &self.base_path)
            .field("replicas", &self.replicas)
            .field("timeout", &self.timeout)
            .field("peers", &self.peers())
            .finish()
    }
}

pub(crate) fn normalize_base_path(base_path: &str) -> String {
    let trimmed = base_path.trim_matches('/');
    if trimmed.is_empty() {
        "/".to_owned()
    } else {
        format!("/{trimmed}/")
    }
}
