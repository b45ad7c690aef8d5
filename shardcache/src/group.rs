//! Cache namespaces.
//!
//! A [`Group`] answers lookups for one namespace. Each lookup tries, in order:
//!
//! 1. the local cache;
//! 2. the peer that owns the key, if a [`PeerPicker`] is registered and the key
//!    is owned by another node;
//! 3. the group's [`Loader`], whose result is then cached locally.
//!
//! Steps 2 and 3 run at most once per key at a time; concurrent callers for
//! the same missing key share one outcome. They run on a spawned task, so the
//! group must be used from within a tokio runtime.

use std::fmt;
use std::sync::{Arc, OnceLock};

#[cfg(feature = "metrics")]
use std::time::Instant;

use shardcache_core::{ByteView, Loader, PeerPicker};
use shardcache_lru::SharedLru;
use tracing::{debug, trace, warn};

use crate::config::GroupConfig;
use crate::error::{CacheError, ConfigError};
use crate::flight::Flight;

#[cfg(feature = "metrics")]
use crate::metrics::{
    CACHE_HIT_COUNTER, CACHE_MISS_COUNTER, LOAD_DURATION, LOCAL_LOAD_COUNTER, PEER_FAILURE_COUNTER,
    PEER_FETCH_COUNTER,
};

/// Snapshot of a group's local cache occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    /// Number of cached entries.
    pub entries: usize,
    /// Bytes charged to the cache (key length plus value length per entry).
    pub used_bytes: u64,
}

/// A named cache namespace.
///
/// # Examples
///
/// ```
/// use shardcache::{Group, LoadError, loader_fn};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let group = Group::builder("scores")
///     .max_bytes(2 << 10)
///     .loader(loader_fn(|key: String| async move {
///         match key.as_str() {
///             "Tom" => Ok(b"630".to_vec()),
///             _ => Err(LoadError::not_found(key)),
///         }
///     }))
///     .build()
///     .unwrap();
///
/// let view = group.get("Tom").await.unwrap();
/// assert_eq!(view.as_text(), "630");
/// assert!(group.get("Sam").await.unwrap_err().is_not_found());
/// # }
/// ```
pub struct Group {
    shared: Arc<Shared>,
    flight: Flight<Result<ByteView, CacheError>>,
}

/// Parts of a group that a fetch task needs after its caller is gone.
struct Shared {
    name: String,
    loader: Arc<dyn Loader>,
    main_cache: SharedLru,
    peers: OnceLock<Arc<dyn PeerPicker>>,
}

impl Group {
    /// Starts building a group named `name`.
    pub fn builder(name: impl Into<String>) -> GroupBuilder {
        GroupBuilder::new(name)
    }

    /// Group name.
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Looks up `key`.
    ///
    /// Returns [`CacheError::EmptyKey`] for an empty key without touching the
    /// cache, the peers or the loader. Loader errors are returned as
    /// [`CacheError::Load`] and are not cached.
    ///
    /// A miss is fetched on a task of its own: dropping the returned future
    /// does not stop the peer fetch or the load, and a loaded value is still
    /// cached.
    pub async fn get(&self, key: &str) -> Result<ByteView, CacheError> {
        if key.is_empty() {
            return Err(CacheError::EmptyKey);
        }

        if let Some(view) = self.shared.main_cache.get(key) {
            trace!(group = %self.shared.name, key, "cache hit");
            #[cfg(feature = "metrics")]
            metrics::counter!(*CACHE_HIT_COUNTER, "group" => self.shared.name.clone()).increment(1);
            return Ok(view);
        }

        #[cfg(feature = "metrics")]
        metrics::counter!(*CACHE_MISS_COUNTER, "group" => self.shared.name.clone()).increment(1);

        let shared = Arc::clone(&self.shared);
        let owned = key.to_owned();
        self.flight
            .execute(key, move || shared.load(owned))
            .await?
    }

    /// Registers the picker used to route keys to their owning peers.
    ///
    /// A group accepts exactly one picker over its lifetime.
    pub fn register_peers(&self, peers: Arc<dyn PeerPicker>) -> Result<(), ConfigError> {
        self.shared
            .peers
            .set(peers)
            .map_err(|_| ConfigError::PeersAlreadyRegistered {
                group: self.shared.name.clone(),
            })
    }

    /// Returns `true` once a peer picker is registered.
    pub fn has_peers(&self) -> bool {
        self.shared.peers.get().is_some()
    }

    /// Occupancy of the local cache.
    pub fn cache_stats(&self) -> CacheStats {
        CacheStats {
            entries: self.shared.main_cache.len(),
            used_bytes: self.shared.main_cache.used_bytes(),
        }
    }
}

impl Shared {
    #[tracing::instrument(level = "debug", skip(self), fields(group = %self.name))]
    async fn load(self: Arc<Self>, key: String) -> Result<ByteView, CacheError> {
        #[cfg(feature = "metrics")]
        let started = Instant::now();

        let result = match self.load_from_peer(&key).await {
            Some(view) => Ok(view),
            None => self.load_locally(&key).await,
        };

        #[cfg(feature = "metrics")]
        metrics::histogram!(*LOAD_DURATION, "group" => self.name.clone())
            .record(started.elapsed().as_secs_f64());

        result
    }

    /// Fetches from the owning peer. Peer values are not cached locally.
    async fn load_from_peer(&self, key: &str) -> Option<ByteView> {
        let getter = self.peers.get()?.pick_peer(key)?;
        match getter.fetch(&self.name, key).await {
            Ok(bytes) => {
                debug!("loaded from peer");
                #[cfg(feature = "metrics")]
                metrics::counter!(*PEER_FETCH_COUNTER, "group" => self.name.clone()).increment(1);
                Some(ByteView::from(bytes))
            }
            Err(error) => {
                warn!(%error, "peer fetch failed, loading locally");
                #[cfg(feature = "metrics")]
                metrics::counter!(*PEER_FAILURE_COUNTER, "group" => self.name.clone())
                    .increment(1);
                None
            }
        }
    }

    async fn load_locally(&self, key: &str) -> Result<ByteView, CacheError> {
        #[cfg(feature = "metrics")]
        metrics::counter!(*LOCAL_LOAD_COUNTER, "group" => self.name.clone()).increment(1);

        let bytes = self.loader.load(key).await?;
        let view = ByteView::from(bytes);
        debug!(bytes = view.len(), "loaded locally");
        self.main_cache.add(key, view.clone());
        Ok(view)
    }
}

impl fmt::Debug for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Group")
            .field("name", &self.shared.name)
            .field("main_cache", &self.shared.main_cache)
            .field("has_peers", &self.has_peers())
            .field("in_flight", &self.flight.in_flight())
            .finish_non_exhaustive()
    }
}

/// Builder for [`Group`].
pub struct GroupBuilder {
    name: String,
    max_bytes: u64,
    loader: Option<Arc<dyn Loader>>,
}

impl GroupBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            max_bytes: 0,
            loader: None,
        }
    }

    /// Starts a builder from declarative settings; the loader is still required.
    pub fn from_config(config: &GroupConfig) -> Self {
        Self::new(config.name.clone()).max_bytes(config.max_bytes)
    }

    /// Byte limit of the local cache; `0` (the default) means unbounded.
    pub fn max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Loader invoked on misses that no peer answers.
    pub fn loader(mut self, loader: impl Loader + 'static) -> Self {
        self.loader = Some(Arc::new(loader));
        self
    }

    /// Shared loader, for loaders used by several groups.
    pub fn shared_loader(mut self, loader: Arc<dyn Loader>) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Builds the group.
    ///
    /// Fails with [`ConfigError::MissingLoader`] if no loader was set.
    pub fn build(self) -> Result<Group, ConfigError> {
        let loader = self
            .loader
            .ok_or_else(|| ConfigError::MissingLoader {
                group: self.name.clone(),
            })?;
        Ok(Group {
            shared: Arc::new(Shared {
                main_cache: SharedLru::new(self.max_bytes),
                name: self.name,
                loader,
                peers: OnceLock::new(),
            }),
            flight: Flight::new(),
        })
    }
}

impl fmt::Debug for GroupBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupBuilder")
            .field("name", &self.name)
            .field("max_bytes", &self.max_bytes)
            .field("has_loader", &self.loader.is_some())
            .finish()
    }
}
