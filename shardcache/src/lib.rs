#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]
//! # shardcache
//!
//! A distributed, read-through byte cache. Values are partitioned across nodes
//! by consistent hashing; every node keeps a byte-bounded LRU for the keys it
//! owns and asks the owning node for the rest.
//!
//! The main pieces are:
//!
//! - [`Group`]: a named namespace with its own loader and local cache. This is
//!   what applications call [`get`](Group::get) on.
//! - [`GroupRegistry`]: name-to-group lookup used by the peer server.
//! - [`HashRing`]: consistent hashing of keys onto node names.
//! - [`Flight`]: coalescing of concurrent misses for the same key.
//!
//! Peer transport is pluggable through [`PeerPicker`] and [`PeerGetter`]; the
//! `shardcache-http` crate provides the HTTP implementation.
//!
//! ## Feature flags
//!
//! - `metrics`: record hit, miss, peer and load counters plus a load
//!   duration histogram through the [`metrics`](https://docs.rs/metrics) facade.
//!
//! ## Example
//!
//! ```
//! use shardcache::{Group, GroupRegistry, LoadError, loader_fn};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = GroupRegistry::new();
//! let scores = registry.register(
//!     Group::builder("scores")
//!         .max_bytes(2 << 10)
//!         .loader(loader_fn(|key: String| async move {
//!             Err::<Vec<u8>, _>(LoadError::not_found(key))
//!         }))
//!         .build()?,
//! )?;
//!
//! assert!(scores.get("Tom").await.is_err());
//! assert!(registry.get("scores").is_some());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod flight;
pub mod group;
#[cfg(feature = "metrics")]
#[cfg_attr(docsrs, doc(cfg(feature = "metrics")))]
pub mod metrics;
pub mod registry;
pub mod ring;

pub use config::{GroupConfig, Replicas};
pub use error::{CacheError, ConfigError, FlightError};
pub use flight::Flight;
pub use group::{CacheStats, Group, GroupBuilder};
pub use registry::GroupRegistry;
pub use ring::{DEFAULT_REPLICAS, HashFn, HashRing};

pub use shardcache_core::{
    BoxError, ByteView, LoadError, Loader, LoaderFn, PeerGetter, PeerPicker, TransportError,
    Weighted, loader_fn,
};
pub use shardcache_lru::{LruCache, SharedLru};
