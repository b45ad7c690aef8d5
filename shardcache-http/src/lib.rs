#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]
//! # shardcache-http
//!
//! HTTP transport between shardcache nodes.
//!
//! Each node runs the same three pieces:
//!
//! - [`HttpPool`] decides which node owns a key and hands out an
//!   [`HttpGetter`] for it. Register it on every group with
//!   [`Group::register_peers`](shardcache::Group::register_peers).
//! - [`HttpGetter`] fetches a value from one peer with
//!   `GET {peer}{base_path}{group}/{key}`.
//! - [`router`] serves that same request from the node's
//!   [`GroupRegistry`](shardcache::GroupRegistry).
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use shardcache::{Group, GroupRegistry, LoadError, loader_fn};
//! use shardcache_http::{DEFAULT_BASE_PATH, HttpPool, router};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let me = "http://127.0.0.1:8001";
//! let pool = Arc::new(HttpPool::new(me));
//! pool.set_peers([me, "http://127.0.0.1:8002", "http://127.0.0.1:8003"]);
//!
//! let registry = Arc::new(GroupRegistry::new());
//! let scores = registry.register(
//!     Group::builder("scores")
//!         .max_bytes(2 << 10)
//!         .loader(loader_fn(|key: String| async move {
//!             Err::<Vec<u8>, _>(LoadError::not_found(key))
//!         }))
//!         .build()?,
//! )?;
//! scores.register_peers(pool)?;
//!
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:8001").await?;
//! axum::serve(listener, router(registry, DEFAULT_BASE_PATH)).await?;
//! # Ok(())
//! # }
//! ```

mod config;
mod getter;
mod pool;
mod server;

pub use config::PoolConfig;
pub use getter::HttpGetter;
pub use pool::{DEFAULT_BASE_PATH, HttpPool};
pub use server::{api_router, router};
