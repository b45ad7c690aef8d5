#![warn(missing_docs)]
//! # shardcache-core
//!
//! Core traits and types for the shardcache distributed byte cache.
//!
//! This crate holds the pieces every other shardcache crate agrees on:
//!
//! - **Values**: [`ByteView`], the immutable unit of cached data, and the
//!   [`Weighted`] trait used for byte accounting.
//! - **Loading**: the [`Loader`] capability the embedding application supplies
//!   to produce a value on a confirmed miss.
//! - **Peers**: the [`PeerPicker`] / [`PeerGetter`] capability pair that lets a
//!   group route a key to the node owning it. Any transport can implement them;
//!   `shardcache-http` ships the HTTP one.
//! - **Errors**: [`LoadError`] and [`TransportError`], both `Clone` so a single
//!   coalesced outcome can be handed to every waiting caller.

pub mod error;
pub mod loader;
pub mod peer;
pub mod view;

pub use error::{BoxError, LoadError, TransportError};
pub use loader::{Loader, LoaderFn, loader_fn};
pub use peer::{PeerGetter, PeerPicker};
pub use view::{ByteView, Weighted};
