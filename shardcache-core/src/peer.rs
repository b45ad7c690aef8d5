//! Peer capabilities used by a group to reach the node that owns a key.
//!
//! The two traits split routing from transport: a [`PeerPicker`] decides
//! *which* node owns a key, a [`PeerGetter`] performs the round trip to one
//! particular node. A group only ever talks to these traits, so HTTP, gRPC or
//! an in-process fake are interchangeable.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::TransportError;

/// Locates the peer that owns a key.
pub trait PeerPicker: Send + Sync {
    /// Returns the getter for the owning peer, or `None` when the key should be
    /// handled by this node.
    fn pick_peer(&self, key: &str) -> Option<Arc<dyn PeerGetter>>;
}

impl<P> PeerPicker for Arc<P>
where
    P: PeerPicker + ?Sized,
{
    fn pick_peer(&self, key: &str) -> Option<Arc<dyn PeerGetter>> {
        (**self).pick_peer(key)
    }
}

/// Fetches a key's value from one specific peer.
#[async_trait]
pub trait PeerGetter: Send + Sync {
    /// Fetches `key` from the peer's `group`.
    async fn fetch(&self, group: &str, key: &str) -> Result<Bytes, TransportError>;
}

#[async_trait]
impl<G> PeerGetter for Arc<G>
where
    G: PeerGetter + ?Sized,
{
    async fn fetch(&self, group: &str, key: &str) -> Result<Bytes, TransportError> {
        (**self).fetch(group, key).await
    }
}
