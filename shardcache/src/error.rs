use shardcache_core::{LoadError, TransportError};
use thiserror::Error;
use tokio::task::JoinError;

/// Error returned by [`Group::get`](crate::Group::get).
///
/// Cloneable so that one fetch outcome can be handed to every caller that was
/// coalesced onto it.
#[derive(Debug, Clone, Error)]
pub enum CacheError {
    /// The lookup key was empty.
    #[error("key is required")]
    EmptyKey,

    /// No group is registered under this name.
    #[error("no such group: {0}")]
    UnknownGroup(String),

    /// The loader failed or reported the key absent.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// A peer round trip failed.
    ///
    /// Groups never return this variant: a failed peer fetch falls back to
    /// the local loader. It is here for code that drives a
    /// [`PeerGetter`](shardcache_core::PeerGetter) directly.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The task running a coalesced fetch died before producing a value.
    #[error(transparent)]
    Flight(#[from] FlightError),
}

impl CacheError {
    /// Returns `true` for unknown groups and keys the loader reports absent.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::UnknownGroup(_) | Self::Load(LoadError::NotFound { .. })
        )
    }
}

/// Misconfiguration detected while assembling groups and peers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A group was built without a loader.
    #[error("group {group:?} has no loader")]
    MissingLoader {
        /// Name of the group being built.
        group: String,
    },

    /// A peer picker was registered twice on the same group.
    #[error("peer picker registered more than once for group {group:?}")]
    PeersAlreadyRegistered {
        /// Name of the group.
        group: String,
    },

    /// Two groups were registered under the same name.
    #[error("group {0:?} is already registered")]
    DuplicateGroup(String),
}

/// Failure of the task that runs a coalesced fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FlightError {
    /// The fetch panicked.
    #[error("fetch panicked")]
    Panicked,

    /// The runtime cancelled the fetch, usually while shutting down.
    #[error("fetch cancelled")]
    Cancelled,
}

impl From<JoinError> for FlightError {
    fn from(error: JoinError) -> Self {
        if error.is_panic() {
            Self::Panicked
        } else {
            Self::Cancelled
        }
    }
}
