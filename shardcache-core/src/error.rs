//! Leaf error types shared by loaders and peer transports.
//!
//! Both enums are `Clone`: a single fetch outcome is shared by every caller
//! coalesced onto it, so boxed sources are kept behind an [`Arc`].

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

/// Boxed error used for opaque sources.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Error returned by a [`Loader`](crate::Loader).
#[derive(Debug, Clone, Error)]
pub enum LoadError {
    /// The data source has no value for the key.
    #[error("{key} not exist")]
    NotFound {
        /// The key that was looked up.
        key: String,
    },

    /// The data source failed for any other reason.
    #[error(transparent)]
    Failed(Arc<dyn std::error::Error + Send + Sync>),
}

impl LoadError {
    /// Creates a [`LoadError::NotFound`] for `key`.
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Wraps an arbitrary error as [`LoadError::Failed`].
    pub fn failed(error: impl Into<BoxError>) -> Self {
        Self::Failed(Arc::from(error.into()))
    }
}

/// Network interaction error raised by a [`PeerGetter`](crate::PeerGetter).
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The request could not be sent or no response arrived.
    #[error("request to {url} failed: {source}")]
    Request {
        /// Requested URL.
        url: String,
        /// Underlying client error.
        source: Arc<dyn std::error::Error + Send + Sync>,
    },

    /// The peer answered with a non-success status.
    #[error("server returned {status}")]
    Status {
        /// Requested URL.
        url: String,
        /// Status line text, e.g. `404 Not Found`.
        status: String,
    },

    /// The response body could not be read.
    #[error("reading response body from {url}: {source}")]
    Body {
        /// Requested URL.
        url: String,
        /// Underlying client error.
        source: Arc<dyn std::error::Error + Send + Sync>,
    },

    /// The peer did not answer within the configured deadline.
    #[error("request to {url} timed out after {after:?}")]
    Timeout {
        /// Requested URL.
        url: String,
        /// Configured deadline.
        after: Duration,
    },
}
