//! Client side of the peer protocol.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, StatusCode};
use shardcache::{PeerGetter, TransportError};
use tracing::debug;

/// Fetches values from one peer over HTTP.
///
/// A request for key `k` in group `g` is `GET {base_url}{g}/{k}` with both
/// segments percent-encoded.
#[derive(Debug, Clone)]
pub struct HttpGetter {
    base_url: String,
    client: Client,
    timeout: Option<Duration>,
}

impl HttpGetter {
    /// Getter for the peer protocol rooted at `base_url`, e.g.
    /// `http://10.0.0.2:8001/_shardcache/`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url, None)
    }

    pub(crate) fn with_client(
        client: Client,
        base_url: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            client,
            timeout,
        }
    }

    /// Fails requests that take longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Root URL of the peer protocol on this peer.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, group: &str, key: &str) -> String {
        format!(
            "{}{}/{}",
            self.base_url,
            urlencoding::encode(group),
            urlencoding::encode(key)
        )
    }

    fn classify(&self, url: String, error: reqwest::Error) -> TransportError {
        match self.timeout {
            Some(after) if error.is_timeout() => TransportError::Timeout { url, after },
            _ if error.is_body() || error.is_decode() => TransportError::Body {
                url,
                source: Arc::new(error),
            },
            _ => TransportError::Request {
                url,
                source: Arc::new(error),
            },
        }
    }
}

#[async_trait]
impl PeerGetter for HttpGetter {
    async fn fetch(&self, group: &str, key: &str) -> Result<Bytes, TransportError> {
        let url = self.url_for(group, key);
        debug!(%url, "fetching from peer");

        let mut request = self.client.get(&url);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(error) => return Err(self.classify(url, error)),
        };
        let status = response.status();
        if status != StatusCode::OK {
            return Err(TransportError::Status {
                url,
                status: status.to_string(),
            });
        }

        match response.bytes().await {
            Ok(body) => Ok(body),
            Err(error) => Err(match self.classify(url, error) {
                TransportError::Request { url, source } => TransportError::Body { url, source },
                other => other,
            }),
        }
    }
}
