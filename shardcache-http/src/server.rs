//! Server side of the peer protocol, as axum routers.

use std::sync::Arc;

use axum::Router;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use bytes::Bytes;
use http::{Method, StatusCode, Uri, header};
use serde::Deserialize;
use shardcache::{ByteView, CacheError, Group, GroupRegistry};
use tracing::debug;

use crate::pool::normalize_base_path;

#[derive(Clone)]
struct PeerState {
    registry: Arc<GroupRegistry>,
    base_path: Arc<str>,
}

/// Router answering `GET {base_path}{group}/{key}` from the groups in
/// `registry`.
///
/// | Outcome                              | Status |
/// |--------------------------------------|--------|
/// | value found                          | 200, `application/octet-stream` body |
/// | path is not exactly `{group}/{key}`  | 400 `bad request` |
/// | empty key                            | 500 `key is required` |
/// | group not registered                 | 404 `no such group: {group}` |
/// | any other lookup error               | 500 with the error text |
///
/// Both segments arrive percent-encoded and are decoded after splitting, so a
/// `/` inside a key or group name must be sent as `%2F`.
///
/// ```no_run
/// use std::sync::Arc;
/// use shardcache::GroupRegistry;
/// use shardcache_http::{DEFAULT_BASE_PATH, router};
///
/// # async fn run() -> std::io::Result<()> {
/// let registry = Arc::new(GroupRegistry::new());
/// let app = router(registry, DEFAULT_BASE_PATH);
/// let listener = tokio::net::TcpListener::bind("127.0.0.1:8001").await?;
/// axum::serve(listener, app).await
/// # }
/// ```
pub fn router(registry: Arc<GroupRegistry>, base_path: &str) -> Router {
    let base_path = normalize_base_path(base_path);
    let state = PeerState {
        registry,
        base_path: Arc::from(base_path.as_str()),
    };
    Router::new()
        .route(&base_path, get(serve_peer))
        .route(&format!("{base_path}{{*path}}"), get(serve_peer))
        .with_state(state)
}

async fn serve_peer(State(state): State<PeerState>, method: Method, uri: Uri) -> Response {
    let path = uri.path();
    debug!(%method, path, "serving peer request");

    let Some((group_name, key)) = path
        .strip_prefix(&*state.base_path)
        .and_then(split_segments)
    else {
        return bad_request();
    };

    let Some(group) = state.registry.get(&group_name) else {
        return error_response(&CacheError::UnknownGroup(group_name));
    };

    match group.get(&key).await {
        Ok(view) => value_response(view),
        Err(error) => error_response(&error),
    }
}

/// Splits `{group}/{key}` and percent-decodes both parts.
fn split_segments(rest: &str) -> Option<(String, String)> {
    let mut parts = rest.split('/');
    let (Some(group), Some(key), None) = (parts.next(), parts.next(), parts.next()) else {
        return None;
    };
    let group = urlencoding::decode(group).ok()?;
    let key = urlencoding::decode(key).ok()?;
    Some((group.into_owned(), key.into_owned()))
}

#[derive(Debug, Deserialize)]
struct ApiQuery {
    #[serde(default)]
    key: String,
}

/// Router answering `GET /api?key={key}` from a single group.
///
/// This is the client-facing entry point of a node; responses follow the
/// same status mapping as [`router`].
pub fn api_router(group: Arc<Group>) -> Router {
    Router::new()
        .route("/api", get(serve_api))
        .with_state(group)
}

async fn serve_api(State(group): State<Arc<Group>>, Query(query): Query<ApiQuery>) -> Response {
    debug!(group = group.name(), key = %query.key, "serving api request");
    match group.get(&query.key).await {
        Ok(view) => value_response(view),
        Err(error) => error_response(&error),
    }
}

fn value_response(view: ByteView) -> Response {
    let body: Bytes = view.to_bytes();
    (
        [(header::CONTENT_TYPE, "application/octet-stream")],
        body,
    )
        .into_response()
}

fn bad_request() -> Response {
    (StatusCode::BAD_REQUEST, "bad request").into_response()
}

fn error_response(error: &CacheError) -> Response {
    let status = match error {
        CacheError::UnknownGroup(_) => StatusCode::NOT_FOUND,
        CacheError::EmptyKey
        | CacheError::Load(_)
        | CacheError::Transport(_)
        | CacheError::Flight(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, error.to_string()).into_response()
}
