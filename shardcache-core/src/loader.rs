//! The loader capability supplied by the embedding application.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::LoadError;

/// Produces the value for a key when neither the local cache nor the owning
/// peer can provide it.
///
/// Loaders are invoked at most once per key per fetch window, no matter how
/// many callers asked for the key concurrently.
///
/// # Examples
///
/// ```rust
/// use async_trait::async_trait;
/// use shardcache_core::{LoadError, Loader};
///
/// struct Scores;
///
/// #[async_trait]
/// impl Loader for Scores {
///     async fn load(&self, key: &str) -> Result<Vec<u8>, LoadError> {
///         match key {
///             "Tom" => Ok(b"630".to_vec()),
///             other => Err(LoadError::not_found(other)),
///         }
///     }
/// }
/// ```
#[async_trait]
pub trait Loader: Send + Sync {
    /// Loads the value for `key` from the backing data source.
    async fn load(&self, key: &str) -> Result<Vec<u8>, LoadError>;
}

#[async_trait]
impl<L> Loader for Arc<L>
where
    L: Loader + ?Sized,
{
    async fn load(&self, key: &str) -> Result<Vec<u8>, LoadError> {
        (**self).load(key).await
    }
}

#[async_trait]
impl Loader for Box<dyn Loader> {
    async fn load(&self, key: &str) -> Result<Vec<u8>, LoadError> {
        (**self).load(key).await
    }
}

/// Adapter turning an async closure into a [`Loader`].
///
/// Created with [`loader_fn`].
#[derive(Clone)]
pub struct LoaderFn<F> {
    f: F,
}

/// Wraps a closure `Fn(String) -> impl Future<Output = Result<Vec<u8>, LoadError>>`
/// as a [`Loader`].
///
/// ```rust
/// use shardcache_core::{LoadError, loader_fn};
///
/// let loader = loader_fn(|key: String| async move {
///     if key == "Tom" {
///         Ok(b"630".to_vec())
///     } else {
///         Err(LoadError::not_found(key))
///     }
/// });
/// # let _ = loader;
/// ```
pub fn loader_fn<F, Fut>(f: F) -> LoaderFn<F>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Vec<u8>, LoadError>> + Send,
{
    LoaderFn { f }
}

#[async_trait]
impl<F, Fut> Loader for LoaderFn<F>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Vec<u8>, LoadError>> + Send,
{
    async fn load(&self, key: &str) -> Result<Vec<u8>, LoadError> {
        (self.f)(key.to_owned()).await
    }
}

impl<F> std::fmt::Debug for LoaderFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoaderFn").finish_non_exhaustive()
    }
}
