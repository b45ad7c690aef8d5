//! Request coalescing ("singleflight").
//!
//! When a key misses, many tasks can ask for it at the same moment. [`Flight`]
//! lets only the first of them (the leader) start the fetch; everyone arriving
//! while that fetch is open (the followers) waits for its outcome instead of
//! starting another one.
//!
//! The fetch runs on its own tokio task and owns its window. Callers only wait
//! for it: dropping the leader or any follower does not cancel the fetch, and
//! its outcome still reaches every remaining caller.
//!
//! A window closes as soon as the fetch finishes. Nothing is cached here: the
//! next call after that starts a new window and runs the operation again.

use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::watch;
use tracing::trace;

use crate::error::FlightError;

#[cfg(feature = "metrics")]
use crate::metrics::FLIGHT_COALESCED_COUNTER;

type Calls<T> = DashMap<String, watch::Receiver<Option<T>>>;

/// Role of a caller within a fetch window.
enum Decision<T> {
    /// No fetch is in flight: start one and publish its outcome.
    Proceed(watch::Sender<Option<T>>),
    /// Another caller started the fetch: wait for its outcome.
    Await(watch::Receiver<Option<T>>),
}

/// Deduplicates concurrent executions of an operation per key.
///
/// Must be used from within a tokio runtime.
///
/// # Examples
///
/// ```
/// use shardcache::Flight;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let flight: Flight<u32> = Flight::new();
/// let value = flight.execute("answer", || async { 42 }).await.unwrap();
/// assert_eq!(value, 42);
/// assert_eq!(flight.in_flight(), 0);
/// # }
/// ```
#[derive(Debug)]
pub struct Flight<T> {
    calls: Arc<Calls<T>>,
}

impl<T> Flight<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Creates a flight with no open windows.
    pub fn new() -> Self {
        Self {
            calls: Arc::new(DashMap::new()),
        }
    }

    /// Runs `operation` unless a run for `key` is already in flight, in which
    /// case the outcome of that run is returned instead.
    ///
    /// The operation's future is spawned and runs to completion even if every
    /// caller waiting on it goes away. The only error is a fetch task that
    /// panicked or was cancelled by the runtime.
    pub async fn execute<F, Fut>(&self, key: &str, operation: F) -> Result<T, FlightError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        loop {
            match self.check(key) {
                Decision::Await(mut receiver) => {
                    trace!(key, "joining in-flight fetch");
                    #[cfg(feature = "metrics")]
                    metrics::counter!(*FLIGHT_COALESCED_COUNTER).increment(1);
                    if let Ok(outcome) = receiver.wait_for(Option::is_some).await {
                        if let Some(value) = outcome.as_ref() {
                            return Ok(value.clone());
                        }
                    }
                    trace!(key, "in-flight fetch died, retrying");
                }
                Decision::Proceed(sender) => {
                    let window = Window {
                        calls: Arc::clone(&self.calls),
                        key: key.to_owned(),
                    };
                    let fetch = operation();
                    let task = tokio::spawn(async move {
                        let _window = window;
                        let value = fetch.await;
                        sender.send_replace(Some(value.clone()));
                        value
                    });
                    return task.await.map_err(FlightError::from);
                }
            }
        }
    }

    /// Number of keys with a fetch currently in flight.
    pub fn in_flight(&self) -> usize {
        self.calls.len()
    }

    fn check(&self, key: &str) -> Decision<T> {
        match self.calls.entry(key.to_owned()) {
            Entry::Occupied(entry) => Decision::Await(entry.get().clone()),
            Entry::Vacant(entry) => {
                let (sender, receiver) = watch::channel(None);
                entry.insert(receiver);
                Decision::Proceed(sender)
            }
        }
    }
}

impl<T> Default for Flight<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Closes a window when its fetch task finishes or unwinds.
struct Window<T> {
    calls: Arc<Calls<T>>,
    key: String,
}

impl<T> Drop for Window<T> {
    fn drop(&mut self) {
        self.calls.remove(&self.key);
    }
}
