//! End-to-end behaviour of `Group` lookups against fake loaders and peers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::future::join_all;
use pretty_assertions::assert_eq;
use shardcache::{
    ByteView, CacheError, ConfigError, Group, GroupBuilder, GroupConfig, LoadError, Loader,
    PeerGetter, PeerPicker, TransportError,
};

/// Loader backed by a fixed table that counts calls per key.
#[derive(Default)]
struct ScoreLoader {
    calls: Mutex<HashMap<String, usize>>,
    delay: Option<Duration>,
}

impl ScoreLoader {
    fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    fn calls(&self, key: &str) -> usize {
        self.calls.lock().unwrap().get(key).copied().unwrap_or(0)
    }

    fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl Loader for ScoreLoader {
    async fn load(&self, key: &str) -> Result<Vec<u8>, LoadError> {
        *self.calls.lock().unwrap().entry(key.to_owned()).or_default() += 1;
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match key {
            "Tom" => Ok(b"630".to_vec()),
            "Jack" => Ok(b"589".to_vec()),
            "Sam" => Ok(b"567".to_vec()),
            "broken" => Err(LoadError::failed("database is down")),
            other => Err(LoadError::not_found(other)),
        }
    }
}

/// Getter answering every fetch with the same outcome.
struct StaticGetter {
    outcome: Result<Bytes, TransportError>,
    calls: AtomicUsize,
}

impl StaticGetter {
    fn answering(value: &'static str) -> Arc<Self> {
        Arc::new(Self {
            outcome: Ok(Bytes::from_static(value.as_bytes())),
            calls: AtomicUsize::new(0),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            outcome: Err(TransportError::Status {
                url: "http://peer/_shardcache/scores/Tom".to_owned(),
                status: "500 Internal Server Error".to_owned(),
            }),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PeerGetter for StaticGetter {
    async fn fetch(&self, _group: &str, _key: &str) -> Result<Bytes, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome.clone()
    }
}

/// Picker that routes every key to one getter, or keeps every key local.
struct FixedPicker {
    getter: Option<Arc<StaticGetter>>,
    picks: AtomicUsize,
}

impl FixedPicker {
    fn remote(getter: Arc<StaticGetter>) -> Arc<Self> {
        Arc::new(Self {
            getter: Some(getter),
            picks: AtomicUsize::new(0),
        })
    }

    fn local() -> Arc<Self> {
        Arc::new(Self {
            getter: None,
            picks: AtomicUsize::new(0),
        })
    }
}

impl PeerPicker for FixedPicker {
    fn pick_peer(&self, _key: &str) -> Option<Arc<dyn PeerGetter>> {
        self.picks.fetch_add(1, Ordering::SeqCst);
        self.getter
            .clone()
            .map(|getter| getter as Arc<dyn PeerGetter>)
    }
}

fn scores(loader: Arc<ScoreLoader>) -> Group {
    Group::builder("scores")
        .max_bytes(2 << 10)
        .shared_loader(loader)
        .build()
        .unwrap()
}

#[tokio::test]
async fn loads_once_then_serves_from_cache() {
    let loader = Arc::new(ScoreLoader::default());
    let group = scores(Arc::clone(&loader));

    for (key, value) in [("Tom", "630"), ("Jack", "589"), ("Sam", "567")] {
        assert_eq!(group.get(key).await.unwrap().as_text(), value);
        assert_eq!(group.get(key).await.unwrap().as_text(), value);
        assert_eq!(loader.calls(key), 1, "{key} should be loaded once");
    }

    let stats = group.cache_stats();
    assert_eq!(stats.entries, 3);
    assert_eq!(stats.used_bytes, 3 + 3 + 4 + 3 + 3 + 3);
}

#[tokio::test]
async fn missing_keys_are_reported_and_not_cached() {
    let loader = Arc::new(ScoreLoader::default());
    let group = scores(Arc::clone(&loader));

    for _ in 0..2 {
        let err = group.get("unknown").await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "unknown not exist");
    }
    assert_eq!(loader.calls("unknown"), 2);
    assert_eq!(group.cache_stats().entries, 0);
}

#[tokio::test]
async fn loader_failures_propagate_unchanged() {
    let group = scores(Arc::new(ScoreLoader::default()));

    let err = group.get("broken").await.unwrap_err();
    assert!(matches!(err, CacheError::Load(LoadError::Failed(_))));
    assert!(!err.is_not_found());
    assert_eq!(err.to_string(), "database is down");
}

#[tokio::test]
async fn empty_key_touches_nothing() {
    let loader = Arc::new(ScoreLoader::default());
    let group = scores(Arc::clone(&loader));
    let picker = FixedPicker::remote(StaticGetter::answering("remote"));
    group.register_peers(picker.clone()).unwrap();

    let err = group.get("").await.unwrap_err();

    assert!(matches!(err, CacheError::EmptyKey));
    assert_eq!(err.to_string(), "key is required");
    assert_eq!(loader.total_calls(), 0);
    assert_eq!(picker.picks.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn peer_values_are_not_cached_locally() {
    let loader = Arc::new(ScoreLoader::default());
    let group = scores(Arc::clone(&loader));
    let getter = StaticGetter::answering("remote-630");
    group
        .register_peers(FixedPicker::remote(Arc::clone(&getter)))
        .unwrap();

    for _ in 0..2 {
        assert_eq!(
            group.get("Tom").await.unwrap(),
            ByteView::from("remote-630")
        );
    }

    assert_eq!(getter.calls(), 2);
    assert_eq!(loader.total_calls(), 0);
    assert_eq!(group.cache_stats().entries, 0);
}

#[tokio::test]
async fn peer_failure_falls_back_to_loader() {
    let loader = Arc::new(ScoreLoader::default());
    let group = scores(Arc::clone(&loader));
    let getter = StaticGetter::failing();
    group
        .register_peers(FixedPicker::remote(Arc::clone(&getter)))
        .unwrap();

    assert_eq!(group.get("Tom").await.unwrap().as_text(), "630");
    assert_eq!(getter.calls(), 1);
    assert_eq!(loader.calls("Tom"), 1);

    // The fallback result is cached like any local load.
    assert_eq!(group.get("Tom").await.unwrap().as_text(), "630");
    assert_eq!(getter.calls(), 1);
    assert_eq!(loader.calls("Tom"), 1);
}

#[tokio::test]
async fn locally_owned_keys_use_the_loader() {
    let loader = Arc::new(ScoreLoader::default());
    let group = scores(Arc::clone(&loader));
    let picker = FixedPicker::local();
    group.register_peers(picker.clone()).unwrap();

    assert_eq!(group.get("Jack").await.unwrap().as_text(), "589");
    assert_eq!(picker.picks.load(Ordering::SeqCst), 1);
    assert_eq!(loader.calls("Jack"), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_misses_invoke_loader_once() {
    let loader = Arc::new(ScoreLoader::slow(Duration::from_millis(200)));
    let group = Arc::new(scores(Arc::clone(&loader)));

    let tasks = (0..10).map(|_| {
        let group = Arc::clone(&group);
        tokio::spawn(async move { group.get("Tom").await })
    });
    for joined in join_all(tasks).await {
        assert_eq!(joined.unwrap().unwrap().as_text(), "630");
    }

    assert_eq!(loader.calls("Tom"), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn abandoned_lookup_still_loads_and_caches() {
    let loader = Arc::new(ScoreLoader::slow(Duration::from_millis(100)));
    let group = Arc::new(scores(Arc::clone(&loader)));

    let leader = tokio::spawn({
        let group = Arc::clone(&group);
        async move { group.get("Tom").await }
    });
    while loader.calls("Tom") == 0 {
        tokio::task::yield_now().await;
    }
    let follower = tokio::spawn({
        let group = Arc::clone(&group);
        async move { group.get("Tom").await }
    });
    tokio::time::sleep(Duration::from_millis(20)).await;
    leader.abort();

    assert_eq!(follower.await.unwrap().unwrap().as_text(), "630");
    assert_eq!(loader.calls("Tom"), 1);
    assert_eq!(group.cache_stats().entries, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn value_is_cached_even_when_nobody_waits() {
    let loader = Arc::new(ScoreLoader::slow(Duration::from_millis(50)));
    let group = Arc::new(scores(Arc::clone(&loader)));

    let lookup = tokio::spawn({
        let group = Arc::clone(&group);
        async move { group.get("Jack").await }
    });
    while loader.calls("Jack") == 0 {
        tokio::task::yield_now().await;
    }
    lookup.abort();
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(group.cache_stats().entries, 1);
    assert_eq!(group.get("Jack").await.unwrap().as_text(), "589");
    assert_eq!(loader.calls("Jack"), 1);
}

#[tokio::test]
async fn small_cache_stays_within_budget() {
    let loader = Arc::new(ScoreLoader::default());
    let group = Group::builder("scores")
        .max_bytes(13)
        .shared_loader(loader.clone())
        .build()
        .unwrap();

    for key in ["Tom", "Jack", "Sam"] {
        group.get(key).await.unwrap();
    }

    let stats = group.cache_stats();
    assert!(stats.used_bytes <= 13);
    assert_eq!(stats.entries, 2);

    // Tom was evicted, so it is loaded again.
    group.get("Tom").await.unwrap();
    assert_eq!(loader.calls("Tom"), 2);
}

#[test]
fn peers_can_only_be_registered_once() {
    let group = scores(Arc::new(ScoreLoader::default()));
    group.register_peers(FixedPicker::local()).unwrap();

    assert_eq!(
        group.register_peers(FixedPicker::local()),
        Err(ConfigError::PeersAlreadyRegistered {
            group: "scores".to_owned()
        })
    );
}

#[test]
fn building_without_loader_fails() {
    let err = Group::builder("scores").build().unwrap_err();
    assert_eq!(
        err,
        ConfigError::MissingLoader {
            group: "scores".to_owned()
        }
    );
}

#[tokio::test]
async fn builder_from_config_applies_limits() {
    let config = GroupConfig {
        name: "scores".to_owned(),
        max_bytes: 6,
    };
    let group = GroupBuilder::from_config(&config)
        .loader(ScoreLoader::default())
        .build()
        .unwrap();

    assert_eq!(group.name(), "scores");
    group.get("Tom").await.unwrap();
    group.get("Sam").await.unwrap();
    assert_eq!(group.cache_stats().entries, 1);
}
