//! Two real nodes on loopback sockets routing keys to each other.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use shardcache::{Group, GroupRegistry, HashRing, Replicas, loader_fn};
use shardcache_http::{DEFAULT_BASE_PATH, HttpPool, router};
use tokio::net::TcpListener;

struct Node {
    addr: String,
    group: Arc<Group>,
    loads: Arc<AtomicUsize>,
}

/// Starts a node serving the peer protocol on `listener`.
fn start_node(listener: TcpListener, addr: &str, peers: &[String]) -> Node {
    let loads = Arc::new(AtomicUsize::new(0));
    let group = {
        let loads = Arc::clone(&loads);
        let node = addr.to_owned();
        Group::builder("scores")
            .max_bytes(2 << 10)
            .loader(loader_fn(move |key: String| {
                let loads = Arc::clone(&loads);
                let node = node.clone();
                async move {
                    loads.fetch_add(1, Ordering::SeqCst);
                    Ok(format!("{key}@{node}").into_bytes())
                }
            }))
            .build()
            .unwrap()
    };

    let registry = Arc::new(GroupRegistry::new());
    let group = registry.register(group).unwrap();

    let pool = Arc::new(HttpPool::new(addr));
    pool.set_peers(peers);
    group.register_peers(pool).unwrap();

    tokio::spawn(async move {
        axum::serve(listener, router(registry, DEFAULT_BASE_PATH))
            .await
            .unwrap();
    });

    Node {
        addr: addr.to_owned(),
        group,
        loads,
    }
}

async fn bind() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = format!("http://{}", listener.local_addr().unwrap());
    (listener, addr)
}

/// First key of the form `key-N` that `owner` is responsible for.
fn key_owned_by(peers: &[String], owner: &str) -> String {
    let mut ring = HashRing::new(Replicas::default().as_usize());
    ring.add_nodes(peers);
    (0..)
        .map(|i| format!("key-{i}"))
        .find(|key| ring.locate(key) == Some(owner))
        .unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn keys_are_loaded_by_their_owner() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let (first_listener, first_addr) = bind().await;
    let (second_listener, second_addr) = bind().await;
    let peers = vec![first_addr.clone(), second_addr.clone()];

    let first = start_node(first_listener, &first_addr, &peers);
    let second = start_node(second_listener, &second_addr, &peers);

    // Remote key: the first node asks the second one over HTTP.
    let remote = key_owned_by(&peers, &second.addr);
    let value = first.group.get(&remote).await.unwrap();
    assert_eq!(value.as_text(), format!("{remote}@{}", second.addr));
    assert_eq!(first.loads.load(Ordering::SeqCst), 0);
    assert_eq!(second.loads.load(Ordering::SeqCst), 1);
    assert_eq!(first.group.cache_stats().entries, 0);
    assert_eq!(second.group.cache_stats().entries, 1);

    // Asking again goes back to the owner, which answers from its cache.
    first.group.get(&remote).await.unwrap();
    assert_eq!(second.loads.load(Ordering::SeqCst), 1);

    // Local key: the first node loads it itself.
    let local = key_owned_by(&peers, &first.addr);
    let value = first.group.get(&local).await.unwrap();
    assert_eq!(value.as_text(), format!("{local}@{}", first.addr));
    assert_eq!(first.loads.load(Ordering::SeqCst), 1);
    assert_eq!(second.loads.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unreachable_owner_falls_back_to_local_load() {
    let (listener, addr) = bind().await;
    let (dead_listener, dead_addr) = bind().await;
    drop(dead_listener);
    let peers = vec![addr.clone(), dead_addr.clone()];

    let node = start_node(listener, &addr, &peers);

    let key = key_owned_by(&peers, &dead_addr);
    let value = node.group.get(&key).await.unwrap();

    assert_eq!(value.as_text(), format!("{key}@{addr}"));
    assert_eq!(node.loads.load(Ordering::SeqCst), 1);
    assert_eq!(node.group.cache_stats().entries, 1);
}
