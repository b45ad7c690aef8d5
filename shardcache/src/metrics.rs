//! Metric names recorded when the `metrics` feature is enabled.
//!
//! Metrics recorded by a group carry a `group` label.

use lazy_static::lazy_static;

lazy_static! {
    // Lookup outcome metrics

    /// Track number of lookups answered by the local cache.
    pub static ref CACHE_HIT_COUNTER: &'static str = {
        metrics::describe_counter!(
            "shardcache_cache_hit_total",
            "Total number of lookups answered by the local cache."
        );
        "shardcache_cache_hit_total"
    };
    /// Track number of lookups that missed the local cache.
    pub static ref CACHE_MISS_COUNTER: &'static str = {
        metrics::describe_counter!(
            "shardcache_cache_miss_total",
            "Total number of lookups that missed the local cache."
        );
        "shardcache_cache_miss_total"
    };

    // Fetch path metrics

    /// Track number of values fetched from the owning peer.
    pub static ref PEER_FETCH_COUNTER: &'static str = {
        metrics::describe_counter!(
            "shardcache_peer_fetch_total",
            "Total number of values fetched from the owning peer."
        );
        "shardcache_peer_fetch_total"
    };
    /// Track number of failed peer fetches.
    pub static ref PEER_FAILURE_COUNTER: &'static str = {
        metrics::describe_counter!(
            "shardcache_peer_failure_total",
            "Total number of peer fetches that failed and fell back to the loader."
        );
        "shardcache_peer_failure_total"
    };
    /// Track number of loader invocations.
    pub static ref LOCAL_LOAD_COUNTER: &'static str = {
        metrics::describe_counter!(
            "shardcache_local_load_total",
            "Total number of loader invocations."
        );
        "shardcache_local_load_total"
    };
    /// Track number of callers that joined an in-flight fetch.
    pub static ref FLIGHT_COALESCED_COUNTER: &'static str = {
        metrics::describe_counter!(
            "shardcache_flight_coalesced_total",
            "Total number of callers that waited on another caller's fetch."
        );
        "shardcache_flight_coalesced_total"
    };

    // Latency metrics

    /// Histogram of miss handling duration (peer fetch plus local load).
    pub static ref LOAD_DURATION: &'static str = {
        metrics::describe_histogram!(
            "shardcache_load_duration_seconds",
            metrics::Unit::Seconds,
            "Duration of miss handling in seconds."
        );
        "shardcache_load_duration_seconds"
    };
}
