//! LRU Cache Metrics
//!
//! Lock-free counters recorded by [`ConcurrentLruCache`](crate::ConcurrentLruCache).

use super::{CacheMetrics, CoreCacheMetrics};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic counters shared by every thread using one cache.
///
/// Counters are independent `Relaxed` atomics: a snapshot taken while
/// operations are in flight may mix before and after values, a snapshot
/// taken at quiescence is exact. Requests are not stored; they are the sum of
/// hits and misses, so a snapshot never reports more hits than requests.
#[derive(Debug, Default)]
pub struct LruCacheMetrics {
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    insertions: AtomicU64,
    updates: AtomicU64,
    evictions: AtomicU64,
    removals: AtomicU64,
}

impl LruCacheMetrics {
    /// Creates a zeroed set of counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a lookup that found its key.
    pub fn record_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a lookup that missed.
    pub fn record_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a new key entering the cache.
    pub fn record_insertion(&self) {
        self.insertions.fetch_add(1, Ordering::Relaxed);
    }

    /// Records an overwrite of a resident key.
    pub fn record_update(&self) {
        self.updates.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a capacity eviction.
    pub fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    /// Records an explicit removal.
    pub fn record_removal(&self) {
        self.removals.fetch_add(1, Ordering::Relaxed);
    }

    /// Copies the current counter values.
    pub fn snapshot(&self) -> CoreCacheMetrics {
        let cache_hits = self.cache_hits.load(Ordering::Relaxed);
        let cache_misses = self.cache_misses.load(Ordering::Relaxed);
        CoreCacheMetrics {
            requests: cache_hits + cache_misses,
            cache_hits,
            insertions: self.insertions.load(Ordering::Relaxed),
            updates: self.updates.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            removals: self.removals.load(Ordering::Relaxed),
        }
    }
}

impl CacheMetrics for LruCacheMetrics {
    fn metrics(&self) -> BTreeMap<String, f64> {
        self.snapshot().to_btreemap()
    }

    fn algorithm_name(&self) -> &'static str {
        "LRU"
    }
}
