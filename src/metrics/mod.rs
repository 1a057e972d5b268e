//! Cache Metrics System
//!
//! Counters are recorded lock-free by [`LruCacheMetrics`] and read back as a
//! [`CoreCacheMetrics`] snapshot. Reports are `BTreeMap`s so metric keys always
//! come out in the same order, which keeps test output and benchmark
//! comparisons reproducible.
//!
//! The counters double as an audit trail. Every new key is an insertion and
//! leaves through exactly one eviction or removal, so once all operations have
//! finished `insertions - evictions - removals` equals the number of resident
//! entries.

use std::collections::BTreeMap;

pub mod lru;

pub use lru::LruCacheMetrics;

/// Point-in-time copy of the counters tracked by the cache.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CoreCacheMetrics {
    /// Total number of lookups (`get`, `get_with`, `try_get`)
    pub requests: u64,

    /// Lookups that found the key
    pub cache_hits: u64,

    /// New keys written to the cache
    pub insertions: u64,

    /// Writes that replaced the value of a resident key
    pub updates: u64,

    /// Entries removed to make room for new keys
    pub evictions: u64,

    /// Entries removed explicitly (`remove`, `clear`)
    pub removals: u64,
}

impl CoreCacheMetrics {
    /// Lookups that missed.
    pub fn cache_misses(&self) -> u64 {
        self.requests.saturating_sub(self.cache_hits)
    }

    /// Calculates the cache hit rate
    ///
    /// # Returns
    /// A value between 0.0 and 1.0, or 0.0 if no requests have been made
    pub fn hit_rate(&self) -> f64 {
        if self.requests > 0 {
            self.cache_hits as f64 / self.requests as f64
        } else {
            0.0
        }
    }

    /// Calculates the cache miss rate
    ///
    /// # Returns
    /// A value between 0.0 and 1.0, or 0.0 if no requests have been made
    pub fn miss_rate(&self) -> f64 {
        if self.requests > 0 {
            self.cache_misses() as f64 / self.requests as f64
        } else {
            0.0
        }
    }

    /// Entries that should be resident according to the counters.
    ///
    /// Matches the cache length once no operation is in flight.
    pub fn resident_entries(&self) -> u64 {
        self.insertions
            .saturating_sub(self.evictions)
            .saturating_sub(self.removals)
    }

    /// Convert metrics to a BTreeMap for reporting
    ///
    /// # Returns
    /// A BTreeMap containing all metrics with consistent key ordering
    pub fn to_btreemap(&self) -> BTreeMap<String, f64> {
        let mut metrics = BTreeMap::new();

        metrics.insert("cache_hits".to_string(), self.cache_hits as f64);
        metrics.insert("cache_misses".to_string(), self.cache_misses() as f64);
        metrics.insert("evictions".to_string(), self.evictions as f64);
        metrics.insert("insertions".to_string(), self.insertions as f64);
        metrics.insert("removals".to_string(), self.removals as f64);
        metrics.insert("requests".to_string(), self.requests as f64);
        metrics.insert("updates".to_string(), self.updates as f64);

        metrics.insert("hit_rate".to_string(), self.hit_rate());
        metrics.insert("miss_rate".to_string(), self.miss_rate());

        if self.requests > 0 {
            metrics.insert(
                "eviction_rate".to_string(),
                self.evictions as f64 / self.requests as f64,
            );
        }

        metrics
    }
}

/// Uniform metrics reporting interface.
pub trait CacheMetrics {
    /// Returns all metrics as key-value pairs in deterministic order
    fn metrics(&self) -> BTreeMap<String, f64>;

    /// Algorithm name for identification
    fn algorithm_name(&self) -> &'static str;
}
