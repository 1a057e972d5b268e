//! Error types for the concurrent LRU cache.
//!
//! Only construction can fail during normal use. Lookups and removals report
//! absence through `Option`; the indexer-style helpers
//! ([`try_get`](crate::ConcurrentLruCache::try_get) and
//! [`try_update`](crate::ConcurrentLruCache::try_update)) turn absence into
//! [`CacheError::KeyNotFound`]. Internal CAS races are resolved by retrying and
//! never show up here.

use thiserror::Error;

/// Errors reported by the cache.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// The configuration cannot describe a working cache (zero capacity,
    /// zero index segments).
    #[error("invalid cache configuration: {reason}")]
    InvalidConfiguration {
        /// Which parameter failed validation.
        reason: &'static str,
    },

    /// An indexer-style access named a key that is not resident.
    #[error("key not found in cache")]
    KeyNotFound,

    /// A quiescent consistency check found the index and the recency list
    /// disagreeing.
    #[error("cache invariant violated: {0}")]
    InvariantViolation(String),
}

impl CacheError {
    pub(crate) fn invalid_config(reason: &'static str) -> Self {
        CacheError::InvalidConfiguration { reason }
    }
}
