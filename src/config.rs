//! Configuration for the concurrent LRU cache.
//!
//! # Sizing Guidelines
//!
//! - **`capacity`**: Maximum number of resident entries. Every entry costs one
//!   list node (two links, a state byte and a small mutex) plus one index slot
//!   on top of the key and value, roughly 80-120 bytes.
//! - **`segments`**: Number of independently locked shards of the key index.
//!   More segments mean less contention on index lookups. The recency list is
//!   shared by all segments, so LRU ordering stays global regardless of this
//!   value.
//!
//! # Examples
//!
//! ```
//! use concurrent_lru::config::ConcurrentLruCacheConfig;
//! use concurrent_lru::ConcurrentLruCache;
//!
//! // Default segment count derived from available parallelism
//! let config = ConcurrentLruCacheConfig::new(10_000);
//! let cache: ConcurrentLruCache<String, u64> = ConcurrentLruCache::init(config, None).unwrap();
//!
//! // Explicit segment count
//! let config = ConcurrentLruCacheConfig::new(10_000).with_segments(32);
//! assert_eq!(config.segments, 32);
//! ```

use crate::error::CacheError;
use core::fmt;

/// Returns the default number of index segments based on available parallelism.
pub fn default_segment_count() -> usize {
    std::thread::available_parallelism()
        .map(|p| p.get() * 4)
        .unwrap_or(16)
        .clamp(4, 64)
}

/// Configuration for a [`ConcurrentLruCache`](crate::ConcurrentLruCache).
///
/// Both fields are public so a config can be written out literally; the cache
/// constructors call [`validate`](Self::validate) before using it.
///
/// # Examples
///
/// ```
/// use concurrent_lru::config::ConcurrentLruCacheConfig;
///
/// let config = ConcurrentLruCacheConfig {
///     capacity: 1024,
///     segments: 8,
/// };
/// assert!(config.validate().is_ok());
///
/// let bad = ConcurrentLruCacheConfig { capacity: 0, segments: 8 };
/// assert!(bad.validate().is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ConcurrentLruCacheConfig {
    /// Maximum number of key-value pairs the cache can hold. Must be positive.
    pub capacity: usize,
    /// Number of lock-striped shards in the key index. Must be positive.
    pub segments: usize,
}

impl ConcurrentLruCacheConfig {
    /// Creates a configuration with the given capacity.
    ///
    /// Uses [`default_segment_count`], never more segments than `capacity`
    /// (and at least one).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            segments: default_segment_count().min(capacity.max(1)),
        }
    }

    /// Sets the number of index segments.
    ///
    /// Use a power of 2 for an even hash distribution.
    #[must_use]
    pub fn with_segments(mut self, segments: usize) -> Self {
        self.segments = segments;
        self
    }

    /// Checks that the configuration describes a working cache.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::InvalidConfiguration`] when `capacity` or
    /// `segments` is zero.
    pub fn validate(&self) -> Result<(), CacheError> {
        if self.capacity == 0 {
            return Err(CacheError::invalid_config(
                "capacity must be greater than zero",
            ));
        }
        if self.segments == 0 {
            return Err(CacheError::invalid_config(
                "segment count must be greater than zero",
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for ConcurrentLruCacheConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConcurrentLruCacheConfig")
            .field("capacity", &self.capacity)
            .field("segments", &self.segments)
            .finish()
    }
}
