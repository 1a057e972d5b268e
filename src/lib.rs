#![doc = include_str!("../README.md")]
//!
//! ---
//!
//! # Code Reference
//!
//! ## Structure
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                      ConcurrentLruCache                              │
//! │                                                                      │
//! │  ┌─────────┐ ┌─────────┐ ┌─────────┐     ┌─────────┐                │
//! │  │Segment 0│ │Segment 1│ │Segment 2│ ... │SegmentN │  key index     │
//! │  │[RwLock] │ │[RwLock] │ │[RwLock] │     │[RwLock] │                │
//! │  └────┬────┘ └────┬────┘ └────┬────┘     └────┬────┘                │
//! │       │           │           │               │                      │
//! │       ▼           ▼           ▼               ▼                      │
//! │  head ─▶ [node] ─▶ [node] ─▶ [node] ─▶ ... ─▶ [sentinel]            │
//! │  MRU                 one recency list                LRU             │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Operations
//!
//! | Operation | Recency | Notes |
//! |-----------|---------|-------|
//! | [`get`](ConcurrentLruCache::get) | promotes | clones the value |
//! | [`get_with`](ConcurrentLruCache::get_with) | promotes | borrows the value |
//! | [`peek`](ConcurrentLruCache::peek) | unchanged | |
//! | [`contains_key`](ConcurrentLruCache::contains_key) | unchanged | |
//! | [`try_get`](ConcurrentLruCache::try_get) | promotes | `KeyNotFound` on a miss |
//! | [`put`](ConcurrentLruCache::put) | promotes | evicts only for a new key |
//! | [`try_update`](ConcurrentLruCache::try_update) | promotes | resident keys only |
//! | [`remove`](ConcurrentLruCache::remove) | n/a | |
//! | [`clear`](ConcurrentLruCache::clear) | n/a | |
//!
//! ## Modules
//!
//! - [`lru`]: The concurrent LRU cache
//! - [`config`]: Cache configuration
//! - [`entry`]: Key-value entry type
//! - [`error`]: Error type
//! - [`metrics`]: Metrics collection for cache performance monitoring

#![forbid(unsafe_code)]

/// Key-value pair stored by the cache.
pub mod entry;

/// Error type shared by every fallible operation.
pub mod error;

/// Cache configuration structures.
pub mod config;

/// Cache metrics system.
///
/// Provides atomic counters and a common reporting interface.
pub mod metrics;

/// Recency list nodes with a one-way Valid to Invalid state.
pub(crate) mod node;

/// Concurrent doubly linked recency list.
///
/// **Note**: This module is internal infrastructure. Nodes are only ever
/// spliced under their own locks, in predecessor to successor order.
pub(crate) mod list;

/// Lock-striped key index.
pub(crate) mod index;

/// Concurrent Least Recently Used (LRU) cache implementation.
///
/// Provides a fixed-size, thread-safe cache that evicts the least recently
/// used entry when a new key would exceed the capacity.
pub mod lru;

pub use config::ConcurrentLruCacheConfig;
pub use entry::CacheEntry;
pub use error::CacheError;
pub use lru::ConcurrentLruCache;
pub use metrics::CacheMetrics;
