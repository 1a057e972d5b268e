//! Concurrent LRU Cache Implementation
//!
//! A thread-safe, fixed-capacity LRU cache with global recency ordering. Keys
//! resolve through a lock-striped index to nodes of a single shared recency
//! list, so there is no exclusive cache-wide lock.
//!
//! # How It Works
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                      ConcurrentLruCache                              │
//! │                                                                      │
//! │   key ──▶ SegmentedIndex (RwLock<HashMap> per segment)              │
//! │                 │                                                    │
//! │                 ▼ node handle                                        │
//! │   head ──▶ [n] ──▶ [n] ──▶ [n] ──▶ ... ──▶ [sentinel]               │
//! │   (CAS)       per-node locks for splicing      (LRU anchor)          │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **Insert**: index the new node, CAS it onto the head, then evict from the
//!   tail while the cache is over capacity.
//! - **Touch** (hit or overwrite): nodes are never moved. The old node is
//!   invalidated (a one-way transition) and a fresh node sharing the same
//!   entry is pushed onto the head. The index is switched to the fresh node
//!   with a compare-and-replace, so a key removed meanwhile is not revived.
//! - **Evict**: invalidate the oldest Valid node, then drop its key from the
//!   index only if the index still points at that exact node.
//!
//! # Trade-offs
//!
//! - **Pros**: global LRU order, lock-free head insertion, lookups on
//!   different keys never block each other.
//! - **Cons**: every hit allocates a node; two concurrent touches may land in
//!   either order; `len()` can briefly exceed `capacity` while a `put` is
//!   evicting.
//!
//! # Example
//!
//! ```rust
//! use concurrent_lru::ConcurrentLruCache;
//! use std::sync::Arc;
//! use std::thread;
//!
//! let cache = Arc::new(ConcurrentLruCache::new(1000).unwrap());
//!
//! let handles: Vec<_> = (0..4).map(|i| {
//!     let cache = Arc::clone(&cache);
//!     thread::spawn(move || {
//!         for j in 0..100 {
//!             cache.put(format!("key-{}-{}", i, j), j);
//!         }
//!     })
//! }).collect();
//!
//! for h in handles {
//!     h.join().unwrap();
//! }
//!
//! assert_eq!(cache.len(), 400);
//! ```

use crate::config::ConcurrentLruCacheConfig;
use crate::entry::CacheEntry;
use crate::error::CacheError;
use crate::index::SegmentedIndex;
use crate::list::{ConcurrentRecencyList, Touch};
use crate::metrics::{CacheMetrics, CoreCacheMetrics, LruCacheMetrics};
use crate::node::Node;
use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};
use crossbeam_utils::Backoff;
use log::{debug, trace};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[cfg(feature = "hashbrown")]
use hashbrown::DefaultHashBuilder;

#[cfg(not(feature = "hashbrown"))]
use std::collections::hash_map::RandomState as DefaultHashBuilder;

type SharedEntry<K, V> = Arc<CacheEntry<K, V>>;
type EntryNode<K, V> = Node<SharedEntry<K, V>>;

/// A thread-safe LRU cache with a fixed entry capacity.
///
/// # Type Parameters
///
/// - `K`: Key type. Must implement `Hash + Eq + Clone`.
/// - `V`: Value type. Must implement `Clone`; lookups return clones.
/// - `S`: Hash builder type for the index. Defaults to `DefaultHashBuilder`.
///
/// # Example
///
/// ```rust
/// use concurrent_lru::ConcurrentLruCache;
///
/// let cache = ConcurrentLruCache::new(2).unwrap();
/// cache.put("a", 1);
/// cache.put("b", 2);
/// assert_eq!(cache.get(&"a"), Some(1)); // "a" becomes most recently used
/// cache.put("c", 3);                    // "b" is evicted
/// assert!(!cache.contains_key(&"b"));
/// assert!(cache.contains_key(&"a"));
/// assert!(cache.contains_key(&"c"));
/// ```
pub struct ConcurrentLruCache<K, V, S = DefaultHashBuilder> {
    index: SegmentedIndex<K, Arc<EntryNode<K, V>>, S>,
    list: ConcurrentRecencyList<SharedEntry<K, V>>,
    capacity: usize,
    /// Overflow units claimed by evictions still looking for a victim.
    evicting: AtomicUsize,
    metrics: LruCacheMetrics,
}

impl<K, V> ConcurrentLruCache<K, V, DefaultHashBuilder>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    /// Creates a cache holding at most `capacity` entries.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::InvalidConfiguration`] if `capacity` is zero.
    ///
    /// # Example
    ///
    /// ```rust
    /// use concurrent_lru::{CacheError, ConcurrentLruCache};
    ///
    /// let cache: ConcurrentLruCache<u32, u32> = ConcurrentLruCache::new(16).unwrap();
    /// assert_eq!(cache.capacity(), 16);
    ///
    /// let err = ConcurrentLruCache::<u32, u32>::new(0).unwrap_err();
    /// assert!(matches!(err, CacheError::InvalidConfiguration { .. }));
    /// ```
    pub fn new(capacity: usize) -> Result<Self, CacheError> {
        Self::init(ConcurrentLruCacheConfig::new(capacity), None)
    }

    /// Creates a cache from a configuration with an optional hasher.
    ///
    /// # Arguments
    ///
    /// * `config` - Capacity and index segment count
    /// * `hasher` - Optional hash builder. If `None`, uses `DefaultHashBuilder`
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::InvalidConfiguration`] if the configuration does
    /// not validate.
    pub fn init(
        config: ConcurrentLruCacheConfig,
        hasher: Option<DefaultHashBuilder>,
    ) -> Result<Self, CacheError> {
        Self::init_with_hasher(config, hasher.unwrap_or_default())
    }
}

impl<K, V, S> ConcurrentLruCache<K, V, S>
where
    K: Hash + Eq + Clone,
    V: Clone,
    S: BuildHasher + Clone,
{
    /// Creates a cache with a custom hash builder.
    ///
    /// Use this for deterministic hashing or DoS-resistant hashers.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::InvalidConfiguration`] if the configuration does
    /// not validate.
    pub fn init_with_hasher(
        config: ConcurrentLruCacheConfig,
        hash_builder: S,
    ) -> Result<Self, CacheError> {
        config.validate()?;
        debug!(
            "creating concurrent LRU cache: capacity={}, segments={}",
            config.capacity, config.segments
        );
        Ok(Self {
            index: SegmentedIndex::with_hasher(config.segments, hash_builder),
            list: ConcurrentRecencyList::new(),
            capacity: config.capacity,
            evicting: AtomicUsize::new(0),
            metrics: LruCacheMetrics::new(),
        })
    }

    /// Returns the maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of segments in the key index.
    pub fn segment_count(&self) -> usize {
        self.index.segment_count()
    }

    /// Returns the number of resident entries.
    pub fn len(&self) -> usize {
        self.index.count()
    }

    /// Returns `true` if the cache contains no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Retrieves a clone of the value and marks the key most recently used.
    ///
    /// A miss does not change any structure.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get_with(key, V::clone)
    }

    /// Applies `f` to the value and marks the key most recently used.
    ///
    /// Avoids cloning `V` when only part of the value is needed.
    ///
    /// # Example
    ///
    /// ```rust
    /// use concurrent_lru::ConcurrentLruCache;
    ///
    /// let cache = ConcurrentLruCache::new(8).unwrap();
    /// cache.put("greeting".to_string(), "hello world".to_string());
    /// assert_eq!(cache.get_with("greeting", |v: &String| v.len()), Some(11));
    /// ```
    pub fn get_with<Q, F, R>(&self, key: &Q, f: F) -> Option<R>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        F: FnOnce(&V) -> R,
    {
        let Some(node) = self.index.get(key) else {
            self.metrics.record_miss();
            return None;
        };
        let Some(entry) = node.payload().cloned() else {
            self.metrics.record_miss();
            return None;
        };
        self.metrics.record_hit();
        self.touch(key, &node, &entry);
        Some(f(&entry.value))
    }

    /// Retrieves a clone of the value without changing recency.
    pub fn peek<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let node = self.index.get(key)?;
        node.payload().map(|entry| entry.value.clone())
    }

    /// Indexer-style lookup: like [`get`](Self::get), but a miss is an error.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::KeyNotFound`] if the key is not resident.
    pub fn try_get<Q>(&self, key: &Q) -> Result<V, CacheError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get(key).ok_or(CacheError::KeyNotFound)
    }

    /// Checks whether the key is resident without changing recency.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.index.contains_key(key)
    }

    /// Inserts a key-value pair and marks it most recently used.
    ///
    /// Overwriting a resident key replaces its entry and never evicts. A new
    /// key evicts least recently used entries until the cache is back within
    /// capacity.
    ///
    /// # Returns
    ///
    /// - `Some(old_value)` if the key was resident
    /// - `None` if the key was new
    pub fn put(&self, key: K, value: V) -> Option<V> {
        let node = Self::new_node(key.clone(), value);
        match self.index.insert(key, Arc::clone(&node)) {
            Some(previous) => {
                self.supersede(&previous, &node);
                previous.payload().map(|entry| entry.value.clone())
            }
            None => {
                self.metrics.record_insertion();
                self.list.add_first(&node);
                self.evict_overflow();
                None
            }
        }
    }

    /// Indexer-style assignment: overwrites a resident key only.
    ///
    /// The key becomes most recently used.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::KeyNotFound`] if the key is not resident; the
    /// cache is left unchanged.
    pub fn try_update(&self, key: K, value: V) -> Result<V, CacheError> {
        let node = Self::new_node(key.clone(), value);
        let previous = self
            .index
            .replace(&key, Arc::clone(&node))
            .ok_or(CacheError::KeyNotFound)?;
        self.supersede(&previous, &node);
        previous
            .payload()
            .map(|entry| entry.value.clone())
            .ok_or(CacheError::KeyNotFound)
    }

    /// Removes a key, returning its value if it was resident.
    ///
    /// If the key was the most recently used, its list node (and the value)
    /// is released only when the next insertion or touch splices it out.
    pub fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let node = self.index.remove(key)?;
        self.metrics.record_removal();
        self.list.remove(&node);
        node.payload().map(|entry| entry.value.clone())
    }

    /// Removes every entry.
    ///
    /// Entries inserted concurrently with the call may survive it.
    pub fn clear(&self) {
        let drained = self.index.drain();
        debug!("clearing {} cache entries", drained.len());
        for (_, node) in drained {
            self.metrics.record_removal();
            self.list.remove(&node);
        }
    }

    /// Resident keys from most to least recently used.
    ///
    /// Exact only while no other thread is mutating the cache.
    pub fn keys(&self) -> Vec<K> {
        self.list
            .snapshot()
            .into_iter()
            .map(|entry| entry.key.clone())
            .collect()
    }

    /// Returns a copy of the current counters.
    pub fn metrics_snapshot(&self) -> CoreCacheMetrics {
        self.metrics.snapshot()
    }

    /// Checks that the index and the recency list agree.
    ///
    /// Verifies that the forward and backward list walks see the same Valid
    /// nodes, that every one of them is the node indexed under its key, and
    /// that the counts match and respect capacity. Call it only while no
    /// other thread is using the cache; in-flight operations legitimately
    /// leave the two structures out of step.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::InvariantViolation`] describing the first
    /// mismatch found.
    pub fn check_invariants(&self) -> Result<(), CacheError> {
        let resident = self
            .list
            .check_links()
            .map_err(CacheError::InvariantViolation)?;
        let indexed = self.index.len();
        let counted = self.index.count();

        if indexed != counted {
            return Err(CacheError::InvariantViolation(format!(
                "index holds {} keys but the length counter is {}",
                indexed, counted
            )));
        }
        if resident.len() != indexed {
            return Err(CacheError::InvariantViolation(format!(
                "list holds {} valid nodes but the index holds {} keys",
                resident.len(),
                indexed
            )));
        }
        if counted > self.capacity {
            return Err(CacheError::InvariantViolation(format!(
                "{} entries exceed capacity {}",
                counted, self.capacity
            )));
        }
        for node in &resident {
            let Some(entry) = node.payload() else {
                return Err(CacheError::InvariantViolation(
                    "sentinel reported as a resident node".into(),
                ));
            };
            let indexed_here = self
                .index
                .get(&entry.key)
                .is_some_and(|current| Arc::ptr_eq(&current, node));
            if !indexed_here {
                return Err(CacheError::InvariantViolation(
                    "valid list node is not the node indexed under its key".into(),
                ));
            }
        }
        Ok(())
    }

    fn new_node(key: K, value: V) -> Arc<EntryNode<K, V>> {
        Arc::new(Node::new(Arc::new(CacheEntry::new(key, value))))
    }

    /// Retires `node` in favor of a fresh node sharing its entry, unless the
    /// index moved on from `node` in the meantime.
    fn touch<Q>(&self, key: &Q, node: &Arc<EntryNode<K, V>>, entry: &SharedEntry<K, V>)
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let outcome = self.list.remove_and_add_first_with(node, || {
            let fresh = Arc::new(Node::new(Arc::clone(entry)));
            self.index
                .replace_if(key, Arc::clone(&fresh), |current| Arc::ptr_eq(current, node))
                .then_some(fresh)
        });
        if outcome == Touch::Raced {
            trace!("touch skipped: entry already being replaced or removed");
        }
    }

    /// Publishes `node` at the head and retires the node it replaced in the
    /// index.
    fn supersede(&self, previous: &Arc<EntryNode<K, V>>, node: &Arc<EntryNode<K, V>>) {
        self.metrics.record_update();
        self.list.add_first(node);
        self.list.remove(previous);
    }

    /// Evicts until the cache is back within capacity.
    ///
    /// Each eviction first claims one unit of overflow, so concurrent puts
    /// never evict more than they overfilled.
    fn evict_overflow(&self) {
        while self.claim_overflow() {
            self.evict_one();
        }
    }

    fn claim_overflow(&self) -> bool {
        self.evicting
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |evicting| {
                (self.index.count() > self.capacity + evicting).then(|| evicting + 1)
            })
            .is_ok()
    }

    /// Removes one victim for a claim taken by `claim_overflow`.
    fn evict_one(&self) {
        let backoff = Backoff::new();
        loop {
            let Some(victim) = self.list.remove_last() else {
                if self.index.count() <= self.capacity {
                    // Removals already brought the cache back within capacity.
                    self.evicting.fetch_sub(1, Ordering::AcqRel);
                    trace!("eviction claim released, cache within capacity");
                    return;
                }
                // Every counted entry is still being published by a put, an
                // overwrite or a touch; wait for one to appear.
                backoff.snooze();
                continue;
            };
            let Some(entry) = victim.payload() else {
                continue;
            };
            // A victim superseded by an overwrite or already removed keeps the
            // claim alive for the next candidate.
            let evicted = self
                .index
                .remove_if(&entry.key, |current| Arc::ptr_eq(current, &victim))
                .is_some();
            if evicted {
                // The index count drops first, so no other put can claim the
                // same unit of overflow twice.
                self.evicting.fetch_sub(1, Ordering::AcqRel);
                self.metrics.record_eviction();
                trace!("evicted least recently used entry");
                return;
            }
        }
    }
}

impl<K, V, S> CacheMetrics for ConcurrentLruCache<K, V, S>
where
    K: Hash + Eq + Clone,
    V: Clone,
    S: BuildHasher + Clone,
{
    fn metrics(&self) -> BTreeMap<String, f64> {
        let mut metrics = self.metrics.metrics();
        metrics.insert("capacity".to_string(), self.capacity as f64);
        metrics.insert("entries".to_string(), self.len() as f64);
        metrics
    }

    fn algorithm_name(&self) -> &'static str {
        "ConcurrentLRU"
    }
}

impl<K, V, S> core::fmt::Debug for ConcurrentLruCache<K, V, S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ConcurrentLruCache")
            .field("capacity", &self.capacity)
            .field("len", &self.index.count())
            .field("segment_count", &self.index.segment_count())
            .finish()
    }
}
