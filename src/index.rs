//! Lock-striped key index.
//!
//! The index maps each resident key to the node currently representing it.
//! Keys are partitioned across independently locked segments, so operations
//! on keys in different segments never contend:
//!
//! ```text
//! hash(key) % N ──▶ ┌───────────┐ ┌───────────┐     ┌───────────┐
//!                   │ Segment 0 │ │ Segment 1 │ ... │ Segment N │
//!                   │ [RwLock]  │ │ [RwLock]  │     │ [RwLock]  │
//!                   │ HashMap   │ │ HashMap   │     │ HashMap   │
//!                   └───────────┘ └───────────┘     └───────────┘
//! ```
//!
//! Unlike a segmented LRU, recency is not tracked here, so lookups only need
//! the shared side of the lock. Every per-key operation (insert, replace,
//! compare-and-replace, compare-and-remove) is atomic under its segment lock.
//!
//! The entry count is adjusted while the segment write lock is held, so it
//! never drops below the number of mapped keys a reader could observe.

use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::sync::atomic::{AtomicUsize, Ordering};
use parking_lot::RwLock;

#[cfg(feature = "hashbrown")]
use hashbrown::DefaultHashBuilder;
#[cfg(feature = "hashbrown")]
use hashbrown::HashMap;

#[cfg(not(feature = "hashbrown"))]
use std::collections::hash_map::RandomState as DefaultHashBuilder;
#[cfg(not(feature = "hashbrown"))]
use std::collections::HashMap;

pub(crate) struct SegmentedIndex<K, N, S = DefaultHashBuilder> {
    segments: Box<[RwLock<HashMap<K, N, S>>]>,
    hash_builder: S,
    count: AtomicUsize,
}

impl<K, N, S> SegmentedIndex<K, N, S> {
    pub(crate) fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Number of mapped keys, without locking.
    #[inline]
    pub(crate) fn count(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }
}

impl<K, N, S> SegmentedIndex<K, N, S>
where
    K: Hash + Eq,
    N: Clone,
    S: BuildHasher + Clone,
{
    pub(crate) fn with_hasher(segment_count: usize, hash_builder: S) -> Self {
        let segments: Vec<_> = (0..segment_count.max(1))
            .map(|_| RwLock::new(HashMap::with_hasher(hash_builder.clone())))
            .collect();
        SegmentedIndex {
            segments: segments.into_boxed_slice(),
            hash_builder,
            count: AtomicUsize::new(0),
        }
    }

    #[inline]
    fn segment<Q>(&self, key: &Q) -> &RwLock<HashMap<K, N, S>>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash,
    {
        let idx = (self.hash_builder.hash_one(key) as usize) % self.segments.len();
        &self.segments[idx]
    }

    /// Sums the segment sizes, locking each in turn.
    pub(crate) fn len(&self) -> usize {
        self.segments.iter().map(|s| s.read().len()).sum()
    }

    pub(crate) fn get<Q>(&self, key: &Q) -> Option<N>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.segment(key).read().get(key).cloned()
    }

    pub(crate) fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.segment(key).read().contains_key(key)
    }

    /// Inserts or overwrites, returning the node previously mapped.
    pub(crate) fn insert(&self, key: K, node: N) -> Option<N> {
        let mut segment = self.segment(&key).write();
        let previous = segment.insert(key, node);
        if previous.is_none() {
            self.count.fetch_add(1, Ordering::AcqRel);
        }
        previous
    }

    /// Overwrites only an existing mapping, returning the node it replaced.
    pub(crate) fn replace<Q>(&self, key: &Q, node: N) -> Option<N>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.segment(key)
            .write()
            .get_mut(key)
            .map(|slot| core::mem::replace(slot, node))
    }

    /// Overwrites the mapping only while `expected` holds for the current
    /// node. Returns whether the swap happened.
    pub(crate) fn replace_if<Q, F>(&self, key: &Q, node: N, expected: F) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        F: FnOnce(&N) -> bool,
    {
        let mut segment = self.segment(key).write();
        match segment.get_mut(key) {
            Some(slot) if expected(slot) => {
                *slot = node;
                true
            }
            _ => false,
        }
    }

    pub(crate) fn remove<Q>(&self, key: &Q) -> Option<N>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let mut segment = self.segment(key).write();
        let removed = segment.remove(key);
        if removed.is_some() {
            self.count.fetch_sub(1, Ordering::AcqRel);
        }
        removed
    }

    /// Removes the mapping only while `expected` holds for the current node.
    pub(crate) fn remove_if<Q, F>(&self, key: &Q, expected: F) -> Option<N>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        F: FnOnce(&N) -> bool,
    {
        let mut segment = self.segment(key).write();
        if !segment.get(key).is_some_and(expected) {
            return None;
        }
        let removed = segment.remove(key);
        if removed.is_some() {
            self.count.fetch_sub(1, Ordering::AcqRel);
        }
        removed
    }

    /// Empties every segment, returning what was mapped.
    pub(crate) fn drain(&self) -> Vec<(K, N)> {
        let mut drained = Vec::new();
        for segment in self.segments.iter() {
            let mut segment = segment.write();
            self.count.fetch_sub(segment.len(), Ordering::AcqRel);
            drained.extend(segment.drain());
        }
        drained
    }
}

impl<K, N, S> fmt::Debug for SegmentedIndex<K, N, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SegmentedIndex")
            .field("segment_count", &self.segments.len())
            .field("count", &self.count())
            .finish()
    }
}
