//! Cache Entry Type
//!
//! A `CacheEntry<K, V>` is the immutable key/value payload carried by a list
//! node. Nodes are never revived: touching an entry builds a new node, and the
//! new node shares the same `Arc<CacheEntry>` so a touch costs one allocation
//! and no clone of `K` or `V`.
//!
//! Overwriting a key always creates a new entry.

use core::fmt;

/// Immutable key/value pair stored in the cache.
///
/// # Examples
///
/// ```
/// use concurrent_lru::CacheEntry;
///
/// let entry = CacheEntry::new("key", 42);
/// assert_eq!(entry.key, "key");
/// assert_eq!(entry.value, 42);
/// ```
pub struct CacheEntry<K, V> {
    /// The cached key
    pub key: K,

    /// The cached value
    pub value: V,
}

impl<K, V> CacheEntry<K, V> {
    /// Creates a new cache entry.
    #[inline]
    pub fn new(key: K, value: V) -> Self {
        Self { key, value }
    }
}

impl<K: Clone, V: Clone> Clone for CacheEntry<K, V> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            value: self.value.clone(),
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for CacheEntry<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheEntry")
            .field("key", &self.key)
            .field("value", &self.value)
            .finish()
    }
}
