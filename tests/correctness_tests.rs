//! Correctness Tests for the Concurrent LRU Cache
//!
//! Single-threaded checks of the eviction policy using simple, predictable
//! access patterns. Each test explicitly validates which key gets evicted
//! when a put causes an eviction.
//!
//! ## Test Strategy
//! - Small cache sizes (1-5 entries) for predictable behavior
//! - Explicit checks for which key was evicted after each put
//! - A long pseudo-random run compared step by step against a plain
//!   sequential LRU model

use concurrent_lru::{
    CacheEntry, CacheError, CacheMetrics, ConcurrentLruCache, ConcurrentLruCacheConfig,
};
use std::collections::VecDeque;

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Helper to create a cache with the given capacity
fn make_lru<K: std::hash::Hash + Eq + Clone, V: Clone>(cap: usize) -> ConcurrentLruCache<K, V> {
    let config = ConcurrentLruCacheConfig::new(cap).with_segments(4);
    ConcurrentLruCache::init(config, None).unwrap()
}

/// Sequential reference model: most recently used at the front.
struct ModelLru {
    capacity: usize,
    entries: VecDeque<CacheEntry<u32, u32>>,
}

impl ModelLru {
    fn new(capacity: usize) -> Self {
        ModelLru {
            capacity,
            entries: VecDeque::new(),
        }
    }

    fn position(&self, key: u32) -> Option<usize> {
        self.entries.iter().position(|e| e.key == key)
    }

    fn get(&mut self, key: u32) -> Option<u32> {
        let idx = self.position(key)?;
        let entry = self.entries.remove(idx)?;
        let value = entry.value;
        self.entries.push_front(entry);
        Some(value)
    }

    fn put(&mut self, key: u32, value: u32) -> Option<u32> {
        let previous = self
            .position(key)
            .and_then(|idx| self.entries.remove(idx))
            .map(|e| e.value);
        self.entries.push_front(CacheEntry::new(key, value));
        if previous.is_none() && self.entries.len() > self.capacity {
            self.entries.pop_back();
        }
        previous
    }

    fn remove(&mut self, key: u32) -> Option<u32> {
        let idx = self.position(key)?;
        self.entries.remove(idx).map(|e| e.value)
    }

    fn keys(&self) -> Vec<u32> {
        self.entries.iter().map(|e| e.key).collect()
    }
}

/// Deterministic xorshift sequence so failures reproduce.
struct XorShift(u64);

impl XorShift {
    fn next(&mut self) -> u64 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 7;
        self.0 ^= self.0 << 17;
        self.0
    }
}

// ============================================================================
// CONSTRUCTION
// ============================================================================

#[test]
fn test_zero_capacity_rejected() {
    let err = ConcurrentLruCache::<u32, u32>::new(0).unwrap_err();
    assert!(matches!(err, CacheError::InvalidConfiguration { .. }));
}

#[test]
fn test_zero_segments_rejected() {
    let config = ConcurrentLruCacheConfig::new(10).with_segments(0);
    let err = ConcurrentLruCache::<u32, u32>::init(config, None).unwrap_err();
    assert!(matches!(err, CacheError::InvalidConfiguration { .. }));
}

#[test]
fn test_new_cache_is_empty() {
    let cache: ConcurrentLruCache<u32, u32> = ConcurrentLruCache::new(3).unwrap();
    assert_eq!(cache.capacity(), 3);
    assert_eq!(cache.len(), 0);
    assert!(cache.is_empty());
    assert!(cache.keys().is_empty());
    cache.check_invariants().unwrap();
}

// ============================================================================
// EVICTION ORDER
// ============================================================================

/// capacity 2: put A, put B, get A, put C evicts B.
#[test]
fn test_touched_entry_survives_eviction() {
    let cache = make_lru(2);
    cache.put("A", 1);
    cache.put("B", 2);
    assert_eq!(cache.get(&"A"), Some(1));
    cache.put("C", 3);

    assert!(!cache.contains_key(&"B"));
    assert!(cache.contains_key(&"A"));
    assert!(cache.contains_key(&"C"));
    assert_eq!(cache.len(), 2);
    cache.check_invariants().unwrap();
}

/// capacity 1: overwriting a key replaces the value without evicting.
#[test]
fn test_single_slot_overwrite() {
    let cache = make_lru(1);
    cache.put("A", 1);
    cache.put("A", 2);
    assert_eq!(cache.get(&"A"), Some(2));
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.metrics_snapshot().evictions, 0);
}

/// Inserting capacity + k distinct keys keeps exactly the last capacity keys.
#[test]
fn test_sequential_inserts_evict_oldest_first() {
    let capacity = 5;
    let cache = make_lru(capacity);

    for i in 0..capacity as u32 {
        cache.put(i, i);
    }
    for i in capacity as u32..20 {
        cache.put(i, i);
        let evicted = i - capacity as u32;
        assert!(!cache.contains_key(&evicted), "key {} should be evicted", evicted);
        assert!(cache.contains_key(&(evicted + 1)));
    }

    assert_eq!(cache.keys(), vec![19, 18, 17, 16, 15]);
    assert_eq!(cache.metrics_snapshot().evictions, 15);
    cache.check_invariants().unwrap();
}

#[test]
fn test_lru_evicts_least_recently_used() {
    let cache = make_lru(3);

    cache.put("a", 1);
    cache.put("b", 2);
    cache.put("c", 3);

    // Touch "a" and "b"; "c" is now least recently used
    cache.get(&"a");
    cache.get(&"b");

    cache.put("d", 4);
    assert!(!cache.contains_key(&"c"), "c should be evicted");
    assert_eq!(cache.keys(), vec!["d", "b", "a"]);

    cache.put("e", 5);
    assert!(!cache.contains_key(&"a"), "a should be evicted");
    assert_eq!(cache.keys(), vec!["e", "d", "b"]);
}

#[test]
fn test_repeated_touch_of_head_is_stable() {
    let cache = make_lru(3);
    cache.put(1, "one");
    cache.put(2, "two");
    for _ in 0..10 {
        assert_eq!(cache.get(&2), Some("two"));
    }
    assert_eq!(cache.keys(), vec![2, 1]);
    cache.check_invariants().unwrap();
}

#[test]
fn test_peek_does_not_protect_from_eviction() {
    let cache = make_lru(2);
    cache.put("a", 1);
    cache.put("b", 2);
    assert_eq!(cache.peek(&"a"), Some(1));
    cache.put("c", 3);
    assert_eq!(cache.peek(&"a"), None);
}

#[test]
fn test_overwrite_promotes_without_eviction() {
    let cache = make_lru(3);
    cache.put("a", 1);
    cache.put("b", 2);
    cache.put("c", 3);

    assert_eq!(cache.put("a", 10), Some(1));
    assert_eq!(cache.len(), 3);
    assert_eq!(cache.keys(), vec!["a", "c", "b"]);

    cache.put("d", 4);
    assert!(!cache.contains_key(&"b"));
    assert_eq!(cache.get(&"a"), Some(10));
}

#[test]
fn test_remove_frees_a_slot() {
    let cache = make_lru(2);
    cache.put("a", 1);
    cache.put("b", 2);
    assert_eq!(cache.remove(&"a"), Some(1));
    cache.put("c", 3);

    assert!(cache.contains_key(&"b"));
    assert!(cache.contains_key(&"c"));
    assert_eq!(cache.metrics_snapshot().evictions, 0);
    cache.check_invariants().unwrap();
}

#[test]
fn test_remove_from_every_position() {
    for victim in 0..4u32 {
        let cache = make_lru(4);
        for i in 0..4u32 {
            cache.put(i, i);
        }
        assert_eq!(cache.remove(&victim), Some(victim));
        let expected: Vec<u32> = (0..4u32).rev().filter(|k| *k != victim).collect();
        assert_eq!(cache.keys(), expected);
        cache.check_invariants().unwrap();
    }
}

// ============================================================================
// INDEXER-STYLE ACCESS
// ============================================================================

#[test]
fn test_try_get_reports_missing_key() {
    let cache = make_lru(2);
    cache.put("a", 1);
    assert_eq!(cache.try_get(&"a"), Ok(1));
    assert_eq!(cache.try_get(&"z"), Err(CacheError::KeyNotFound));
}

#[test]
fn test_try_update_only_touches_resident_keys() {
    let cache = make_lru(2);
    assert_eq!(cache.try_update("a", 1), Err(CacheError::KeyNotFound));
    assert!(!cache.contains_key(&"a"));

    cache.put("a", 1);
    cache.put("b", 2);
    assert_eq!(cache.try_update("a", 3), Ok(1));
    assert_eq!(cache.keys(), vec!["a", "b"]);
    assert_eq!(cache.peek(&"a"), Some(3));
}

// ============================================================================
// CLEAR AND METRICS
// ============================================================================

#[test]
fn test_clear_then_reuse() {
    let cache = make_lru(3);
    for i in 0..3 {
        cache.put(i, i);
    }
    cache.clear();
    assert!(cache.is_empty());
    cache.check_invariants().unwrap();

    for i in 10..15 {
        cache.put(i, i);
    }
    assert_eq!(cache.keys(), vec![14, 13, 12]);
    cache.check_invariants().unwrap();

    let metrics = cache.metrics_snapshot();
    assert_eq!(metrics.removals, 3);
    assert_eq!(metrics.evictions, 2);
    assert_eq!(metrics.resident_entries(), 3);
}

#[test]
fn test_metrics_report() {
    let cache = make_lru(2);
    cache.put(1, 1);
    cache.get(&1);
    cache.get(&2);
    cache.put(1, 5);

    let report = cache.metrics();
    assert_eq!(report["requests"], 2.0);
    assert_eq!(report["cache_hits"], 1.0);
    assert_eq!(report["hit_rate"], 0.5);
    assert_eq!(report["updates"], 1.0);
    assert_eq!(report["entries"], 1.0);
}

// ============================================================================
// DIFFERENTIAL CHECK
// ============================================================================

#[test]
fn test_matches_sequential_model() {
    for capacity in [1, 2, 3, 8, 17] {
        let cache = make_lru(capacity);
        let mut model = ModelLru::new(capacity);
        let mut rng = XorShift(0x9E37_79B9_7F4A_7C15 ^ capacity as u64);

        for step in 0..5_000u32 {
            let key = (rng.next() % 24) as u32;
            match rng.next() % 10 {
                0..=3 => assert_eq!(cache.put(key, step), model.put(key, step)),
                4..=7 => assert_eq!(cache.get(&key), model.get(key)),
                8 => assert_eq!(cache.remove(&key), model.remove(key)),
                _ => assert_eq!(cache.contains_key(&key), model.position(key).is_some()),
            }
            assert_eq!(cache.keys(), model.keys(), "diverged at step {}", step);
        }
        cache.check_invariants().unwrap();
    }
}
