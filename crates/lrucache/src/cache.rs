//! LRU cache combining a key index with the recency list

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use ahash::RandomState;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::order::{Handle, Iter, OrderList};
use crate::stats::CacheStats;

/// Capacity used by [`LruCache::default`]
pub const DEFAULT_CAPACITY: usize = 10;

/// Fixed-capacity cache that evicts the least recently used entry
///
/// Both [`get`](Self::get) and [`set`](Self::set) count as a use. Once the
/// cache holds `capacity` entries, inserting a new key drops the entry that
/// has gone longest without one.
///
/// ```
/// use lrucache::LruCache;
///
/// let mut cache = LruCache::new(2);
/// cache.set("a", 1);
/// cache.set("b", 2);
/// cache.get("a");
/// cache.set("c", 3);
///
/// assert_eq!(cache.get("b"), None);
/// assert_eq!(cache.get("a"), Some(&1));
/// assert_eq!(cache.get("c"), Some(&3));
/// ```
pub struct LruCache<K, V> {
    /// Key -> handle of the same entry in `order`
    index: HashMap<K, Handle, RandomState>,

    /// Entries from least to most recently used
    order: OrderList<K, V>,

    /// Maximum number of entries
    capacity: usize,

    stats: CacheStats,
}

impl<K, V> LruCache<K, V>
where
    K: Hash + Eq + Clone,
{
    /// Create a new LRU cache with the given capacity
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0. Use [`try_new`](Self::try_new) to get an
    /// error instead.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Capacity must be greater than 0");
        Self::with_capacity(capacity)
    }

    /// Create a new LRU cache, rejecting a zero capacity
    pub fn try_new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::ZeroCapacity);
        }
        Ok(Self::with_capacity(capacity))
    }

    fn with_capacity(capacity: usize) -> Self {
        debug!(capacity, "creating LRU cache");
        Self {
            index: HashMap::with_capacity_and_hasher(capacity, RandomState::new()),
            order: OrderList::with_capacity(capacity),
            capacity,
            stats: CacheStats::new(),
        }
    }

    /// Get a value from the cache, marking it most recently used
    ///
    /// The key may be any borrowed form of the cache's key type.
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let Some(&handle) = self.index.get(key) else {
            self.stats.record_miss();
            return None;
        };

        self.stats.record_hit();
        self.touch(handle);
        self.order.value(handle)
    }

    /// Insert or overwrite a value, marking it most recently used
    ///
    /// Inserting a new key into a full cache evicts the least recently used
    /// entry first.
    pub fn set(&mut self, key: K, value: V) {
        if let Some(&handle) = self.index.get(&key) {
            // Write through the handle; the index already points at this entry
            if let Some(slot) = self.order.value_mut(handle) {
                *slot = value;
            }
            self.touch(handle);
            self.stats.record_update();
            return;
        }

        if self.order.len() >= self.capacity {
            self.evict_lru();
        }

        let handle = self.order.push_back(key.clone(), value);
        self.index.insert(key, handle);
        self.stats.record_insert();
    }

    /// Get a value without changing its recency
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index
            .get(key)
            .and_then(|&handle| self.order.value(handle))
    }

    /// Check whether a key is cached without changing its recency
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.contains_key(key)
    }

    /// Remove a key from the cache
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let handle = self.index.remove(key)?;
        self.order.remove(handle).map(|(_, value)| value)
    }

    /// The entry that the next eviction would drop
    pub fn peek_lru(&self) -> Option<(&K, &V)> {
        self.order.front()
    }

    /// Clear the cache (statistics are kept)
    pub fn clear(&mut self) {
        debug!(len = self.order.len(), "clearing LRU cache");
        self.index.clear();
        self.order.clear();
    }

    fn touch(&mut self, handle: Handle) {
        self.order.move_to_back(handle);
    }

    fn evict_lru(&mut self) {
        if let Some((key, _value)) = self.order.pop_front() {
            self.index.remove(&key);
            self.stats.record_eviction();
            trace!(len = self.order.len(), "evicted least recently used entry");
        }
    }
}

impl<K, V> LruCache<K, V> {
    /// Get the current number of entries
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.order.len() == 0
    }

    /// Get the maximum number of entries
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterate over entries from least to most recently used
    ///
    /// Iterating does not count as a use.
    pub fn iter(&self) -> Iter<'_, K, V> {
        self.order.iter()
    }

    /// Get cache statistics
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Reset cache statistics
    pub fn reset_stats(&mut self) {
        self.stats.reset();
    }
}

impl<K, V> Default for LruCache<K, V>
where
    K: Hash + Eq + Clone,
{
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl<K, V> fmt::Debug for LruCache<K, V>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'a, K, V> IntoIterator for &'a LruCache<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Check that the index and the recency list describe the same entries
    fn assert_consistent<K, V>(cache: &LruCache<K, V>)
    where
        K: Hash + Eq + Clone + fmt::Debug,
    {
        cache.order.check_links();
        assert!(cache.len() <= cache.capacity());
        assert_eq!(cache.index.len(), cache.order.len());

        for (position, (key, _)) in cache.iter().enumerate() {
            assert_eq!(
                cache.index.get(key).copied(),
                cache.order.handle_at(position),
                "index handle for {:?} does not point at its entry",
                key
            );
        }
    }

    fn keys<V>(cache: &LruCache<&'static str, V>) -> Vec<&'static str> {
        cache.iter().map(|(k, _)| *k).collect()
    }

    #[test]
    fn test_lru_basic() {
        let mut cache = LruCache::new(2);

        cache.set(1, "a");
        cache.set(2, "b");

        assert_eq!(cache.get(&1), Some(&"a"));
        assert_eq!(cache.get(&2), Some(&"b"));
        assert_eq!(cache.len(), 2);
        assert_consistent(&cache);
    }

    #[test]
    fn test_lru_eviction() {
        let mut cache = LruCache::new(2);

        cache.set(1, "a");
        cache.set(2, "b");
        cache.set(3, "c"); // Should evict 1

        assert_eq!(cache.get(&1), None);
        assert_eq!(cache.get(&2), Some(&"b"));
        assert_eq!(cache.get(&3), Some(&"c"));
        assert_eq!(cache.stats().evictions(), 1);
        assert_consistent(&cache);
    }

    #[test]
    fn test_move_on_read() {
        let mut cache = LruCache::new(2);

        cache.set("a", 1);
        cache.set("b", 2);
        cache.get("a");
        cache.set("c", 3); // Should evict b

        assert_eq!(cache.get("a"), Some(&1));
        assert_eq!(cache.get("c"), Some(&3));
        assert_eq!(cache.get("b"), None);
        assert_consistent(&cache);
    }

    #[test]
    fn test_overwrite_preserves_identity() {
        let mut cache = LruCache::new(2);

        cache.set("k", 1);
        cache.set("k", 2);

        assert_eq!(cache.get("k"), Some(&2));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats().inserts(), 1);
        assert_eq!(cache.stats().updates(), 1);
        assert_consistent(&cache);
    }

    #[test]
    fn test_overwrite_updates_the_right_entry() {
        let mut cache = LruCache::new(3);

        cache.set("a", 1);
        cache.set("b", 2);
        cache.set("c", 3);
        cache.set("a", 10);

        assert_eq!(keys(&cache), vec!["b", "c", "a"]);
        assert_eq!(cache.peek("a"), Some(&10));
        assert_eq!(cache.peek("b"), Some(&2));
        assert_eq!(cache.peek("c"), Some(&3));
        assert_consistent(&cache);
    }

    #[test]
    fn test_eviction_after_mutation() {
        let mut cache = LruCache::new(1);

        cache.set("a", 1);
        cache.set("a", 2);
        cache.set("b", 3);

        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("b"), Some(&3));
        assert_eq!(cache.len(), 1);
        assert_consistent(&cache);
    }

    #[test]
    fn test_eviction_with_equal_values() {
        let mut cache = LruCache::new(2);

        cache.set("a", 7);
        cache.set("b", 7);
        cache.set("c", 7); // Only a goes

        assert_eq!(keys(&cache), vec!["b", "c"]);
        assert!(cache.contains_key("b"));
        assert_consistent(&cache);
    }

    #[test]
    fn test_miss_on_empty() {
        let mut cache: LruCache<&str, i32> = LruCache::new(4);

        assert_eq!(cache.get("z"), None);
        assert_eq!(cache.len(), 0);
        assert!(cache.is_empty());
        assert_eq!(cache.stats().misses(), 1);
        assert_consistent(&cache);
    }

    #[test]
    fn test_idempotent_move() {
        let mut cache = LruCache::new(3);

        cache.set("a", 1);
        cache.set("b", 2);
        cache.set("c", 3);

        for _ in 0..5 {
            assert_eq!(cache.get("c"), Some(&3));
        }

        assert_eq!(keys(&cache), vec!["a", "b", "c"]);
        assert_eq!(cache.len(), 3);
        assert_consistent(&cache);
    }

    #[test]
    fn test_peek_does_not_promote() {
        let mut cache = LruCache::new(2);

        cache.set("a", 1);
        cache.set("b", 2);
        assert_eq!(cache.peek("a"), Some(&1));
        assert!(cache.contains_key("a"));
        cache.set("c", 3);

        assert_eq!(cache.peek("a"), None);
        assert_eq!(cache.stats().hits(), 0);
    }

    #[test]
    fn test_peek_lru() {
        let mut cache = LruCache::new(3);
        assert_eq!(cache.peek_lru(), None);

        cache.set("a", 1);
        cache.set("b", 2);
        assert_eq!(cache.peek_lru(), Some((&"a", &1)));

        cache.get("a");
        assert_eq!(cache.peek_lru(), Some((&"b", &2)));
    }

    #[test]
    fn test_lru_remove() {
        let mut cache = LruCache::new(3);

        cache.set(1, "a");
        cache.set(2, "b");
        cache.set(3, "c");

        assert_eq!(cache.remove(&2), Some("b"));
        assert_eq!(cache.remove(&2), None);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&2), None);
        assert_consistent(&cache);

        // The freed slot is reused without eviction
        cache.set(4, "d");
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.stats().evictions(), 0);
        assert_eq!(cache.order.slot_count(), 3);
        assert_consistent(&cache);
    }

    #[test]
    fn test_evicted_key_comes_back_fresh() {
        let mut cache = LruCache::new(1);

        cache.set("a", 1);
        cache.set("b", 2);
        cache.set("a", 3);

        assert_eq!(cache.get("a"), Some(&3));
        assert_eq!(cache.stats().inserts(), 3);
        assert_eq!(cache.stats().updates(), 0);
        assert_eq!(cache.stats().evictions(), 2);
    }

    #[test]
    fn test_lru_clear() {
        let mut cache = LruCache::new(3);

        cache.set(1, "a");
        cache.set(2, "b");
        cache.get(&1);
        cache.clear();

        assert_eq!(cache.len(), 0);
        assert!(cache.is_empty());
        assert_eq!(cache.get(&1), None);
        assert_eq!(cache.stats().hits(), 1);
        assert_consistent(&cache);

        cache.set(3, "c");
        assert_eq!(cache.get(&3), Some(&"c"));
    }

    #[test]
    fn test_borrowed_lookup() {
        let mut cache = LruCache::new(2);
        cache.set("alpha".to_string(), 1);

        assert_eq!(cache.get("alpha"), Some(&1));
        assert_eq!(cache.remove("alpha"), Some(1));
    }

    #[test]
    fn test_try_new_zero() {
        assert_eq!(
            LruCache::<u32, u32>::try_new(0).err(),
            Some(Error::ZeroCapacity)
        );
        assert_eq!(LruCache::<u32, u32>::try_new(5).unwrap().capacity(), 5);
    }

    #[test]
    #[should_panic(expected = "Capacity must be greater than 0")]
    fn test_new_zero_panics() {
        let _ = LruCache::<u32, u32>::new(0);
    }

    #[test]
    fn test_default_capacity() {
        let cache: LruCache<u32, u32> = LruCache::default();
        assert_eq!(cache.capacity(), DEFAULT_CAPACITY);
    }

    #[test]
    fn test_debug_in_recency_order() {
        let mut cache = LruCache::new(3);
        cache.set("a", 1);
        cache.set("b", 2);
        cache.get("a");

        assert_eq!(format!("{:?}", cache), r#"{"b": 2, "a": 1}"#);
    }

    #[test]
    fn test_iter_rev() {
        let mut cache = LruCache::new(3);
        cache.set("a", 1);
        cache.set("b", 2);
        cache.set("c", 3);

        let mru_first: Vec<_> = cache.iter().rev().map(|(k, _)| *k).collect();
        assert_eq!(mru_first, vec!["c", "b", "a"]);
        assert_eq!((&cache).into_iter().len(), 3);
    }

    #[test]
    fn test_mixed_workload_matches_model() {
        const CAPACITY: usize = 8;

        let mut cache = LruCache::new(CAPACITY);
        // Model: keys from least to most recently used
        let mut model: Vec<(u32, u32)> = Vec::new();

        let mut seed: u32 = 0x2545_f491;
        let mut next = || {
            seed ^= seed << 13;
            seed ^= seed >> 17;
            seed ^= seed << 5;
            seed
        };

        for step in 0..2_000 {
            let key = next() % 20;
            match next() % 3 {
                0 => {
                    let pos = model.iter().position(|(k, _)| *k == key);
                    let expected = pos.map(|pos| {
                        let entry = model.remove(pos);
                        model.push(entry);
                        entry.1
                    });
                    assert_eq!(cache.get(&key).copied(), expected, "step {}", step);
                }
                1 => {
                    let pos = model.iter().position(|(k, _)| *k == key);
                    let expected = pos.map(|pos| model.remove(pos).1);
                    assert_eq!(cache.remove(&key), expected, "step {}", step);
                }
                _ => {
                    if let Some(pos) = model.iter().position(|(k, _)| *k == key) {
                        model.remove(pos);
                    } else if model.len() == CAPACITY {
                        model.remove(0);
                    }
                    model.push((key, step));
                    cache.set(key, step);
                }
            }

            assert_consistent(&cache);
            let actual: Vec<(u32, u32)> = cache.iter().map(|(k, v)| (*k, *v)).collect();
            assert_eq!(actual, model, "step {}", step);
        }

        assert!(cache.order.slot_count() <= CAPACITY);
    }
}
