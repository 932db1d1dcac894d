//! Fixed-capacity map with least-recently-used eviction.
//!
//! Recency is tracked with a monotonically increasing access tick per entry and
//! an ordered index from tick to key, so touching and evicting are both
//! `O(log n)`.

use std::borrow::Borrow;
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

#[derive(Debug)]
struct Slot<V> {
    value: V,
    tick: u64,
}

/// Bounded associative container evicting the least recently accessed entry.
///
/// `get` and `insert` count as accesses; `contains` does not.
#[derive(Debug)]
pub struct LruCache<K, V> {
    entries: HashMap<K, Slot<V>>,
    recency: BTreeMap<u64, K>,
    capacity: usize,
    next_tick: u64,
}

impl<K, V> LruCache<K, V>
where
    K: Hash + Eq + Clone,
{
    /// Create a cache holding at most `capacity` entries (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: HashMap::with_capacity(capacity.min(1024)),
            recency: BTreeMap::new(),
            capacity,
            next_tick: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up `key` and mark it most recently used.
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let tick = self.advance();
        let slot = self.entries.get_mut(key)?;
        if let Some(owned) = self.recency.remove(&slot.tick) {
            self.recency.insert(tick, owned);
        }
        slot.tick = tick;
        Some(&slot.value)
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.contains_key(key)
    }

    /// Insert or replace `key`, marking it most recently used.
    ///
    /// Returns the entry evicted to make room, if any. Replacing an existing
    /// key never evicts.
    pub fn insert(&mut self, key: K, value: V) -> Option<(K, V)> {
        let tick = self.advance();

        if let Some(slot) = self.entries.get_mut(&key) {
            self.recency.remove(&slot.tick);
            slot.value = value;
            slot.tick = tick;
            self.recency.insert(tick, key);
            return None;
        }

        let evicted =
            if self.entries.len() >= self.capacity { self.pop_least_recent() } else { None };

        self.recency.insert(tick, key.clone());
        self.entries.insert(key, Slot { value, tick });
        evicted
    }

    fn pop_least_recent(&mut self) -> Option<(K, V)> {
        let (_, key) = self.recency.pop_first()?;
        let slot = self.entries.remove(&key)?;
        Some((key, slot.value))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.recency.clear();
    }

    fn advance(&mut self) -> u64 {
        self.next_tick += 1;
        self.next_tick
    }
}
