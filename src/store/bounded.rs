//! Bounded Cache Store Module
//!
//! Generic key-value store with TTL expiry discovered at read time and a
//! policy-driven eviction of exactly one entry per insertion at capacity.

use std::collections::HashMap;
use std::time::Duration;

use crate::store::{CacheEntry, CacheStats, EvictionPolicy, InsertionOrder};

// == Bounded Cache ==
/// Size-bounded store with per-store TTL and a fixed eviction policy.
///
/// Never errors: when full, it makes room by evicting; an expired entry is
/// simply treated as absent and dropped by the read that finds it.
#[derive(Debug)]
pub struct BoundedCache<V> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<V>>,
    /// Explicit insertion-order record for FIFO and LFU tie-breaking
    order: InsertionOrder,
    /// Victim selection, fixed at construction
    policy: EvictionPolicy,
    /// Performance statistics
    stats: CacheStats,
    /// Maximum number of entries allowed
    max_size: usize,
    /// Time to live applied uniformly to all entries
    ttl: Duration,
}

impl<V: Clone> BoundedCache<V> {
    // == Constructor ==
    /// Creates a new store.
    ///
    /// # Arguments
    /// * `max_size` - Maximum number of entries the store may hold
    /// * `ttl` - Time to live for every entry
    /// * `policy` - Eviction policy applied when an insertion finds the
    ///   store full
    pub fn new(max_size: usize, ttl: Duration, policy: EvictionPolicy) -> Self {
        Self {
            entries: HashMap::new(),
            order: InsertionOrder::new(),
            policy,
            stats: CacheStats::new(),
            max_size,
            ttl,
        }
    }

    // == Set ==
    /// Inserts or overwrites a value.
    ///
    /// The entry's creation time is reset and its access count starts over.
    /// Inserting a new key while at capacity first evicts exactly one entry
    /// chosen by the configured policy; overwrites never trigger eviction.
    /// An overwritten key keeps its original insertion position.
    pub fn set(&mut self, key: String, value: V) {
        let is_overwrite = self.entries.contains_key(&key);

        if !is_overwrite && self.entries.len() >= self.max_size {
            if let Some(victim) = self.select_victim() {
                self.entries.remove(&victim);
                self.order.remove(&victim);
                self.stats.record_eviction();
            }
        }

        self.entries.insert(key.clone(), CacheEntry::new(value));
        if !is_overwrite {
            self.order.record(&key);
        }

        self.stats.set_total_entries(self.entries.len());
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// Returns `None` if the key is unknown or the entry has outlived the
    /// store TTL; an expired entry is deleted as a side effect. A hit
    /// updates the entry's access statistics.
    pub fn get(&mut self, key: &str) -> Option<V> {
        if self.drop_if_expired(key) {
            self.stats.record_miss();
            return None;
        }

        match self.entries.get_mut(key) {
            Some(entry) => {
                entry.touch();
                self.stats.record_hit();
                Some(entry.value.clone())
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Contains ==
    /// Checks for a live entry without touching its access statistics.
    ///
    /// Still deletes an expired entry: expired keys are never reported
    /// present.
    pub fn contains(&mut self, key: &str) -> bool {
        if self.drop_if_expired(key) {
            return false;
        }
        self.entries.contains_key(key)
    }

    // == Remove ==
    /// Removes an entry by key. Returns whether an entry was present.
    pub fn remove(&mut self, key: &str) -> bool {
        let removed = self.entries.remove(key).is_some();
        if removed {
            self.order.remove(key);
            self.stats.set_total_entries(self.entries.len());
        }
        removed
    }

    // == Remove Matching ==
    /// Removes every key the predicate accepts; returns the number removed.
    pub fn remove_matching<F>(&mut self, predicate: F) -> usize
    where
        F: Fn(&str) -> bool,
    {
        let matching: Vec<String> = self
            .entries
            .keys()
            .filter(|key| predicate(key))
            .cloned()
            .collect();

        for key in &matching {
            self.entries.remove(key);
            self.order.remove(key);
        }

        self.stats.set_total_entries(self.entries.len());
        matching.len()
    }

    // == Clear ==
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
        self.stats.set_total_entries(0);
    }

    // == Stats ==
    /// Returns a snapshot of the current statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    // == Length ==
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of entries the store may hold.
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// The eviction policy fixed at construction.
    pub fn policy(&self) -> EvictionPolicy {
        self.policy
    }

    // == Victim Selection ==
    /// Picks the entry to evict, or `None` when the store is empty.
    ///
    /// LRU and LFU scan in insertion order with a strict comparison, so
    /// ties always fall to the earliest-inserted key.
    fn select_victim(&self) -> Option<String> {
        match self.policy {
            EvictionPolicy::Fifo => self.order.front().cloned(),
            EvictionPolicy::Lru => self.victim_by(|entry| entry.last_accessed_at),
            EvictionPolicy::Lfu => self.victim_by(|entry| entry.access_count),
        }
    }

    fn victim_by<K, F>(&self, metric: F) -> Option<String>
    where
        K: PartialOrd,
        F: Fn(&CacheEntry<V>) -> K,
    {
        let mut victim: Option<(&String, K)> = None;
        for key in self.order.iter() {
            if let Some(entry) = self.entries.get(key) {
                let value = metric(entry);
                let smaller = match &victim {
                    Some((_, current)) => value < *current,
                    None => true,
                };
                if smaller {
                    victim = Some((key, value));
                }
            }
        }
        victim.map(|(key, _)| key.clone())
    }

    /// Deletes the entry if it is expired; returns whether it did.
    fn drop_if_expired(&mut self, key: &str) -> bool {
        let expired = self
            .entries
            .get(key)
            .map(|entry| entry.is_expired(self.ttl))
            .unwrap_or(false);

        if expired {
            self.entries.remove(key);
            self.order.remove(key);
            self.stats.record_expiration();
            self.stats.set_total_entries(self.entries.len());
        }

        expired
    }
}
