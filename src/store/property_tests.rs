//! Property-Based Tests for the Bounded Cache Store
//!
//! Uses proptest to verify the store invariants across all eviction
//! policies: capacity is never exceeded, statistics stay accurate, and each
//! policy removes the victim it promises.

use proptest::prelude::*;
use std::time::Duration;

use crate::store::{BoundedCache, EvictionPolicy};

// == Test Configuration ==
const TEST_MAX_ENTRIES: usize = 100;
const TEST_TTL: Duration = Duration::from_secs(300);

// == Strategies ==
/// Generates valid cache keys
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_]{1,64}".prop_map(|s| s)
}

/// Generates cache values
fn value_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{1,256}".prop_map(|s| s)
}

fn policy_strategy() -> impl Strategy<Value = EvictionPolicy> {
    prop_oneof![
        Just(EvictionPolicy::Lru),
        Just(EvictionPolicy::Lfu),
        Just(EvictionPolicy::Fifo),
    ]
}

/// Generates a sequence of cache operations for testing
#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: String, value: String },
    Get { key: String },
    Remove { key: String },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        (key_strategy(), value_strategy()).prop_map(|(key, value)| CacheOp::Set { key, value }),
        key_strategy().prop_map(|key| CacheOp::Get { key }),
        key_strategy().prop_map(|key| CacheOp::Remove { key }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // For any sequence of operations under any policy, the statistics
    // reflect exactly the hits and misses that occurred.
    #[test]
    fn prop_statistics_accuracy(
        policy in policy_strategy(),
        ops in prop::collection::vec(cache_op_strategy(), 1..50)
    ) {
        let mut cache = BoundedCache::new(TEST_MAX_ENTRIES, TEST_TTL, policy);
        let mut expected_hits: u64 = 0;
        let mut expected_misses: u64 = 0;

        for op in ops {
            match op {
                CacheOp::Set { key, value } => cache.set(key, value),
                CacheOp::Get { key } => match cache.get(&key) {
                    Some(_) => expected_hits += 1,
                    None => expected_misses += 1,
                },
                CacheOp::Remove { key } => {
                    cache.remove(&key);
                }
            }
        }

        let stats = cache.stats();
        prop_assert_eq!(stats.hits, expected_hits, "Hits mismatch");
        prop_assert_eq!(stats.misses, expected_misses, "Misses mismatch");
        prop_assert_eq!(stats.total_entries, cache.len(), "Total entries mismatch");
    }

    // For any key-value pair, a read before expiry returns exactly the
    // stored value.
    #[test]
    fn prop_roundtrip_storage(
        policy in policy_strategy(),
        key in key_strategy(),
        value in value_strategy()
    ) {
        let mut cache = BoundedCache::new(TEST_MAX_ENTRIES, TEST_TTL, policy);

        cache.set(key.clone(), value.clone());

        prop_assert_eq!(cache.get(&key), Some(value));
    }

    // Overwriting a key leaves exactly one entry holding the newest value.
    #[test]
    fn prop_overwrite_semantics(
        policy in policy_strategy(),
        key in key_strategy(),
        value1 in value_strategy(),
        value2 in value_strategy()
    ) {
        let mut cache = BoundedCache::new(TEST_MAX_ENTRIES, TEST_TTL, policy);

        cache.set(key.clone(), value1);
        cache.set(key.clone(), value2.clone());

        prop_assert_eq!(cache.get(&key), Some(value2));
        prop_assert_eq!(cache.len(), 1);
    }

    // For any sequence of insertions under any policy, the store never
    // grows beyond its capacity, and each overflowing insertion evicts
    // exactly one entry.
    #[test]
    fn prop_capacity_enforcement(
        policy in policy_strategy(),
        entries in prop::collection::vec((key_strategy(), value_strategy()), 1..200)
    ) {
        let max_size = 50;
        let mut cache = BoundedCache::new(max_size, TEST_TTL, policy);

        for (key, value) in entries {
            cache.set(key, value);
            prop_assert!(
                cache.len() <= max_size,
                "Cache size {} exceeds max {}",
                cache.len(),
                max_size
            );
        }
    }

    // Filling a FIFO store and inserting one more always evicts the
    // earliest-inserted key, whatever the read pattern in between.
    #[test]
    fn prop_fifo_ignores_access_pattern(
        keys in prop::collection::vec(key_strategy(), 3..10),
        reads in prop::collection::vec(0usize..10, 0..10),
        new_key in key_strategy()
    ) {
        let unique_keys: Vec<String> = dedup(keys);
        prop_assume!(unique_keys.len() >= 2);
        prop_assume!(!unique_keys.contains(&new_key));

        let capacity = unique_keys.len();
        let mut cache = BoundedCache::new(capacity, TEST_TTL, EvictionPolicy::Fifo);

        for key in &unique_keys {
            cache.set(key.clone(), format!("value_{}", key));
        }
        for index in reads {
            let key = &unique_keys[index % unique_keys.len()];
            cache.get(key);
        }

        cache.set(new_key.clone(), "new".to_string());

        prop_assert_eq!(cache.len(), capacity);
        prop_assert!(
            !cache.contains(&unique_keys[0]),
            "FIFO must evict the earliest-inserted key '{}'",
            &unique_keys[0]
        );
        prop_assert!(cache.contains(&new_key));
    }

    // Under LRU, reading a key saves it from the next eviction.
    #[test]
    fn prop_lru_access_tracking(
        keys in prop::collection::vec(key_strategy(), 3..8),
        new_key in key_strategy()
    ) {
        let unique_keys: Vec<String> = dedup(keys);
        prop_assume!(unique_keys.len() >= 3);
        prop_assume!(!unique_keys.contains(&new_key));

        let capacity = unique_keys.len();
        let mut cache = BoundedCache::new(capacity, TEST_TTL, EvictionPolicy::Lru);

        for key in &unique_keys {
            cache.set(key.clone(), format!("value_{}", key));
        }

        // Read the first key; the second becomes the least recently used.
        cache.get(&unique_keys[0]);

        cache.set(new_key.clone(), "new".to_string());

        prop_assert!(
            cache.contains(&unique_keys[0]),
            "Read key '{}' must survive the eviction",
            &unique_keys[0]
        );
        prop_assert!(
            !cache.contains(&unique_keys[1]),
            "Key '{}' was least recently used and must be evicted",
            &unique_keys[1]
        );
        prop_assert!(cache.contains(&new_key));
    }

    // Under LFU, the key with the fewest reads is the victim.
    #[test]
    fn prop_lfu_evicts_least_accessed(
        keys in prop::collection::vec(key_strategy(), 3..8),
        new_key in key_strategy()
    ) {
        let unique_keys: Vec<String> = dedup(keys);
        prop_assume!(unique_keys.len() >= 2);
        prop_assume!(!unique_keys.contains(&new_key));

        let capacity = unique_keys.len();
        let mut cache = BoundedCache::new(capacity, TEST_TTL, EvictionPolicy::Lfu);

        for key in &unique_keys {
            cache.set(key.clone(), format!("value_{}", key));
        }

        // Read every key except the last once; the last stays at zero reads.
        let cold_key = unique_keys[unique_keys.len() - 1].clone();
        for key in unique_keys.iter().filter(|key| **key != cold_key) {
            cache.get(key);
        }

        cache.set(new_key.clone(), "new".to_string());

        prop_assert!(
            !cache.contains(&cold_key),
            "Unread key '{}' must be the LFU victim",
            cold_key
        );
        prop_assert!(cache.contains(&new_key));
    }
}

// Separate proptest block with fewer cases for time-sensitive TTL tests
proptest! {
    #![proptest_config(ProptestConfig::with_cases(5))]

    // Any entry is absent once its TTL has elapsed, and a subsequent
    // contains check reports it gone.
    #[test]
    fn prop_ttl_expiry(
        policy in policy_strategy(),
        key in key_strategy(),
        value in value_strategy()
    ) {
        let mut cache = BoundedCache::new(TEST_MAX_ENTRIES, Duration::from_millis(20), policy);

        cache.set(key.clone(), value.clone());
        prop_assert_eq!(cache.get(&key), Some(value));

        std::thread::sleep(Duration::from_millis(40));

        prop_assert_eq!(cache.get(&key), None);
        prop_assert!(!cache.contains(&key));
    }
}

/// Deduplicates while keeping first-occurrence order, so index 0 is still
/// the earliest-inserted key.
fn dedup(keys: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    keys.into_iter().filter(|key| seen.insert(key.clone())).collect()
}
