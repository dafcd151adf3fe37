//! Bounded Cache Store
//!
//! Generic in-memory caching with TTL expiry and a choice of LRU, LFU or
//! FIFO eviction, fixed per store at construction.

mod bounded;
mod entry;
mod eviction;
mod stats;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use bounded::BoundedCache;
pub use entry::CacheEntry;
pub use eviction::{EvictionPolicy, InsertionOrder};
pub use stats::CacheStats;
