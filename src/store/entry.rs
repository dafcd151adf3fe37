//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with access metadata.

use std::time::{Duration, Instant};

// == Cache Entry ==
/// A single cache entry together with the metadata the eviction policies
/// consult: creation time, access count and last access time.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub(crate) value: V,
    /// Creation time; reset on every overwrite
    pub(crate) created_at: Instant,
    /// Number of reads since creation
    pub(crate) access_count: u64,
    /// Time of the most recent read (creation time until first read)
    pub(crate) last_accessed_at: Instant,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a fresh entry. Access statistics start at zero.
    pub fn new(value: V) -> Self {
        let now = Instant::now();
        Self {
            value,
            created_at: now,
            access_count: 0,
            last_accessed_at: now,
        }
    }

    // == Is Expired ==
    /// Checks whether the entry has outlived the given TTL.
    ///
    /// An entry is live through `created_at + ttl` inclusive; a read any
    /// later treats it as absent.
    pub fn is_expired(&self, ttl: Duration) -> bool {
        self.created_at.elapsed() > ttl
    }

    // == Touch ==
    /// Records a read: bumps the access count and refreshes the last
    /// access time.
    pub fn touch(&mut self) {
        self.access_count += 1;
        self.last_accessed_at = Instant::now();
    }

    /// Number of reads recorded since the entry was (re-)created.
    pub fn access_count(&self) -> u64 {
        self.access_count
    }

    /// Time elapsed since the entry was (re-)created.
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }
}
