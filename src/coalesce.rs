//! Request Cache Module
//!
//! Caches asynchronous producer results keyed by an opaque string and
//! de-duplicates concurrent requests: while a fetch for a key is in flight,
//! every further caller for that key attaches to the same pending
//! computation instead of starting its own. The producer therefore runs at
//! most once per key at any moment, and all attached callers observe the
//! same value or the same failure.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use regex::Regex;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{CacheError, FetchError};
use crate::store::{BoundedCache, CacheStats, EvictionPolicy};

/// A pending computation shared by every caller attached to the same key.
type InFlight<V> = Shared<BoxFuture<'static, std::result::Result<V, FetchError>>>;

// == Request Cache Stats ==
/// Snapshot of the request cache counters.
#[derive(Debug, Clone, Serialize)]
pub struct RequestCacheStats {
    /// Counters of the backing bounded store
    pub store: CacheStats,
    /// Number of computations currently in flight
    pub in_flight: usize,
    /// Number of callers that attached to an already-pending computation
    pub coalesced: u64,
}

// == Inner State ==
struct Inner<V> {
    store: BoundedCache<V>,
    in_flight: HashMap<String, InFlight<V>>,
    coalesced: u64,
}

// == Request Cache ==
/// Response cache with in-flight request de-duplication.
///
/// Retry is deliberately not handled here; it belongs to the fetch
/// orchestration layer.
pub struct RequestCache<V> {
    inner: Arc<Mutex<Inner<V>>>,
}

impl<V> RequestCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    // == Constructor ==
    /// Creates a request cache backed by a bounded store with the given
    /// capacity, TTL and eviction policy.
    pub fn new(max_size: usize, ttl: Duration, policy: EvictionPolicy) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                store: BoundedCache::new(max_size, ttl, policy),
                in_flight: HashMap::new(),
                coalesced: 0,
            })),
        }
    }

    // == Get Or Fetch ==
    /// Returns the cached value for `key`, or produces it.
    ///
    /// 1. A live store entry is returned immediately; the producer is not
    ///    invoked.
    /// 2. If a computation for `key` is already in flight, this caller
    ///    awaits that same computation.
    /// 3. Otherwise the producer runs. On success the value is stored and
    ///    handed to every waiter; on failure nothing is cached and every
    ///    waiter receives the same [`FetchError`]. Either way the in-flight
    ///    entry is removed the moment the computation settles.
    pub async fn get_or_fetch<F, Fut>(
        &self,
        key: &str,
        producer: F,
    ) -> std::result::Result<V, FetchError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<V>> + Send + 'static,
    {
        let pending = {
            let mut inner = self.inner.lock().await;

            if let Some(value) = inner.store.get(key) {
                return Ok(value);
            }

            if let Some(pending) = inner.in_flight.get(key).cloned() {
                inner.coalesced += 1;
                debug!(key, "attaching to in-flight request");
                pending
            } else {
                let work = producer();
                let state = Arc::clone(&self.inner);
                let owned_key = key.to_string();

                let pending = async move {
                    let result = work.await;
                    let mut inner = state.lock().await;
                    inner.in_flight.remove(&owned_key);
                    match result {
                        Ok(value) => {
                            inner.store.set(owned_key, value.clone());
                            Ok(value)
                        }
                        Err(error) => Err(FetchError::new(error)),
                    }
                }
                .boxed()
                .shared();

                inner.in_flight.insert(key.to_string(), pending.clone());
                pending
            }
        };

        pending.await
    }

    // == Invalidate ==
    /// Removes cached entries.
    ///
    /// Without a pattern the whole store is cleared. With a pattern, it is
    /// compiled as a regular expression and every matching key is removed;
    /// non-matching keys are untouched. The pattern is a real regex matched
    /// against raw keys, so callers invalidating a literal key segment
    /// should escape metacharacters (`regex::escape`) first.
    ///
    /// Returns the number of entries removed.
    pub async fn invalidate(&self, pattern: Option<&str>) -> crate::error::Result<usize> {
        let mut inner = self.inner.lock().await;

        match pattern {
            None => {
                let removed = inner.store.len();
                inner.store.clear();
                Ok(removed)
            }
            Some(pattern) => {
                let matcher = Regex::new(pattern)
                    .map_err(|error| CacheError::InvalidPattern(error.to_string()))?;
                Ok(inner.store.remove_matching(|key| matcher.is_match(key)))
            }
        }
    }

    // == Stats ==
    pub async fn stats(&self) -> RequestCacheStats {
        let inner = self.inner.lock().await;
        RequestCacheStats {
            store: inner.store.stats(),
            in_flight: inner.in_flight.len(),
            coalesced: inner.coalesced,
        }
    }

    // == Length ==
    pub async fn len(&self) -> usize {
        self.inner.lock().await.store.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.store.is_empty()
    }
}
