//! reqcache - a response caching toolkit
//!
//! Bounded in-memory stores with pluggable eviction, a coalescing request
//! cache for asynchronous producers, a small fixed-capacity expiring cache,
//! an HTTP resource-cache gateway with per-request-class strategies, and a
//! data-fetching orchestrator with retry, cancellation and pagination.

pub mod coalesce;
pub mod config;
pub mod error;
pub mod fetch;
pub mod gateway;
pub mod memory;
pub mod models;
pub mod store;
pub mod tasks;

pub use coalesce::RequestCache;
pub use config::Config;
pub use error::{CacheError, FetchError};
pub use fetch::{FetchOptions, Fetcher, PagedFetcher};
pub use gateway::{create_router, AppState, CacheWorker, HttpUpstream, Upstream};
pub use memory::MemoryCache;
pub use store::{BoundedCache, EvictionPolicy};
pub use tasks::{spawn_cleanup_task, TimerRegistry};
