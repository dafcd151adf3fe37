//! Fetch Module
//!
//! Data-fetching orchestration: retry with linear backoff, cancellation,
//! optimistic mutation, an optional local expiring cache, and a paginated
//! variant.

pub mod fetcher;
pub mod pagination;

pub use fetcher::{FetchOptions, FetchState, Fetcher, Mutation, Producer};
pub use pagination::{Page, PagedFetcher, PageProducer};
