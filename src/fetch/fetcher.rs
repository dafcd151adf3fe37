//! Fetch Orchestration Module
//!
//! The consumer-facing contract: "I need data produced by this async
//! operation, with this caching and retry policy." A [`Fetcher`] owns the
//! observable state for one such requirement, retries with linear backoff,
//! honors cancellation, supports optimistic mutation, and can sit behind a
//! caller-supplied local expiring cache.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::FetchError;
use crate::memory::MemoryCache;

/// The asynchronous operation a fetcher drives. Invoked once per attempt.
pub type Producer<T> = Arc<dyn Fn() -> BoxFuture<'static, anyhow::Result<T>> + Send + Sync>;

type SuccessHook<T> = Arc<dyn Fn(&T) + Send + Sync>;
type ErrorHook = Arc<dyn Fn(&FetchError) + Send + Sync>;

// == Fetch Options ==
/// Caching and retry policy of a fetcher.
#[derive(Clone)]
pub struct FetchOptions<T> {
    /// Seed value visible before the first fetch completes
    pub initial_data: Option<T>,
    /// Whether [`Fetcher::start`] triggers a fetch
    pub fetch_on_start: bool,
    /// Additional attempts after the initial failure
    pub retry_attempts: u32,
    /// Base backoff; attempt `n` waits `retry_delay * n`
    pub retry_delay: Duration,
    /// Key into the local expiring cache; `None` disables it
    pub cache_key: Option<String>,
    /// TTL for values written to the local expiring cache
    pub cache_duration: Duration,
}

impl<T> Default for FetchOptions<T> {
    fn default() -> Self {
        Self {
            initial_data: None,
            fetch_on_start: true,
            retry_attempts: 0,
            retry_delay: Duration::from_millis(1000),
            cache_key: None,
            cache_duration: Duration::from_secs(300),
        }
    }
}

// == Fetch State ==
/// Observable state of a fetcher. `error` is the single source of truth
/// for failure rendering; it is only ever set by an exhausted final
/// attempt.
#[derive(Debug, Clone)]
pub struct FetchState<T> {
    pub data: Option<T>,
    pub loading: bool,
    pub error: Option<FetchError>,
    pub is_retrying: bool,
    pub retry_count: u32,
}

// == Mutation ==
/// An optimistic overwrite: either a literal value or a function of the
/// previous one.
pub enum Mutation<T> {
    Value(T),
    Update(Box<dyn FnOnce(Option<&T>) -> T + Send>),
}

// == Fetcher ==
pub struct Fetcher<T> {
    producer: Producer<T>,
    options: FetchOptions<T>,
    state: Arc<Mutex<FetchState<T>>>,
    local_cache: Option<Arc<RwLock<MemoryCache<T>>>>,
    /// Monotonic fetch generation; only the newest may commit state
    generation: Arc<AtomicU64>,
    /// Token of the in-flight fetch, replaced (and cancelled) by its
    /// successor
    cancel: Arc<Mutex<CancellationToken>>,
    on_success: Option<SuccessHook<T>>,
    on_error: Option<ErrorHook>,
}

impl<T> Fetcher<T>
where
    T: Clone + Send + Sync + 'static,
{
    // == Constructor ==
    pub fn new(producer: Producer<T>, options: FetchOptions<T>) -> Self {
        let state = FetchState {
            data: options.initial_data.clone(),
            loading: false,
            error: None,
            is_retrying: false,
            retry_count: 0,
        };

        Self {
            producer,
            options,
            state: Arc::new(Mutex::new(state)),
            local_cache: None,
            generation: Arc::new(AtomicU64::new(0)),
            cancel: Arc::new(Mutex::new(CancellationToken::new())),
            on_success: None,
            on_error: None,
        }
    }

    /// Attaches the shared local expiring cache consulted under
    /// `cache_key` before the producer runs.
    pub fn with_local_cache(mut self, cache: Arc<RwLock<MemoryCache<T>>>) -> Self {
        self.local_cache = Some(cache);
        self
    }

    pub fn on_success<F>(mut self, hook: F) -> Self
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.on_success = Some(Arc::new(hook));
        self
    }

    pub fn on_error<F>(mut self, hook: F) -> Self
    where
        F: Fn(&FetchError) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(hook));
        self
    }

    // == Start ==
    /// Runs the initial fetch if the options ask for one.
    pub async fn start(&self) -> Result<Option<T>, FetchError> {
        if self.options.fetch_on_start {
            self.fetch().await
        } else {
            Ok(None)
        }
    }

    // == State ==
    pub async fn state(&self) -> FetchState<T> {
        self.state.lock().await.clone()
    }

    // == Fetch ==
    /// Runs the producer with the configured retry policy.
    ///
    /// Supersedes any fetch still in flight: the older fetch's settlement
    /// will not touch state. Returns `Ok(Some(value))` when this fetch
    /// committed, `Ok(None)` when it was cancelled or superseded (no
    /// observable effect), and the final error once every attempt is
    /// spent. Intermediate failures only surface through `is_retrying` and
    /// `retry_count`.
    pub async fn fetch(&self) -> Result<Option<T>, FetchError> {
        let (generation, token) = self.begin_fetch().await;

        // Local cache first; the producer is never consulted for a live
        // local entry.
        if let Some(value) = self.local_lookup().await {
            if !self.is_current(generation) {
                return Ok(None);
            }
            self.commit_success(&value).await;
            return Ok(Some(value));
        }

        {
            let mut state = self.state.lock().await;
            state.loading = true;
            state.is_retrying = false;
            state.retry_count = 0;
        }

        let mut attempt: u32 = 0;
        loop {
            let work = (self.producer)();
            let result = tokio::select! {
                _ = token.cancelled() => return Ok(None),
                result = work => result,
            };

            match result {
                Ok(value) => {
                    if token.is_cancelled() || !self.is_current(generation) {
                        return Ok(None);
                    }
                    self.local_store(&value).await;
                    self.commit_success(&value).await;
                    return Ok(Some(value));
                }
                Err(error) if attempt < self.options.retry_attempts => {
                    attempt += 1;
                    debug!(attempt, %error, "fetch attempt failed, retrying");
                    {
                        let mut state = self.state.lock().await;
                        state.is_retrying = true;
                        state.retry_count = attempt;
                    }
                    let backoff = self.options.retry_delay * attempt;
                    tokio::select! {
                        _ = token.cancelled() => return Ok(None),
                        _ = tokio::time::sleep(backoff) => {}
                    }
                }
                Err(error) => {
                    let error = FetchError::new(error);
                    if token.is_cancelled() || !self.is_current(generation) {
                        return Ok(None);
                    }
                    {
                        let mut state = self.state.lock().await;
                        state.error = Some(error.clone());
                        state.loading = false;
                        state.is_retrying = false;
                    }
                    if let Some(hook) = &self.on_error {
                        hook(&error);
                    }
                    return Err(error);
                }
            }
        }
    }

    // == Retry ==
    /// The retry affordance surfaced next to `error`.
    pub async fn retry(&self) -> Result<Option<T>, FetchError> {
        self.fetch().await
    }

    // == Mutate ==
    /// Optimistically overwrites the current data without a fetch. The
    /// write is immediately visible to the next read and also lands in the
    /// local expiring cache when one is configured. An in-flight fetch
    /// that settles later still wins (last writer).
    pub async fn mutate(&self, mutation: Mutation<T>) {
        let value = {
            let mut state = self.state.lock().await;
            let value = match mutation {
                Mutation::Value(value) => value,
                Mutation::Update(update) => update(state.data.as_ref()),
            };
            state.data = Some(value.clone());
            value
        };

        self.local_store(&value).await;
    }

    // == Cancel ==
    /// Aborts the in-flight fetch, if any. Its settlement fires no hook
    /// and leaves state untouched; only the loading indicators are
    /// cleared.
    pub async fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.cancel.lock().await.cancel();

        let mut state = self.state.lock().await;
        state.loading = false;
        state.is_retrying = false;
    }

    // == Reset ==
    /// Returns to the initial state, aborting any in-flight fetch.
    pub async fn reset(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.cancel.lock().await.cancel();

        let mut state = self.state.lock().await;
        *state = FetchState {
            data: self.options.initial_data.clone(),
            loading: false,
            error: None,
            is_retrying: false,
            retry_count: 0,
        };
    }

    // == Internals ==

    /// Registers a new fetch: bumps the generation and replaces (and
    /// cancels) the previous fetch's token.
    async fn begin_fetch(&self) -> (u64, CancellationToken) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let token = CancellationToken::new();
        let previous = {
            let mut current = self.cancel.lock().await;
            std::mem::replace(&mut *current, token.clone())
        };
        previous.cancel();
        (generation, token)
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    async fn local_lookup(&self) -> Option<T> {
        let key = self.options.cache_key.as_deref()?;
        let cache = self.local_cache.as_ref()?;
        cache.write().await.get(key)
    }

    async fn local_store(&self, value: &T) {
        if let (Some(key), Some(cache)) = (&self.options.cache_key, &self.local_cache) {
            cache
                .write()
                .await
                .set(key.clone(), value.clone(), Some(self.options.cache_duration));
        }
    }

    async fn commit_success(&self, value: &T) {
        {
            let mut state = self.state.lock().await;
            state.data = Some(value.clone());
            state.loading = false;
            state.error = None;
            state.is_retrying = false;
        }
        if let Some(hook) = &self.on_success {
            hook(value);
        }
    }
}
