//! Cache Worker Module
//!
//! The interception point of the gateway. A worker owns the resource cache
//! and an upstream, moves through an explicit install/activate lifecycle,
//! and serves each GET request with the strategy its classification
//! selects. Strategy execution is written against the cache and the
//! upstream trait only, independent of the hosting HTTP server.

use std::fmt;
use std::sync::Arc;

use axum::http::{Method, Uri};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::gateway::class::{classify, Strategy};
use crate::gateway::resources::{CachedResponse, ResourceCache, STATIC_CACHE};
use crate::gateway::upstream::Upstream;
use crate::models::WorkerCommand;

// == Worker State ==
/// Lifecycle of a cache worker.
///
/// `Installing` until the precache pass finishes, `Waiting` until
/// activation, `Active` while serving traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Installing,
    Waiting,
    Active,
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkerState::Installing => "installing",
            WorkerState::Waiting => "waiting",
            WorkerState::Active => "active",
        };
        write!(f, "{}", name)
    }
}

// == Cache Worker ==
pub struct CacheWorker {
    cache: Arc<RwLock<ResourceCache>>,
    upstream: Arc<dyn Upstream>,
    state: RwLock<WorkerState>,
    /// Targets fetched into the static area during install
    precache: Vec<String>,
}

impl CacheWorker {
    // == Constructor ==
    pub fn new(upstream: Arc<dyn Upstream>, precache: Vec<String>) -> Self {
        Self {
            cache: Arc::new(RwLock::new(ResourceCache::new())),
            upstream,
            state: RwLock::new(WorkerState::Installing),
            precache,
        }
    }

    pub async fn state(&self) -> WorkerState {
        *self.state.read().await
    }

    // == Install ==
    /// Pre-populates the static area from the precache manifest, then moves
    /// to `Waiting`. A failed precache target is logged and skipped; install
    /// itself never fails.
    pub async fn install(&self) {
        let mut precached = 0usize;
        for target in &self.precache {
            match self.upstream.fetch(target).await {
                Ok(response) if response.is_ok() => {
                    self.cache.write().await.put(STATIC_CACHE, target, response);
                    precached += 1;
                }
                Ok(response) => {
                    warn!(path = target.as_str(), status = %response.status, "precache target not cacheable");
                }
                Err(error) => {
                    warn!(path = target.as_str(), %error, "precache fetch failed");
                }
            }
        }

        *self.state.write().await = WorkerState::Waiting;
        info!(precached, "install complete, worker waiting");
    }

    // == Skip Waiting ==
    /// Forces a waiting worker active without the usual activation pass.
    pub async fn skip_waiting(&self) {
        let mut state = self.state.write().await;
        if *state == WorkerState::Waiting {
            *state = WorkerState::Active;
            info!("waiting period skipped, worker active");
        }
    }

    // == Activate ==
    /// Prunes cache areas left behind by older workers and takes over
    /// traffic.
    pub async fn activate(&self) {
        let removed = self.cache.write().await.purge_stale();
        for name in &removed {
            info!(area = name.as_str(), "dropped stale cache area");
        }

        *self.state.write().await = WorkerState::Active;
        info!("worker active, serving all traffic");
    }

    // == Command Handling ==
    /// Applies a command delivered over the message endpoint and returns a
    /// short confirmation.
    pub async fn handle_command(&self, command: WorkerCommand) -> &'static str {
        match command {
            WorkerCommand::SkipWaiting => {
                self.skip_waiting().await;
                "activation forced"
            }
            WorkerCommand::ClearCache => {
                self.cache.write().await.clear_all();
                info!("all cache areas cleared by command");
                "caches cleared"
            }
        }
    }

    // == Fetch Handling ==
    /// Serves one request. Only GET over http(s) is intercepted; everything
    /// else is forwarded to the upstream untouched.
    pub async fn handle_fetch(&self, method: Method, uri: &Uri, body: Bytes) -> Response {
        let interceptable = method == Method::GET
            && uri
                .scheme_str()
                .map(|scheme| scheme == "http" || scheme == "https")
                .unwrap_or(true);

        let target = uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or_else(|| uri.path())
            .to_string();

        if !interceptable {
            return self.pass_through(method, &target, body).await;
        }

        let class = classify(uri.path());
        let area = class.cache_area();
        debug!(path = target.as_str(), ?class, "intercepted request");

        let response = match class.strategy() {
            Strategy::CacheFirst => self.cache_first(area, &target).await,
            Strategy::NetworkFirst => self.network_first(area, &target).await,
            Strategy::StaleWhileRevalidate => self.stale_while_revalidate(area, &target).await,
        };

        response.into_response()
    }

    /// Entry counts per cache area, for the stats surface.
    pub async fn cache_snapshot(&self) -> Vec<(String, usize)> {
        self.cache.read().await.area_sizes()
    }

    // == Strategies ==

    /// Cached response if present; otherwise fetch, cache 2xx, return. An
    /// unreachable upstream with no cached entry synthesizes a 408.
    async fn cache_first(&self, area: &'static str, target: &str) -> CachedResponse {
        if let Some(hit) = self.cache.read().await.get(area, target) {
            debug!(path = target, area, "cache-first hit");
            return hit;
        }

        match self.upstream.fetch(target).await {
            Ok(response) => {
                if response.is_ok() {
                    self.cache.write().await.put(area, target, response.clone());
                }
                response
            }
            Err(error) => {
                warn!(path = target, %error, "cache-first fetch failed with cold cache");
                CachedResponse::timeout()
            }
        }
    }

    /// Network result when reachable (2xx cached for the fallback path);
    /// cached response when not; 408 when neither exists.
    async fn network_first(&self, area: &'static str, target: &str) -> CachedResponse {
        match self.upstream.fetch(target).await {
            Ok(response) => {
                if response.is_ok() {
                    self.cache.write().await.put(area, target, response.clone());
                }
                response
            }
            Err(error) => {
                warn!(path = target, %error, "network-first fetch failed, trying cache");
                match self.cache.read().await.get(area, target) {
                    Some(fallback) => fallback,
                    None => CachedResponse::timeout(),
                }
            }
        }
    }

    /// Cached response immediately, refreshed by a detached background
    /// task; cold cache waits on the network once.
    async fn stale_while_revalidate(&self, area: &'static str, target: &str) -> CachedResponse {
        if let Some(stale) = self.cache.read().await.get(area, target) {
            self.spawn_revalidation(area, target);
            return stale;
        }

        match self.upstream.fetch(target).await {
            Ok(response) => {
                if response.is_ok() {
                    self.cache.write().await.put(area, target, response.clone());
                }
                response
            }
            Err(error) => {
                warn!(path = target, %error, "revalidating fetch failed with cold cache");
                CachedResponse::timeout()
            }
        }
    }

    /// Refreshes one cached target on a detached task. The task outlives
    /// the response already returned to the caller; its failures are logged
    /// and never surface.
    fn spawn_revalidation(&self, area: &'static str, target: &str) {
        let cache = Arc::clone(&self.cache);
        let upstream = Arc::clone(&self.upstream);
        let target = target.to_string();

        tokio::spawn(async move {
            match upstream.fetch(&target).await {
                Ok(response) if response.is_ok() => {
                    cache.write().await.put(area, &target, response);
                    debug!(path = target.as_str(), "background revalidation stored");
                }
                Ok(response) => {
                    debug!(
                        path = target.as_str(),
                        status = %response.status,
                        "background revalidation skipped non-success"
                    );
                }
                Err(error) => {
                    warn!(path = target.as_str(), %error, "background revalidation failed");
                }
            }
        });
    }

    // == Pass Through ==
    async fn pass_through(&self, method: Method, target: &str, body: Bytes) -> Response {
        match self.upstream.forward(method, target, body).await {
            Ok(response) => response.into_response(),
            Err(error) => {
                warn!(path = target, %error, "pass-through request failed");
                CachedResponse::bad_gateway().into_response()
            }
        }
    }
}
