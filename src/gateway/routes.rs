//! Gateway Routes
//!
//! Configures the axum router: the explicit cache endpoints plus the
//! fallback that hands every remaining request to the cache worker.

use std::sync::Arc;

use axum::{
    extract::{Path, Request, State},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tokio::sync::RwLock;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::coalesce::RequestCache;
use crate::error::{CacheError, Result};
use crate::gateway::resources::CachedResponse;
use crate::gateway::upstream::Upstream;
use crate::gateway::worker::CacheWorker;
use crate::memory::MemoryCache;
use crate::models::{
    AreaStats, GatewayStatsResponse, HealthResponse, InvalidateRequest, InvalidateResponse,
    MessageResponse, WorkerCommand,
};

// == App State ==
/// Shared state of the gateway, built by the composition root. Every cache
/// instance is constructed explicitly and injected here; nothing is module
/// or process global.
#[derive(Clone)]
pub struct AppState {
    /// Resource cache worker intercepting plain GET traffic
    pub worker: Arc<CacheWorker>,
    /// Coalescing response cache behind /cached
    pub responses: Arc<RequestCache<CachedResponse>>,
    /// Small first-level cache in front of the response cache
    pub ephemeral: Arc<RwLock<MemoryCache<CachedResponse>>>,
    /// The origin everything is fetched from
    pub upstream: Arc<dyn Upstream>,
}

// == Router ==
/// Creates the gateway router.
///
/// # Endpoints
/// - `GET /cached/*path` - coalesced, two-layer cached upstream reads
/// - `POST /cache/invalidate` - drop response-cache entries by pattern
/// - `GET /cache/stats` - cache statistics
/// - `POST /worker/message` - worker command protocol
/// - `GET /health` - health check endpoint
/// - anything else - intercepted by the cache worker
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/cache/stats", get(stats_handler))
        .route("/cache/invalidate", post(invalidate_handler))
        .route("/cached/*path", get(cached_handler))
        .route("/worker/message", post(message_handler))
        .fallback(intercept_handler)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// == Handlers ==

/// Fallback for everything without an explicit route: the cache worker
/// serves it with the strategy its classification selects.
async fn intercept_handler(State(state): State<AppState>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let body = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(error) => {
            return CacheError::InvalidRequest(error.to_string()).into_response();
        }
    };

    state.worker.handle_fetch(parts.method, &parts.uri, body).await
}

/// Handler for GET /cached/*path
///
/// The two-layer read path: the ephemeral cache answers repeat reads
/// within its short TTL, the coalescing response cache answers everything
/// else, and only a miss on both reaches the upstream - at most once per
/// key, however many callers arrive concurrently. Non-2xx upstream answers
/// are reported as upstream errors, not cached.
async fn cached_handler(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<Response> {
    let key = format!("/{}", path);

    if let Some(hit) = state.ephemeral.write().await.get(&key) {
        return Ok(hit.into_response());
    }

    let upstream = Arc::clone(&state.upstream);
    let target = key.clone();
    let response = state
        .responses
        .get_or_fetch(&key, move || async move {
            let response = upstream.fetch(&target).await?;
            if !response.is_ok() {
                anyhow::bail!("upstream answered {} for {}", response.status, target);
            }
            Ok(response)
        })
        .await
        .map_err(|error| CacheError::Upstream(error.to_string()))?;

    state
        .ephemeral
        .write()
        .await
        .set(&key, response.clone(), None);

    Ok(response.into_response())
}

/// Handler for POST /cache/invalidate
async fn invalidate_handler(
    State(state): State<AppState>,
    Json(request): Json<InvalidateRequest>,
) -> Result<Json<InvalidateResponse>> {
    let removed = state.responses.invalidate(request.pattern.as_deref()).await?;
    Ok(Json(InvalidateResponse { removed }))
}

/// Handler for POST /worker/message
async fn message_handler(
    State(state): State<AppState>,
    Json(command): Json<WorkerCommand>,
) -> Json<MessageResponse> {
    let message = state.worker.handle_command(command).await;
    Json(MessageResponse::new(message))
}

/// Handler for GET /cache/stats
async fn stats_handler(State(state): State<AppState>) -> Json<GatewayStatsResponse> {
    let areas = state
        .worker
        .cache_snapshot()
        .await
        .into_iter()
        .map(|(name, entries)| AreaStats { name, entries })
        .collect();

    Json(GatewayStatsResponse {
        worker_state: state.worker.state().await.to_string(),
        areas,
        responses: state.responses.stats().await,
        ephemeral_entries: state.ephemeral.read().await.len(),
    })
}

/// Handler for GET /health
async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
