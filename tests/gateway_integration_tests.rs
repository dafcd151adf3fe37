//! Integration Tests for the Gateway
//!
//! Drives the full router: strategy behavior per request class, the
//! coalesced /cached surface, invalidation, the worker command protocol
//! and the synthesized error responses.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode},
    Router,
};
use bytes::Bytes;
use serde_json::Value;
use tower::util::ServiceExt;

use reqcache::gateway::CachedResponse;
use reqcache::{AppState, CacheWorker, EvictionPolicy, MemoryCache, RequestCache, Upstream};

// == Test Origin ==

/// Scriptable origin: per-target bodies, per-target hit counts, and a
/// switch that makes the transport fail.
struct ScriptedOrigin {
    responses: Mutex<HashMap<String, String>>,
    fetches: Mutex<HashMap<String, usize>>,
    failing: AtomicBool,
}

impl ScriptedOrigin {
    fn new() -> Self {
        Self {
            responses: Mutex::new(HashMap::new()),
            fetches: Mutex::new(HashMap::new()),
            failing: AtomicBool::new(false),
        }
    }

    fn respond(&self, target: &str, body: &str) {
        self.responses
            .lock()
            .unwrap()
            .insert(target.to_string(), body.to_string());
    }

    fn fail(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn fetch_count(&self, target: &str) -> usize {
        self.fetches.lock().unwrap().get(target).copied().unwrap_or(0)
    }
}

#[async_trait]
impl Upstream for ScriptedOrigin {
    async fn fetch(&self, target: &str) -> anyhow::Result<CachedResponse> {
        *self
            .fetches
            .lock()
            .unwrap()
            .entry(target.to_string())
            .or_insert(0) += 1;

        if self.failing.load(Ordering::SeqCst) {
            anyhow::bail!("connection refused");
        }

        match self.responses.lock().unwrap().get(target) {
            Some(body) => Ok(CachedResponse::new(
                StatusCode::OK,
                HeaderMap::new(),
                Bytes::from(body.clone()),
            )),
            None => Ok(CachedResponse::new(
                StatusCode::NOT_FOUND,
                HeaderMap::new(),
                Bytes::new(),
            )),
        }
    }

    async fn forward(
        &self,
        _method: Method,
        _target: &str,
        body: Bytes,
    ) -> anyhow::Result<CachedResponse> {
        if self.failing.load(Ordering::SeqCst) {
            anyhow::bail!("connection refused");
        }
        Ok(CachedResponse::new(StatusCode::OK, HeaderMap::new(), body))
    }
}

// == Helper Functions ==

async fn create_test_app(precache: Vec<String>) -> (Router, Arc<ScriptedOrigin>) {
    let origin = Arc::new(ScriptedOrigin::new());
    let worker = Arc::new(CacheWorker::new(
        Arc::clone(&origin) as Arc<dyn Upstream>,
        precache,
    ));
    worker.install().await;
    worker.activate().await;

    let state = AppState {
        worker,
        responses: Arc::new(RequestCache::new(
            100,
            Duration::from_secs(300),
            EvictionPolicy::Lru,
        )),
        ephemeral: Arc::new(tokio::sync::RwLock::new(MemoryCache::new(
            50,
            Duration::from_secs(30),
        ))),
        upstream: Arc::clone(&origin) as Arc<dyn Upstream>,
    };

    (reqcache::create_router(state), origin)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, String) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

async fn post_json(app: &Router, uri: &str, body: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

// == Strategy Tests ==

#[tokio::test]
async fn test_static_assets_are_served_cache_first() {
    let (app, origin) = create_test_app(Vec::new()).await;
    origin.respond("/_next/static/chunk.js", "bundle-v1");

    let (status, body) = get(&app, "/_next/static/chunk.js").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "bundle-v1");

    // The origin moves on, but cache-first keeps serving the stored copy.
    origin.respond("/_next/static/chunk.js", "bundle-v2");
    let (_, body) = get(&app, "/_next/static/chunk.js").await;
    assert_eq!(body, "bundle-v1");
    assert_eq!(origin.fetch_count("/_next/static/chunk.js"), 1);
}

#[tokio::test]
async fn test_images_are_served_cache_first() {
    let (app, origin) = create_test_app(Vec::new()).await;
    origin.respond("/images/logo.png", "png-bytes");

    get(&app, "/images/logo.png").await;
    get(&app, "/images/logo.png").await;

    assert_eq!(origin.fetch_count("/images/logo.png"), 1);
}

#[tokio::test]
async fn test_pages_are_served_network_first() {
    let (app, origin) = create_test_app(Vec::new()).await;
    origin.respond("/dashboard", "v1");

    get(&app, "/dashboard").await;
    origin.respond("/dashboard", "v2");

    let (_, body) = get(&app, "/dashboard").await;
    assert_eq!(body, "v2");
    assert_eq!(origin.fetch_count("/dashboard"), 2);

    // Unreachable origin: the last good response comes from cache.
    origin.fail(true);
    let (status, body) = get(&app, "/dashboard").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "v2");
}

#[tokio::test]
async fn test_api_is_served_stale_while_revalidate() {
    let (app, origin) = create_test_app(Vec::new()).await;
    origin.respond("/api/contacts", "R1");

    // Cold cache waits on the network.
    let (_, body) = get(&app, "/api/contacts").await;
    assert_eq!(body, "R1");

    // Origin now serves R2; the stale R1 is returned immediately.
    origin.respond("/api/contacts", "R2");
    let (_, body) = get(&app, "/api/contacts").await;
    assert_eq!(body, "R1");

    // Once the background refresh settles, R2 is served.
    let mut latest = String::new();
    for _ in 0..50 {
        tokio::time::sleep(Duration::from_millis(5)).await;
        let (_, body) = get(&app, "/api/contacts").await;
        latest = body;
        if latest == "R2" {
            break;
        }
    }
    assert_eq!(latest, "R2");
}

#[tokio::test]
async fn test_unreachable_origin_synthesizes_timeout() {
    let (app, origin) = create_test_app(Vec::new()).await;
    origin.fail(true);

    let (status, body) = get(&app, "/images/logo.png").await;

    assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
    assert!(body.contains("upstream unreachable"));
}

#[tokio::test]
async fn test_precached_assets_skip_the_network() {
    let origin_paths = vec!["/static/app.js".to_string()];
    let (app, origin) = {
        let origin = Arc::new(ScriptedOrigin::new());
        origin.respond("/static/app.js", "precached-bundle");

        let worker = Arc::new(CacheWorker::new(
            Arc::clone(&origin) as Arc<dyn Upstream>,
            origin_paths,
        ));
        worker.install().await;
        worker.activate().await;

        let state = AppState {
            worker,
            responses: Arc::new(RequestCache::new(
                100,
                Duration::from_secs(300),
                EvictionPolicy::Lru,
            )),
            ephemeral: Arc::new(tokio::sync::RwLock::new(MemoryCache::new(
                50,
                Duration::from_secs(30),
            ))),
            upstream: Arc::clone(&origin) as Arc<dyn Upstream>,
        };
        (reqcache::create_router(state), origin)
    };

    // Install already fetched it; serving is pure cache.
    let (status, body) = get(&app, "/static/app.js").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "precached-bundle");
    assert_eq!(origin.fetch_count("/static/app.js"), 1);
}

#[tokio::test]
async fn test_non_get_requests_pass_through() {
    let (app, origin) = create_test_app(Vec::new()).await;
    origin.respond("/api/contacts", "list");

    let (status, json) = post_json(&app, "/api/contacts", r#"{"name":"Ada"}"#).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["name"], "Ada");
    // The interception path was never involved.
    assert_eq!(origin.fetch_count("/api/contacts"), 0);
}

// == Cached Surface Tests ==

#[tokio::test]
async fn test_cached_surface_deduplicates_upstream_reads() {
    let (app, origin) = create_test_app(Vec::new()).await;
    origin.respond("/api/deals", r#"[{"id":1}]"#);

    for _ in 0..5 {
        let (status, body) = get(&app, "/cached/api/deals").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, r#"[{"id":1}]"#);
    }

    assert_eq!(origin.fetch_count("/api/deals"), 1);
}

#[tokio::test]
async fn test_invalidation_removes_matching_entries() {
    let (app, origin) = create_test_app(Vec::new()).await;
    origin.respond("/api/deals", "old");
    origin.respond("/api/notes", "notes");

    get(&app, "/cached/api/deals").await;
    get(&app, "/cached/api/notes").await;

    let (status, json) = post_json(
        &app,
        "/cache/invalidate",
        r#"{"pattern":"^/api/deals"}"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["removed"], 1);

    // The /api/deals entry is gone while /api/notes survives.
    let (_, stats) = get_stats(&app).await;
    assert_eq!(stats["responses"]["store"]["total_entries"], 1);

    let (status, json) = post_json(&app, "/cache/invalidate", "{}").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["removed"], 1);

    let (_, stats) = get_stats(&app).await;
    assert_eq!(stats["responses"]["store"]["total_entries"], 0);
}

#[tokio::test]
async fn test_invalid_pattern_is_rejected() {
    let (app, _) = create_test_app(Vec::new()).await;

    let (status, json) = post_json(&app, "/cache/invalidate", r#"{"pattern":"deals["}"#).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json.get("error").is_some());
}

// == Worker Protocol Tests ==

#[tokio::test]
async fn test_clear_cache_command_empties_areas() {
    let (app, origin) = create_test_app(Vec::new()).await;
    origin.respond("/images/logo.png", "png");

    get(&app, "/images/logo.png").await;

    let (status, json) = post_json(&app, "/worker/message", r#"{"type":"CLEAR_CACHE"}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "caches cleared");

    // The cleared entry is fetched again on the next request.
    get(&app, "/images/logo.png").await;
    assert_eq!(origin.fetch_count("/images/logo.png"), 2);
}

#[tokio::test]
async fn test_skip_waiting_command_is_acknowledged() {
    let (app, _) = create_test_app(Vec::new()).await;

    let (status, json) = post_json(&app, "/worker/message", r#"{"type":"SKIP_WAITING"}"#).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "activation forced");
}

// == Diagnostics Tests ==

async fn get_stats(app: &Router) -> (StatusCode, Value) {
    let (status, body) = get(app, "/cache/stats").await;
    (status, serde_json::from_str(&body).unwrap())
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _) = create_test_app(Vec::new()).await;

    let (status, body) = get(&app, "/health").await;
    let json: Value = serde_json::from_str(&body).unwrap();

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert!(json.get("timestamp").is_some());
}

#[tokio::test]
async fn test_stats_endpoint_reports_all_layers() {
    let (app, origin) = create_test_app(Vec::new()).await;
    origin.respond("/api/contacts", "list");
    origin.respond("/api/deals", "deals");

    get(&app, "/api/contacts").await;
    get(&app, "/cached/api/deals").await;

    let (status, json) = get_stats(&app).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["worker_state"], "active");
    assert_eq!(json["areas"][0]["name"], "reqcache-api-v1");
    assert_eq!(json["areas"][0]["entries"], 1);
    assert_eq!(json["responses"]["store"]["total_entries"], 1);
    assert_eq!(json["ephemeral_entries"], 1);
}
