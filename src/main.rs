//! reqcache gateway - a caching layer in front of an HTTP origin
//!
//! Intercepts GET traffic and serves it with per-request-class caching
//! strategies, exposes a coalesced response cache under /cached, and
//! drives the cache worker lifecycle.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::signal;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reqcache::{
    create_router, spawn_cleanup_task, AppState, CacheWorker, Config, HttpUpstream, MemoryCache,
    RequestCache, TimerRegistry, Upstream,
};

/// Main entry point for the reqcache gateway.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Construct the caches and the worker (explicit composition root)
/// 4. Run the worker install/activate lifecycle
/// 5. Start the background cleanup task and stats timer
/// 6. Create the axum router and serve
/// 7. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reqcache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting reqcache gateway");

    let config = Config::from_env();
    info!(
        "Configuration loaded: max_entries={}, default_ttl={}s, policy={:?}, port={}, upstream={}",
        config.max_entries,
        config.default_ttl,
        config.eviction_policy,
        config.server_port,
        config.upstream_url
    );

    // Composition root: every cache instance is constructed here and
    // injected; nothing in the library is process-global.
    let upstream: Arc<dyn Upstream> = Arc::new(HttpUpstream::new(&config.upstream_url));
    let worker = Arc::new(CacheWorker::new(
        Arc::clone(&upstream),
        config.precache_paths.clone(),
    ));

    worker.install().await;
    worker.activate().await;

    let responses = Arc::new(RequestCache::new(
        config.max_entries,
        Duration::from_secs(config.default_ttl),
        config.eviction_policy,
    ));
    let ephemeral = Arc::new(RwLock::new(MemoryCache::new(
        config.memory_capacity,
        Duration::from_secs(config.memory_ttl),
    )));

    let cleanup_handle = spawn_cleanup_task(Arc::clone(&ephemeral), config.cleanup_interval);
    info!("Background cleanup task started");

    let timers = TimerRegistry::new();
    {
        let responses = Arc::clone(&responses);
        timers.start("stats-report", Duration::from_secs(60), move || {
            let responses = Arc::clone(&responses);
            async move {
                let stats = responses.stats().await;
                debug!(
                    hits = stats.store.hits,
                    misses = stats.store.misses,
                    coalesced = stats.coalesced,
                    entries = stats.store.total_entries,
                    "response cache utilization"
                );
            }
        });
    }

    let state = AppState {
        worker,
        responses,
        ephemeral,
        upstream,
    };
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    info!("Gateway listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cleanup_handle, timers))
        .await
        .unwrap();

    info!("Gateway shutdown complete");
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, stops the background tasks and allows graceful
/// shutdown.
async fn shutdown_signal(cleanup_handle: JoinHandle<()>, timers: TimerRegistry) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    cleanup_handle.abort();
    timers.stop_all();
    warn!("Background tasks stopped");
}
