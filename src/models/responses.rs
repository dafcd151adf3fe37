//! Response DTOs for the gateway API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::coalesce::RequestCacheStats;

// == Message Response ==
/// Response body for the worker message endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    /// Confirmation of the applied command
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// == Invalidate Response ==
/// Response body for response-cache invalidation.
#[derive(Debug, Clone, Serialize)]
pub struct InvalidateResponse {
    /// Number of entries removed
    pub removed: usize,
}

// == Area Stats ==
/// Entry count of one named cache area.
#[derive(Debug, Clone, Serialize)]
pub struct AreaStats {
    pub name: String,
    pub entries: usize,
}

// == Gateway Stats Response ==
/// Response body for the stats endpoint (GET /cache/stats).
#[derive(Debug, Clone, Serialize)]
pub struct GatewayStatsResponse {
    /// Lifecycle state of the cache worker
    pub worker_state: String,
    /// Per-area entry counts of the resource cache
    pub areas: Vec<AreaStats>,
    /// Counters of the response cache behind /cached
    pub responses: RequestCacheStats,
    /// Entries currently held by the ephemeral cache
    pub ephemeral_entries: usize,
}

// == Health Response ==
/// Response body for the health endpoint (GET /health).
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
