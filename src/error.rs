//! Error types for the caching toolkit
//!
//! Provides unified error handling using thiserror, plus the shared
//! producer-failure type handed to every caller coalesced on a key.

use std::fmt;
use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the gateway surface.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Invalidation pattern failed to parse as a regular expression
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The upstream produced an unusable result
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            CacheError::InvalidPattern(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            CacheError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            CacheError::Upstream(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            CacheError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the gateway surface.
pub type Result<T> = std::result::Result<T, CacheError>;

// == Fetch Error ==
/// Failure of an asynchronous producer.
///
/// Cloning is cheap, so every caller coalesced on the same in-flight key
/// observes the identical failure. The producer error itself is kept opaque;
/// callers that need details can walk the `source` chain.
#[derive(Debug, Clone)]
pub struct FetchError(Arc<anyhow::Error>);

impl FetchError {
    /// Wraps a producer error for distribution to all waiters.
    pub fn new(error: anyhow::Error) -> Self {
        Self(Arc::new(error))
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        let source: &(dyn std::error::Error + Send + Sync + 'static) = self.0.as_ref().as_ref();
        Some(source)
    }
}
