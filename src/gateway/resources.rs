//! Resource Cache Module
//!
//! Stored HTTP responses organized into named, versioned cache areas. The
//! area identifiers are versioned so that activation can recognize and
//! drop areas left behind by an older worker.

use std::collections::HashMap;

use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;

/// Area holding precached and on-demand static assets.
pub const STATIC_CACHE: &str = "reqcache-static-v1";

/// Area holding images and network-first fallbacks.
pub const DYNAMIC_CACHE: &str = "reqcache-dynamic-v1";

/// Area holding API responses served stale-while-revalidate.
pub const API_CACHE: &str = "reqcache-api-v1";

/// The areas the current worker recognizes; anything else is stale.
pub const CURRENT_CACHES: &[&str] = &[STATIC_CACHE, DYNAMIC_CACHE, API_CACHE];

// == Cached Response ==
/// A stored HTTP response: status, headers and body.
#[derive(Debug, Clone)]
pub struct CachedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl CachedResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Whether the response may be cached as a success (2xx).
    pub fn is_ok(&self) -> bool {
        self.status.is_success()
    }

    /// Synthesized response for an unreachable upstream with no cached
    /// fallback. The caller always receives a response, never a transport
    /// error.
    pub fn timeout() -> Self {
        Self::synthesized(StatusCode::REQUEST_TIMEOUT, "upstream unreachable")
    }

    /// Synthesized response for a failed pass-through request.
    pub fn bad_gateway() -> Self {
        Self::synthesized(StatusCode::BAD_GATEWAY, "upstream request failed")
    }

    fn synthesized(status: StatusCode, message: &str) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        let body = format!("{{\"error\":\"{}\"}}", message);
        Self {
            status,
            headers,
            body: Bytes::from(body),
        }
    }
}

impl IntoResponse for CachedResponse {
    fn into_response(self) -> Response {
        (self.status, self.headers, self.body).into_response()
    }
}

// == Resource Cache ==
/// Named cache areas mapping request targets to stored responses.
#[derive(Debug, Default)]
pub struct ResourceCache {
    areas: HashMap<String, HashMap<String, CachedResponse>>,
}

impl ResourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    // == Get ==
    pub fn get(&self, area: &str, target: &str) -> Option<CachedResponse> {
        self.areas.get(area).and_then(|area| area.get(target)).cloned()
    }

    // == Put ==
    /// Stores a response, creating the area on first use.
    pub fn put(&mut self, area: &str, target: &str, response: CachedResponse) {
        self.areas
            .entry(area.to_string())
            .or_default()
            .insert(target.to_string(), response);
    }

    // == Purge Stale ==
    /// Deletes every area whose identifier is not in [`CURRENT_CACHES`];
    /// returns the names removed.
    pub fn purge_stale(&mut self) -> Vec<String> {
        let stale: Vec<String> = self
            .areas
            .keys()
            .filter(|name| !CURRENT_CACHES.contains(&name.as_str()))
            .cloned()
            .collect();

        for name in &stale {
            self.areas.remove(name);
        }

        stale
    }

    // == Clear All ==
    pub fn clear_all(&mut self) {
        self.areas.clear();
    }

    // == Area Sizes ==
    /// Entry counts per area, sorted by area name for stable output.
    pub fn area_sizes(&self) -> Vec<(String, usize)> {
        let mut sizes: Vec<(String, usize)> = self
            .areas
            .iter()
            .map(|(name, area)| (name.clone(), area.len()))
            .collect();
        sizes.sort();
        sizes
    }

    /// Total number of stored responses across all areas.
    pub fn len(&self) -> usize {
        self.areas.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
