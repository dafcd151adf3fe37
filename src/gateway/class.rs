//! Request Classification Module
//!
//! Decides, from the request path alone, which cache area and strategy a
//! GET request belongs to. Classification is a pure function; the strategy
//! for each class is a closed mapping resolved here, never re-interpreted
//! downstream.

use crate::gateway::resources::{API_CACHE, DYNAMIC_CACHE, STATIC_CACHE};

/// Path prefixes served as static assets.
pub const STATIC_PREFIXES: &[&str] = &["/static/", "/assets/", "/_next/static/"];

/// Path prefix of the JSON API.
pub const API_PREFIX: &str = "/api/";

/// Script, style and font extensions treated as static assets wherever they
/// live.
const ASSET_EXTENSIONS: &[&str] = &["js", "css", "woff", "woff2", "ttf", "otf"];

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "svg", "webp", "ico"];

// == Request Class ==
/// The request families the gateway distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestClass {
    StaticAsset,
    Api,
    Image,
    Other,
}

// == Strategy ==
/// How a classified request is served against cache and network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Serve from cache; fall back to the network and cache the result
    CacheFirst,
    /// Serve from the network; fall back to cache when it is unreachable
    NetworkFirst,
    /// Serve the cached response immediately and refresh it in the
    /// background
    StaleWhileRevalidate,
}

// == Classify ==
/// Classifies a request path; the first matching rule wins.
pub fn classify(path: &str) -> RequestClass {
    if STATIC_PREFIXES.iter().any(|prefix| path.starts_with(prefix))
        || has_extension(path, ASSET_EXTENSIONS)
    {
        return RequestClass::StaticAsset;
    }
    if path.starts_with(API_PREFIX) {
        return RequestClass::Api;
    }
    if has_extension(path, IMAGE_EXTENSIONS) {
        return RequestClass::Image;
    }
    RequestClass::Other
}

impl RequestClass {
    /// The strategy a class is served with.
    pub fn strategy(self) -> Strategy {
        match self {
            RequestClass::StaticAsset => Strategy::CacheFirst,
            RequestClass::Api => Strategy::StaleWhileRevalidate,
            RequestClass::Image => Strategy::CacheFirst,
            RequestClass::Other => Strategy::NetworkFirst,
        }
    }

    /// The named cache area responses of this class are stored in.
    pub fn cache_area(self) -> &'static str {
        match self {
            RequestClass::StaticAsset => STATIC_CACHE,
            RequestClass::Api => API_CACHE,
            RequestClass::Image => DYNAMIC_CACHE,
            RequestClass::Other => DYNAMIC_CACHE,
        }
    }
}

fn has_extension(path: &str, extensions: &[&str]) -> bool {
    path.rsplit('/')
        .next()
        .and_then(|file| file.rsplit_once('.'))
        .map(|(_, extension)| {
            extensions
                .iter()
                .any(|candidate| extension.eq_ignore_ascii_case(candidate))
        })
        .unwrap_or(false)
}
