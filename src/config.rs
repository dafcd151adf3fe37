//! Configuration Module
//!
//! Handles loading and managing gateway configuration from environment
//! variables.

use std::env;

use crate::store::EvictionPolicy;

/// Gateway configuration parameters.
///
/// All values can be configured via environment variables with sensible
/// defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of entries in the response cache
    pub max_entries: usize,
    /// TTL in seconds for response cache entries
    pub default_ttl: u64,
    /// Eviction policy of the response cache
    pub eviction_policy: EvictionPolicy,
    /// Capacity of the ephemeral memory cache
    pub memory_capacity: usize,
    /// TTL in seconds for ephemeral memory cache entries
    pub memory_ttl: u64,
    /// HTTP server port
    pub server_port: u16,
    /// Background cleanup task interval in seconds
    pub cleanup_interval: u64,
    /// Base URL of the upstream origin
    pub upstream_url: String,
    /// Static-asset targets fetched into the cache during install
    pub precache_paths: Vec<String>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MAX_ENTRIES` - Response cache capacity (default: 1000)
    /// - `DEFAULT_TTL` - Response cache TTL in seconds (default: 300)
    /// - `EVICTION_POLICY` - `lru`, `lfu` or `fifo` (default: lru)
    /// - `MEMORY_CAPACITY` - Ephemeral cache capacity (default: 50)
    /// - `MEMORY_TTL` - Ephemeral cache TTL in seconds (default: 60)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CLEANUP_INTERVAL` - Sweep frequency in seconds (default: 30)
    /// - `UPSTREAM_URL` - Origin base URL (default: http://127.0.0.1:8080)
    /// - `PRECACHE_PATHS` - Comma-separated install targets
    pub fn from_env() -> Self {
        Self {
            max_entries: env::var("MAX_ENTRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1000),
            default_ttl: env::var("DEFAULT_TTL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(300),
            eviction_policy: env::var("EVICTION_POLICY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_default(),
            memory_capacity: env::var("MEMORY_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(50),
            memory_ttl: env::var("MEMORY_TTL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            cleanup_interval: env::var("CLEANUP_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
            upstream_url: env::var("UPSTREAM_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:8080".to_string()),
            precache_paths: env::var("PRECACHE_PATHS")
                .ok()
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|path| !path.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_entries: 1000,
            default_ttl: 300,
            eviction_policy: EvictionPolicy::Lru,
            memory_capacity: 50,
            memory_ttl: 60,
            server_port: 3000,
            cleanup_interval: 30,
            upstream_url: "http://127.0.0.1:8080".to_string(),
            precache_paths: Vec::new(),
        }
    }
}
