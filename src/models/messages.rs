//! Command DTOs for the worker message protocol
//!
//! Commands arrive as JSON messages from the controlled application, tagged
//! by a `type` field, e.g. `{"type": "SKIP_WAITING"}`.

use serde::Deserialize;

// == Worker Command ==
/// A command delivered to the cache worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "type")]
pub enum WorkerCommand {
    /// Force a waiting worker active immediately
    #[serde(rename = "SKIP_WAITING")]
    SkipWaiting,
    /// Purge every named cache area
    #[serde(rename = "CLEAR_CACHE")]
    ClearCache,
}

// == Invalidate Request ==
/// Request body for response-cache invalidation.
#[derive(Debug, Clone, Deserialize)]
pub struct InvalidateRequest {
    /// Regular expression matched against cached keys; absent means
    /// "clear everything"
    #[serde(default)]
    pub pattern: Option<String>,
}
