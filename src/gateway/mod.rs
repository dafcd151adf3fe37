//! Gateway Module
//!
//! The HTTP origin boundary: requests are intercepted, classified and
//! served by per-class caching strategies against named cache areas, with
//! an explicit worker lifecycle and a command protocol for the controlled
//! application.

pub mod class;
pub mod resources;
pub mod routes;
pub mod upstream;
pub mod worker;

pub use class::{classify, RequestClass, Strategy};
pub use resources::{CachedResponse, ResourceCache};
pub use routes::{create_router, AppState};
pub use upstream::{HttpUpstream, Upstream};
pub use worker::{CacheWorker, WorkerState};
