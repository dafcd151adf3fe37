//! Models Module
//!
//! Request and response DTOs for the gateway surface and the worker
//! message protocol.

pub mod messages;
pub mod responses;

pub use messages::{InvalidateRequest, WorkerCommand};
pub use responses::{
    AreaStats, GatewayStatsResponse, HealthResponse, InvalidateResponse, MessageResponse,
};
