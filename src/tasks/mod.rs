//! Background Tasks Module
//!
//! Process-owned periodic work: the TTL cleanup sweep and the generic
//! per-id timer registry.

pub mod cleanup;
pub mod timers;

pub use cleanup::spawn_cleanup_task;
pub use timers::TimerRegistry;
