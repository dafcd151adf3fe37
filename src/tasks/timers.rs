//! Timer Registry
//!
//! Interval-based callbacks with explicit per-id start and stop. A sibling
//! utility of the caches, not part of them: the registry knows nothing
//! about what its callbacks do.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

// == Timer Registry ==
/// Named interval timers backed by tokio tasks.
#[derive(Debug, Default)]
pub struct TimerRegistry {
    timers: Mutex<HashMap<String, JoinHandle<()>>>,
}

impl TimerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // == Start ==
    /// Starts an interval timer under the given id; the callback runs once
    /// per period. Starting an id that is already running replaces its
    /// timer.
    pub fn start<F, Fut>(&self, id: impl Into<String>, period: Duration, tick: F)
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let id = id.into();
        debug!(id = id.as_str(), ?period, "starting timer");

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // The first tick of a tokio interval completes immediately;
            // consume it so the callback first runs after one full period.
            interval.tick().await;
            loop {
                interval.tick().await;
                tick().await;
            }
        });

        if let Some(previous) = self.lock().insert(id, handle) {
            previous.abort();
        }
    }

    // == Stop ==
    /// Stops the timer with the given id; a no-op for unknown ids.
    /// Returns whether a timer was running.
    pub fn stop(&self, id: &str) -> bool {
        match self.lock().remove(id) {
            Some(handle) => {
                handle.abort();
                debug!(id, "stopped timer");
                true
            }
            None => false,
        }
    }

    // == Stop All ==
    pub fn stop_all(&self) {
        let mut timers = self.lock();
        for (_, handle) in timers.drain() {
            handle.abort();
        }
    }

    /// Whether a timer with the given id is registered.
    pub fn is_running(&self, id: &str) -> bool {
        self.lock().contains_key(id)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, JoinHandle<()>>> {
        self.timers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for TimerRegistry {
    fn drop(&mut self) {
        self.stop_all();
    }
}
