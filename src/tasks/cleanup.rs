//! TTL Cleanup Task
//!
//! Background task that periodically sweeps expired entries out of a
//! shared memory cache, so expiry cost is not paid on the read path.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::memory::MemoryCache;

/// Spawns a background task that periodically sweeps a shared memory
/// cache.
///
/// The task loops forever, sleeping between sweeps; abort the returned
/// handle during graceful shutdown.
///
/// # Arguments
/// * `cache` - Shared memory cache to sweep
/// * `cleanup_interval_secs` - Seconds between sweeps
pub fn spawn_cleanup_task<V>(
    cache: Arc<RwLock<MemoryCache<V>>>,
    cleanup_interval_secs: u64,
) -> JoinHandle<()>
where
    V: Clone + Send + Sync + 'static,
{
    let interval = Duration::from_secs(cleanup_interval_secs);

    tokio::spawn(async move {
        info!(
            "Starting TTL cleanup task with interval of {} seconds",
            cleanup_interval_secs
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = {
                let mut cache = cache.write().await;
                cache.cleanup()
            };

            if removed > 0 {
                info!("TTL cleanup: removed {} expired entries", removed);
            } else {
                debug!("TTL cleanup: no expired entries found");
            }
        }
    })
}
