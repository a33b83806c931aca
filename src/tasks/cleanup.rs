//! Expiry Sweep Task
//!
//! Background task that periodically drops expired records from the head of
//! a temporal cache.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::TemporalCache;

/// Spawns a background task running a non-forced `free` on `cache` every
/// `cleanup_interval_secs` seconds.
///
/// The write lock is held only for the sweep itself. The returned handle is
/// aborted during graceful shutdown.
///
/// # Example
/// ```ignore
/// let trackers = Arc::new(RwLock::new(cache));
/// let cleanup_handle = spawn_cleanup_task(trackers.clone(), 60);
/// // Later, during shutdown:
/// cleanup_handle.abort();
/// ```
pub fn spawn_cleanup_task<V>(
    cache: Arc<RwLock<TemporalCache<V>>>,
    cleanup_interval_secs: u64,
) -> JoinHandle<()>
where
    V: Clone + Serialize + Send + Sync + 'static,
{
    let interval = Duration::from_secs(cleanup_interval_secs);

    tokio::spawn(async move {
        info!(
            "Starting expiry sweep task with interval of {} seconds",
            cleanup_interval_secs
        );

        loop {
            tokio::time::sleep(interval).await;

            let (removed, namespace) = {
                let mut cache_guard = cache.write().await;
                (cache_guard.free(false), cache_guard.namespace().to_string())
            };

            if removed > 0 {
                info!(namespace = %namespace, removed, "Expiry sweep removed records");
            } else {
                debug!(namespace = %namespace, "Expiry sweep found nothing to remove");
            }
        }
    })
}
