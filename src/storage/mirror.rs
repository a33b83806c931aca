//! Storage Mirror Module
//!
//! Fire-and-forget handle used by the caches to mirror their mutations.

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::{self, JoinHandle};
use tracing::{debug, error, info, warn};

use super::kv::{KvStore, StorageOp};

// == Storage Mirror ==
/// Cloneable sender side of the storage writer.
///
/// Sending never blocks and never reports failure. A detached mirror (or one
/// whose writer has stopped) silently drops every operation.
#[derive(Debug, Clone, Default)]
pub struct StorageMirror {
    tx: Option<UnboundedSender<StorageOp>>,
}

impl StorageMirror {
    /// A mirror that persists nothing.
    pub fn detached() -> Self {
        Self { tx: None }
    }

    /// Creates a mirror plus the receiving end, for callers that drive the
    /// writer themselves (tests, custom writers).
    pub fn channel() -> (Self, UnboundedReceiver<StorageOp>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    pub fn is_detached(&self) -> bool {
        self.tx.is_none()
    }

    /// Queues an upsert of `pairs`. Empty batches are skipped.
    pub fn set(&self, pairs: Vec<(String, serde_json::Value)>) {
        if !pairs.is_empty() {
            self.send(StorageOp::Set(pairs));
        }
    }

    /// Queues removal of `keys`. Empty batches are skipped.
    pub fn remove(&self, keys: Vec<String>) {
        if !keys.is_empty() {
            self.send(StorageOp::Remove(keys));
        }
    }

    fn send(&self, op: StorageOp) {
        if let Some(tx) = &self.tx {
            if tx.send(op).is_err() {
                debug!("Storage writer gone, dropping operation");
            }
        }
    }
}

// == Writer Task ==
/// Spawns the background task that applies mirrored operations to `store`.
///
/// Operations already queued when the writer wakes up are applied as one
/// batch on the blocking pool, so a slow backend never stalls a runtime
/// worker. The task ends once every [`StorageMirror`] clone has been dropped.
pub fn spawn_storage_writer<S: KvStore>(mut store: S) -> (StorageMirror, JoinHandle<()>) {
    let (mirror, mut rx) = StorageMirror::channel();

    let handle = tokio::spawn(async move {
        info!("Storage writer started");
        while let Some(first) = rx.recv().await {
            let mut batch = vec![first];
            while let Ok(op) = rx.try_recv() {
                batch.push(op);
            }
            let size = batch.len();

            let outcome = task::spawn_blocking(move || {
                let result = store.apply_batch(batch);
                (store, result)
            })
            .await;

            match outcome {
                Ok((returned, result)) => {
                    store = returned;
                    match result {
                        Ok(()) => debug!(ops = size, "Storage batch applied"),
                        Err(e) => warn!(ops = size, error = %e, "Dropping failed storage write"),
                    }
                }
                Err(e) => {
                    error!(error = %e, "Storage writer crashed, further writes are lost");
                    return;
                }
            }
        }
        info!("Storage writer stopped");
    });

    (mirror, handle)
}
