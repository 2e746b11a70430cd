//! # Worker manager and the fan-in merge.
//!
//! One copy task per input stream moves items onto the shared merged
//! stream, selecting against root-token cancellation on both the receive
//! and the send side, so a stuck consumer cannot wedge shutdown. Every
//! copy task owns a clone of the merged sender and drops it on exit; the
//! merged stream therefore closes exactly once, only after every producer
//! has finished.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::models::Entity;
use crate::worker::contract::{
    EntityWorker, PubSubConfig, PubSubMessage, PubSubSubscription, PubSubWorker,
};

/// Depth of the merged output stream.
const MERGED_QUEUE_CAPACITY: usize = 64;

/// # Starts producers and tracks their cancellation handles.
///
/// The tracking map is the manager's only shared mutable state and is
/// guarded by its own mutex; producer streams are owned by the fan-in copy
/// tasks.
#[derive(Default)]
pub struct WorkerManager {
    workers: Mutex<HashMap<String, CancellationToken>>,
}

impl WorkerManager {
    /// Creates an empty manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts the given entity producers under `root` and returns their
    /// merged output stream.
    ///
    /// Each producer gets a child token recorded under its ID. A producer
    /// that fails to start is logged and skipped; the batch continues and
    /// the merged stream simply lacks its items.
    pub async fn start_entity_workers(
        &self,
        root: &CancellationToken,
        workers: &[Arc<dyn EntityWorker>],
    ) -> mpsc::Receiver<Entity> {
        let mut streams = Vec::with_capacity(workers.len());
        let mut tracked = self.workers.lock().await;

        for worker in workers {
            let child = root.child_token();
            match worker.start(child.clone()).await {
                Ok(stream) => {
                    tracked.insert(worker.id().to_owned(), child);
                    streams.push(stream);
                    debug!(id = worker.id(), "started worker");
                }
                Err(err) => {
                    warn!(id = worker.id(), error = %err, "could not start worker");
                }
            }
        }

        drop(tracked);
        merge(root, streams)
    }

    /// Starts the given pub/sub producers under `root`.
    ///
    /// Their configuration descriptors and subscriptions are accumulated
    /// into flat lists; only the outbound-message streams are merged.
    pub async fn start_pubsub_workers(
        &self,
        root: &CancellationToken,
        workers: &[Arc<dyn PubSubWorker>],
    ) -> (
        Vec<PubSubConfig>,
        Vec<PubSubSubscription>,
        mpsc::Receiver<PubSubMessage>,
    ) {
        let mut configs = Vec::new();
        let mut subscriptions = Vec::new();
        let mut streams = Vec::with_capacity(workers.len());
        let mut tracked = self.workers.lock().await;

        for worker in workers {
            let child = root.child_token();
            match worker.start(child.clone()).await {
                Ok(bundle) => {
                    tracked.insert(worker.id().to_owned(), child);
                    configs.extend(bundle.configs);
                    subscriptions.extend(bundle.subscriptions);
                    streams.push(bundle.messages);
                    debug!(id = worker.id(), "started worker");
                }
                Err(err) => {
                    warn!(id = worker.id(), error = %err, "could not start worker");
                }
            }
        }

        drop(tracked);
        (configs, subscriptions, merge(root, streams))
    }

    /// Stops the workers with the given IDs by cancelling their child
    /// tokens. An unknown or already-stopped ID is a logged no-op.
    pub async fn stop_workers(&self, ids: &[&str]) {
        let mut tracked = self.workers.lock().await;

        for id in ids {
            match tracked.remove(*id) {
                Some(token) => {
                    token.cancel();
                    debug!(id, "stopped worker");
                }
                None => {
                    warn!(id, "unknown worker or worker not running");
                }
            }
        }
    }

    /// IDs of workers that have been started and not explicitly stopped.
    ///
    /// The tracking map holds cancellation handles, not liveness: a worker
    /// whose stream ends on its own stays listed until
    /// [`WorkerManager::stop_workers`] removes it.
    pub async fn running(&self) -> Vec<String> {
        self.workers.lock().await.keys().cloned().collect()
    }
}

/// Fan-in: merges N input streams into one output stream.
///
/// Spawns one copy task per input. Each task forwards items until its input
/// closes, the root token is cancelled, or the consumer goes away — then
/// drops its sender clone. The merged receiver yields `None` exactly once,
/// after all copy tasks have finished.
fn merge<T: Send + 'static>(
    root: &CancellationToken,
    inputs: Vec<mpsc::Receiver<T>>,
) -> mpsc::Receiver<T> {
    let (out_tx, out_rx) = mpsc::channel(MERGED_QUEUE_CAPACITY);

    for mut input in inputs {
        let out = out_tx.clone();
        let token = root.clone();

        tokio::spawn(async move {
            loop {
                let item = tokio::select! {
                    _ = token.cancelled() => break,
                    received = input.recv() => match received {
                        Some(item) => item,
                        None => break,
                    },
                };

                let delivered = tokio::select! {
                    _ = token.cancelled() => break,
                    sent = out.send(item) => sent.is_ok(),
                };
                if !delivered {
                    break;
                }
            }
        });
    }

    // The last copy task to exit drops the final sender and closes the
    // merged stream.
    out_rx
}
