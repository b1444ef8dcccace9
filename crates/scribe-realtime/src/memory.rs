//! In-memory notifier for single-node deployments and tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::sync::{broadcast, mpsc};
use tracing::warn;

use scribe_core::result::AppResult;
use scribe_core::types::JobId;

use crate::event::StatusEvent;
use crate::notifier::{StatusNotifier, StatusStream};

/// In-memory notifier backed by one `tokio::sync::broadcast` channel per
/// job id.
///
/// A channel is created on first subscribe and removed by the last
/// forwarder to leave, so a channel lives only while a client is
/// actively listening and publishing to a job nobody watches is a no-op.
#[derive(Debug)]
pub struct MemoryNotifier {
    /// Job id → broadcast sender. Shared with the forwarder tasks so
    /// they can prune their own entry on exit.
    channels: Arc<RwLock<HashMap<JobId, broadcast::Sender<StatusEvent>>>>,
    /// Buffer size for channels and subscription streams.
    buffer_size: usize,
}

impl MemoryNotifier {
    /// Create a new in-memory notifier.
    pub fn new(buffer_size: usize) -> Self {
        Self {
            channels: Arc::new(RwLock::new(HashMap::new())),
            buffer_size,
        }
    }

    /// Number of jobs that currently have at least one subscriber.
    pub async fn active_channels(&self) -> usize {
        self.channels.read().await.len()
    }
}

#[async_trait]
impl StatusNotifier for MemoryNotifier {
    async fn publish(&self, event: &StatusEvent) {
        let stale = {
            let channels = self.channels.read().await;
            match channels.get(&event.job_id) {
                Some(tx) if tx.receiver_count() > 0 => {
                    // Send only fails when every receiver vanished between
                    // the count check and now; that is the same silent loss
                    // the contract already allows.
                    let _ = tx.send(event.clone());
                    false
                }
                Some(_) => true,
                None => false,
            }
        };

        if stale {
            let mut channels = self.channels.write().await;
            if let Some(tx) = channels.get(&event.job_id) {
                if tx.receiver_count() == 0 {
                    channels.remove(&event.job_id);
                }
            }
        }
    }

    async fn subscribe(&self, job_id: JobId) -> AppResult<StatusStream> {
        let mut rx = {
            let mut channels = self.channels.write().await;
            channels
                .entry(job_id)
                .or_insert_with(|| broadcast::channel(self.buffer_size).0)
                .subscribe()
        };

        let (tx, stream_rx) = mpsc::channel(self.buffer_size);
        let channels = Arc::clone(&self.channels);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    // Exit as soon as the stream side is gone; waiting
                    // for a next event would park here forever on a job
                    // that never publishes again.
                    _ = tx.closed() => break,
                    received = rx.recv() => match received {
                        Ok(event) => {
                            if tx.send(event).await.is_err() {
                                break;
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(missed)) => {
                            warn!(%job_id, missed, "Status subscriber lagged, events dropped");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                }
            }

            // Release our broadcast receiver, then prune the entry if we
            // were the last one.
            drop(rx);
            let mut channels = channels.write().await;
            if let Some(sender) = channels.get(&job_id) {
                if sender.receiver_count() == 0 {
                    channels.remove(&job_id);
                }
            }
        });

        Ok(StatusStream::new(stream_rx))
    }
}
