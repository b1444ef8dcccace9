//! Redis pub/sub notifier for multi-node deployments.
//!
//! Events travel over `PUBLISH`/`SUBSCRIBE` on one channel per job id,
//! which carries exactly the delivery guarantees the notifier contract
//! asks for: fan-out to current subscribers, nothing stored, no replay.

use async_trait::async_trait;
use futures::StreamExt;
use redis::aio::ConnectionManager;
use redis::Client;
use tokio::sync::mpsc;
use tracing::{info, warn};

use scribe_core::error::{AppError, ErrorKind};
use scribe_core::result::AppResult;
use scribe_core::types::JobId;

use crate::event::StatusEvent;
use crate::notifier::{StatusNotifier, StatusStream};

/// Redis-backed notifier.
#[derive(Debug, Clone)]
pub struct RedisNotifier {
    /// Client handle, needed to open dedicated pub/sub connections.
    client: Client,
    /// Multiplexed connection for the publish side.
    conn: ConnectionManager,
    /// Key prefix shared with the job store keys.
    key_prefix: String,
    /// Buffer size for subscription streams.
    buffer_size: usize,
}

impl RedisNotifier {
    /// Connect to Redis and build a notifier.
    pub async fn connect(url: &str, key_prefix: &str, buffer_size: usize) -> AppResult<Self> {
        let client = Client::open(url).map_err(|e| {
            AppError::with_source(ErrorKind::Notify, "Failed to create Redis client", e)
        })?;

        let conn = ConnectionManager::new(client.clone()).await.map_err(|e| {
            AppError::with_source(ErrorKind::Notify, "Failed to connect to Redis", e)
        })?;

        info!("Status notifier connected to Redis");
        Ok(Self {
            client,
            conn,
            key_prefix: key_prefix.to_string(),
            buffer_size,
        })
    }

    /// Channel name for one job's status events.
    fn channel(&self, job_id: JobId) -> String {
        format!("{}job:{job_id}:status", self.key_prefix)
    }
}

#[async_trait]
impl StatusNotifier for RedisNotifier {
    async fn publish(&self, event: &StatusEvent) {
        let channel = self.channel(event.job_id);

        let payload = match serde_json::to_string(event) {
            Ok(p) => p,
            Err(e) => {
                warn!(job_id = %event.job_id, "Failed to encode status event: {e}");
                return;
            }
        };

        let mut conn = self.conn.clone();
        let result: Result<i64, redis::RedisError> = redis::cmd("PUBLISH")
            .arg(&channel)
            .arg(&payload)
            .query_async(&mut conn)
            .await;

        // Notification is best-effort: a failed publish must never fail
        // the store update that triggered it.
        if let Err(e) = result {
            warn!(job_id = %event.job_id, "Redis PUBLISH failed: {e}");
        }
    }

    async fn subscribe(&self, job_id: JobId) -> AppResult<StatusStream> {
        let channel = self.channel(job_id);

        let mut pubsub = self.client.get_async_pubsub().await.map_err(|e| {
            AppError::with_source(ErrorKind::Notify, "Failed to open pub/sub connection", e)
        })?;
        pubsub.subscribe(&channel).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Notify,
                format!("Failed to subscribe to '{channel}'"),
                e,
            )
        })?;

        let (tx, stream_rx) = mpsc::channel(self.buffer_size);
        tokio::spawn(async move {
            let mut messages = pubsub.on_message();
            while let Some(msg) = messages.next().await {
                let payload: String = match msg.get_payload() {
                    Ok(p) => p,
                    Err(e) => {
                        warn!(%job_id, "Unreadable status message: {e}");
                        continue;
                    }
                };
                match serde_json::from_str::<StatusEvent>(&payload) {
                    Ok(event) => {
                        if tx.send(event).await.is_err() {
                            // Subscriber gone; closing the pub/sub
                            // connection unsubscribes us.
                            break;
                        }
                    }
                    Err(e) => warn!(%job_id, "Undecodable status event: {e}"),
                }
            }
        });

        Ok(StatusStream::new(stream_rx))
    }
}
