//! Redis-backed FIFO work queue.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tokio::sync::Mutex;
use tracing::debug;

use scribe_core::error::{AppError, ErrorKind};
use scribe_core::result::AppResult;
use scribe_core::types::JobId;

use crate::keys;
use crate::queue::WorkQueue;

use super::client::RedisClient;

/// Redis list acting as the FIFO work queue.
///
/// Producers LPUSH, consumers BRPOP; Redis hands each element to exactly
/// one blocked consumer. BRPOP parks its connection, so blocking pops run
/// on a dedicated connection serialized by a mutex rather than the shared
/// multiplexed one.
#[derive(Debug)]
pub struct RedisWorkQueue {
    client: RedisClient,
    blocking_conn: Mutex<ConnectionManager>,
    pending_key: String,
}

impl RedisWorkQueue {
    /// Create a new queue using `client` for non-blocking commands and a
    /// dedicated connection from the same config for BRPOP.
    pub fn new(client: RedisClient, blocking_conn: ConnectionManager) -> Self {
        let pending_key = keys::pending_list(client.prefix());
        Self {
            client,
            blocking_conn: Mutex::new(blocking_conn),
            pending_key,
        }
    }

    fn map_err(e: redis::RedisError) -> AppError {
        AppError::with_source(ErrorKind::Queue, format!("Redis error: {e}"), e)
    }
}

#[async_trait]
impl WorkQueue for RedisWorkQueue {
    async fn enqueue(&self, job_id: JobId) -> AppResult<()> {
        let mut conn = self.client.conn_mut();
        let _: () = conn
            .lpush(&self.pending_key, job_id.to_string())
            .await
            .map_err(Self::map_err)?;
        debug!(%job_id, "Enqueued job");
        Ok(())
    }

    async fn dequeue(&self, timeout: Duration) -> AppResult<Option<JobId>> {
        let mut conn = self.blocking_conn.lock().await;

        // BRPOP returns (key, value) or nil on timeout.
        let reply: Option<(String, String)> = redis::cmd("BRPOP")
            .arg(&self.pending_key)
            .arg(timeout.as_secs_f64())
            .query_async(&mut *conn)
            .await
            .map_err(Self::map_err)?;
        drop(conn);

        match reply {
            None => Ok(None),
            Some((_, raw)) => {
                let job_id: JobId = raw
                    .parse()
                    .map_err(|_| AppError::queue(format!("Queue held a malformed id: {raw}")))?;
                Ok(Some(job_id))
            }
        }
    }

    async fn len(&self) -> AppResult<u64> {
        let mut conn = self.client.conn_mut();
        let len: u64 = conn
            .llen(&self.pending_key)
            .await
            .map_err(Self::map_err)?;
        Ok(len)
    }
}
