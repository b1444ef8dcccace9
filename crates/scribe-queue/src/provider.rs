//! Backend selection and wiring.

use std::sync::Arc;

use tracing::info;

use scribe_core::config::queue::QueueConfig;
use scribe_core::config::realtime::RealtimeConfig;
use scribe_core::error::AppError;
use scribe_core::result::AppResult;
use scribe_realtime::{MemoryNotifier, RedisNotifier, StatusNotifier};

use crate::memory::{MemoryJobStore, MemoryWorkQueue};
use crate::queue::WorkQueue;
use crate::redis::{RedisClient, RedisJobStore, RedisWorkQueue};
use crate::store::JobStore;

/// The wired job store, work queue, and notifier for one backend.
///
/// The backend is selected at construction time based on configuration.
/// All three components always come from the same backend so status
/// events and records stay in one place.
#[derive(Debug, Clone)]
pub struct QueueBackend {
    store: Arc<dyn JobStore>,
    queue: Arc<dyn WorkQueue>,
    notifier: Arc<dyn StatusNotifier>,
}

impl QueueBackend {
    /// Create a backend from configuration.
    pub async fn new(config: &QueueConfig, realtime: &RealtimeConfig) -> AppResult<Self> {
        match config.backend.as_str() {
            "memory" => {
                info!("Initializing in-memory queue backend");
                let notifier: Arc<dyn StatusNotifier> =
                    Arc::new(MemoryNotifier::new(realtime.buffer_size));
                let store = Arc::new(MemoryJobStore::new(
                    config.record_ttl_days,
                    Arc::clone(&notifier),
                ));
                let queue = Arc::new(MemoryWorkQueue::new());
                Ok(Self {
                    store,
                    queue,
                    notifier,
                })
            }
            "redis" => {
                info!("Initializing Redis queue backend");
                let notifier: Arc<dyn StatusNotifier> = Arc::new(
                    RedisNotifier::connect(
                        &config.redis.url,
                        &config.redis.key_prefix,
                        realtime.buffer_size,
                    )
                    .await?,
                );
                let client = RedisClient::connect(&config.redis).await?;
                // BRPOP parks its connection, so the queue gets its own.
                let blocking = RedisClient::connect(&config.redis).await?;
                let store = Arc::new(RedisJobStore::new(
                    client.clone(),
                    config.record_ttl_days,
                    Arc::clone(&notifier),
                ));
                let queue = Arc::new(RedisWorkQueue::new(client, blocking.conn_mut()));
                Ok(Self {
                    store,
                    queue,
                    notifier,
                })
            }
            other => Err(AppError::configuration(format!(
                "Unknown queue backend: '{other}'. Supported: memory, redis"
            ))),
        }
    }

    /// Build a backend from existing components (for testing).
    pub fn from_parts(
        store: Arc<dyn JobStore>,
        queue: Arc<dyn WorkQueue>,
        notifier: Arc<dyn StatusNotifier>,
    ) -> Self {
        Self {
            store,
            queue,
            notifier,
        }
    }

    /// The job store.
    pub fn store(&self) -> &Arc<dyn JobStore> {
        &self.store
    }

    /// The work queue.
    pub fn queue(&self) -> &Arc<dyn WorkQueue> {
        &self.queue
    }

    /// The status notifier.
    pub fn notifier(&self) -> &Arc<dyn StatusNotifier> {
        &self.notifier
    }
}
