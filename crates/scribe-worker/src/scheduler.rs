//! Cron scheduler for periodic maintenance tasks.

use std::sync::Arc;

use tokio_cron_scheduler::{Job as CronJob, JobScheduler};
use tracing::{error, info};

use scribe_core::config::retention::RetentionConfig;
use scribe_core::error::AppError;
use scribe_core::result::AppResult;
use scribe_queue::JobStore;

/// Cron-based scheduler for periodic background tasks.
///
/// Currently registers a single task: the retention sweep that deletes
/// old terminal job records.
pub struct CronScheduler {
    /// The underlying job scheduler.
    scheduler: JobScheduler,
    /// Job store the sweep runs against.
    store: Arc<dyn JobStore>,
    /// Retention settings.
    config: RetentionConfig,
}

impl std::fmt::Debug for CronScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CronScheduler").finish()
    }
}

impl CronScheduler {
    /// Create a new cron scheduler.
    pub async fn new(store: Arc<dyn JobStore>, config: RetentionConfig) -> AppResult<Self> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::internal(format!("Failed to create scheduler: {e}")))?;

        Ok(Self {
            scheduler,
            store,
            config,
        })
    }

    /// Register all scheduled tasks.
    pub async fn register_default_tasks(&self) -> AppResult<()> {
        self.register_retention_sweep().await?;

        info!("All scheduled tasks registered");
        Ok(())
    }

    /// Start the scheduler.
    pub async fn start(&self) -> AppResult<()> {
        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::internal(format!("Failed to start scheduler: {e}")))?;

        info!("Cron scheduler started");
        Ok(())
    }

    /// Shutdown the scheduler.
    pub async fn shutdown(&mut self) -> AppResult<()> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::internal(format!("Failed to shutdown scheduler: {e}")))?;

        info!("Cron scheduler shut down");
        Ok(())
    }

    /// Retention sweep on the configured cron schedule.
    async fn register_retention_sweep(&self) -> AppResult<()> {
        let store = Arc::clone(&self.store);
        let days = self.config.days;
        let job = CronJob::new_async(self.config.schedule.as_str(), move |_uuid, _lock| {
            let store = Arc::clone(&store);
            Box::pin(async move {
                match store.sweep_expired(days).await {
                    Ok(deleted) if deleted > 0 => {
                        info!(deleted, "Retention sweep deleted old jobs");
                    }
                    Ok(_) => {}
                    Err(e) => {
                        error!("Retention sweep failed: {e}");
                    }
                }
            })
        })
        .map_err(|e| {
            AppError::internal(format!("Failed to create retention_sweep schedule: {e}"))
        })?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| AppError::internal(format!("Failed to add retention_sweep schedule: {e}")))?;

        info!(schedule = %self.config.schedule, days, "Registered: retention_sweep");
        Ok(())
    }
}
