//! Status queries and live subscriptions.

use tracing::debug;

use scribe_core::error::AppError;
use scribe_core::result::AppResult;
use scribe_core::types::JobId;
use scribe_entity::{Job, JobStatus};
use scribe_queue::{JobStore, QueueBackend, WorkQueue};
use scribe_realtime::{StatusNotifier, StatusStream};

/// Read-side service: point lookups, listings, queue depth, and live
/// status subscriptions.
#[derive(Clone)]
pub struct StatusService {
    backend: QueueBackend,
}

impl std::fmt::Debug for StatusService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusService").finish()
    }
}

impl StatusService {
    /// Creates a new status service.
    pub fn new(backend: QueueBackend) -> Self {
        Self { backend }
    }

    /// Fetch one job. Unknown or expired ids are a NotFound error.
    pub async fn get(&self, job_id: JobId) -> AppResult<Job> {
        self.backend
            .store()
            .get(job_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Job {job_id} does not exist")))
    }

    /// List jobs newest-first, optionally filtered by status.
    pub async fn list(&self, status: Option<JobStatus>, limit: usize) -> AppResult<Vec<Job>> {
        self.backend.store().list(status, limit).await
    }

    /// Number of ids waiting in the work queue.
    pub async fn queue_depth(&self) -> AppResult<u64> {
        self.backend.queue().len().await
    }

    /// Subscribe to live status events for one job.
    ///
    /// The stream starts empty: events published before this call are
    /// gone. Callers wanting the current state should pair this with
    /// [`StatusService::get`] after subscribing.
    pub async fn subscribe(&self, job_id: JobId) -> AppResult<StatusStream> {
        // Existence check first so subscribers to unknown ids fail fast
        // instead of waiting on a channel that will never fire.
        let _ = self.get(job_id).await?;

        debug!(%job_id, "Subscribing to status events");
        self.backend.notifier().subscribe(job_id).await
    }
}
