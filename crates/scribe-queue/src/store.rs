//! The job store seam.

use std::path::PathBuf;

use async_trait::async_trait;

use scribe_core::error::AppError;
use scribe_core::result::AppResult;
use scribe_core::types::JobId;
use scribe_entity::{Job, JobStatus, JobUpdate, TranscriptionParams};

/// Durable keyed store of job records.
///
/// Records are created Queued, mutated through partial patches, and carry
/// a creation-time expiry so orphans self-clean even without a sweep.
/// After a worker dequeues a job id, that worker is the record's only
/// writer; the store performs no cross-writer fencing and relies on the
/// queue's single-delivery guarantee for that exclusivity.
///
/// Every successful `update` additionally publishes a
/// [`scribe_realtime::StatusEvent`] carrying the merged status and
/// progress; publish failures are logged and swallowed.
#[async_trait]
pub trait JobStore: Send + Sync + std::fmt::Debug {
    /// Allocate a fresh id and write a Queued record with progress 0.
    async fn create(&self, audio_path: PathBuf, params: TranscriptionParams) -> AppResult<JobId>;

    /// Fetch the full current record, or `None` if the id is unknown or
    /// the record expired. Never returns a partially-populated record.
    async fn get(&self, job_id: JobId) -> AppResult<Option<Job>>;

    /// Merge only the populated fields of `patch` into the record.
    ///
    /// Unknown ids are a NotFound error and write nothing. Patches that
    /// violate the status transition table, set `result` and `error`
    /// together, move `progress` backwards or past 100, or re-set a
    /// set-once timestamp are rejected.
    async fn update(&self, job_id: JobId, patch: JobUpdate) -> AppResult<()>;

    /// List jobs ordered by `created_at` descending, optionally filtered
    /// by status, capped at `limit`.
    ///
    /// This is a best-effort O(n) scan over all stored jobs; not for hot
    /// paths.
    async fn list(&self, status: Option<JobStatus>, limit: usize) -> AppResult<Vec<Job>>;

    /// Delete terminal jobs whose `completed_at` predates the cutoff.
    /// Never touches Queued or Processing jobs regardless of age.
    /// Returns the number of deleted records.
    async fn sweep_expired(&self, older_than_days: u32) -> AppResult<u64>;
}

/// Shared patch validation, applied by every backend before merging.
pub(crate) fn validate_patch(current: &Job, patch: &JobUpdate) -> AppResult<()> {
    if patch.result.is_some() && patch.error.is_some() {
        return Err(AppError::conflict(
            "A patch may set result or error, never both",
        ));
    }

    if let Some(next) = patch.status {
        if !current.status.can_transition_to(next) {
            return Err(AppError::conflict(format!(
                "Illegal status transition {} -> {next} for job {}",
                current.status, current.id
            )));
        }
    }

    if let Some(progress) = patch.progress {
        if progress > 100 {
            return Err(AppError::validation(format!(
                "Progress {progress} is out of range 0-100"
            )));
        }
        if progress < current.progress {
            return Err(AppError::conflict(format!(
                "Progress may not move backwards ({} -> {progress})",
                current.progress
            )));
        }
    }

    if patch.result.is_some() && patch.status != Some(JobStatus::Completed) {
        return Err(AppError::conflict(
            "A result may only accompany the transition to completed",
        ));
    }
    if patch.error.is_some() && patch.status != Some(JobStatus::Failed) {
        return Err(AppError::conflict(
            "An error may only accompany the transition to failed",
        ));
    }

    if patch.started_at.is_some() && current.started_at.is_some() {
        return Err(AppError::conflict("started_at is set exactly once"));
    }
    if patch.completed_at.is_some() && current.completed_at.is_some() {
        return Err(AppError::conflict("completed_at is set exactly once"));
    }

    Ok(())
}

/// Merge a validated patch into a record.
pub(crate) fn apply_patch(job: &mut Job, patch: JobUpdate) {
    if let Some(status) = patch.status {
        job.status = status;
    }
    if let Some(progress) = patch.progress {
        job.progress = progress;
    }
    if let Some(result) = patch.result {
        job.result = Some(result);
    }
    if let Some(error) = patch.error {
        job.error = Some(error);
    }
    if let Some(started_at) = patch.started_at {
        job.started_at = Some(started_at);
    }
    if let Some(completed_at) = patch.completed_at {
        job.completed_at = Some(completed_at);
    }
}
