//! In-memory job store.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use tracing::{debug, info};

use scribe_core::result::AppResult;
use scribe_core::types::JobId;
use scribe_entity::{Job, JobStatus, JobUpdate, TranscriptionParams};
use scribe_realtime::{StatusEvent, StatusNotifier};

use crate::store::{apply_patch, validate_patch, JobStore};

/// A stored record with its self-cleaning deadline.
#[derive(Debug, Clone)]
struct StoredJob {
    job: Job,
    /// Past this instant the record is treated as absent, mirroring the
    /// key TTL the Redis backend sets at creation.
    expires_at: DateTime<Utc>,
}

/// In-memory job store backed by a concurrent map.
///
/// Expiry is honoured lazily: reads treat an expired record as absent and
/// drop it on the way out.
#[derive(Debug)]
pub struct MemoryJobStore {
    jobs: DashMap<JobId, StoredJob>,
    record_ttl: Duration,
    notifier: Arc<dyn StatusNotifier>,
}

impl MemoryJobStore {
    /// Create a new store. `record_ttl_days` mirrors the Redis key TTL.
    pub fn new(record_ttl_days: u32, notifier: Arc<dyn StatusNotifier>) -> Self {
        Self {
            jobs: DashMap::new(),
            record_ttl: Duration::days(i64::from(record_ttl_days)),
            notifier,
        }
    }

    /// Number of live (unexpired) records, for tests and diagnostics.
    pub fn record_count(&self) -> usize {
        let now = Utc::now();
        self.jobs.iter().filter(|e| e.expires_at > now).count()
    }

    /// Remove the record if it has passed its deadline. Returns true if
    /// the record is gone (expired or never existed).
    fn drop_if_expired(&self, job_id: JobId) -> bool {
        match self.jobs.get(&job_id) {
            Some(entry) if entry.expires_at <= Utc::now() => {
                drop(entry);
                self.jobs.remove(&job_id);
                debug!(%job_id, "Dropped expired job record");
                true
            }
            Some(_) => false,
            None => true,
        }
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn create(&self, audio_path: PathBuf, params: TranscriptionParams) -> AppResult<JobId> {
        let job = Job::new(audio_path, params);
        let job_id = job.id;
        let expires_at = job.created_at + self.record_ttl;

        self.jobs.insert(job_id, StoredJob { job, expires_at });

        info!(%job_id, "Created job record");
        Ok(job_id)
    }

    async fn get(&self, job_id: JobId) -> AppResult<Option<Job>> {
        if self.drop_if_expired(job_id) {
            return Ok(None);
        }
        Ok(self.jobs.get(&job_id).map(|entry| entry.job.clone()))
    }

    async fn update(&self, job_id: JobId, patch: JobUpdate) -> AppResult<()> {
        if self.drop_if_expired(job_id) {
            return Err(scribe_core::AppError::not_found(format!(
                "Job {job_id} does not exist"
            )));
        }

        let (status, progress) = {
            let mut entry = self.jobs.get_mut(&job_id).ok_or_else(|| {
                scribe_core::AppError::not_found(format!("Job {job_id} does not exist"))
            })?;

            validate_patch(&entry.job, &patch)?;
            apply_patch(&mut entry.job, patch);
            (entry.job.status, entry.job.progress)
            // Guard dropped here; never publish while holding it.
        };

        debug!(%job_id, %status, progress, "Updated job record");
        self.notifier
            .publish(&StatusEvent::new(job_id, status, progress))
            .await;
        Ok(())
    }

    async fn list(&self, status: Option<JobStatus>, limit: usize) -> AppResult<Vec<Job>> {
        let now = Utc::now();
        let mut jobs: Vec<Job> = self
            .jobs
            .iter()
            .filter(|entry| entry.expires_at > now)
            .map(|entry| entry.job.clone())
            .filter(|job| status.map_or(true, |s| job.status == s))
            .collect();

        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        jobs.truncate(limit);
        Ok(jobs)
    }

    async fn sweep_expired(&self, older_than_days: u32) -> AppResult<u64> {
        let cutoff = Utc::now() - Duration::days(i64::from(older_than_days));
        let before = self.jobs.len();

        self.jobs.retain(|_, stored| {
            if !stored.job.status.is_terminal() {
                return true;
            }
            match stored.job.completed_at {
                Some(completed_at) => completed_at >= cutoff,
                None => true,
            }
        });

        let deleted = before.saturating_sub(self.jobs.len()) as u64;
        info!(deleted, "Retention sweep finished");
        Ok(deleted)
    }
}
