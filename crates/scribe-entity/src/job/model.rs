//! Job entity model and partial update patch.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use scribe_core::types::JobId;

use super::params::TranscriptionParams;
use super::status::JobStatus;
use super::transcript::Transcript;

/// A transcription job record.
///
/// Created by the submission path with status Queued; from the moment a
/// worker dequeues its id, that worker is the only writer until the job
/// reaches a terminal state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Unique job identifier, assigned at creation, immutable.
    pub id: JobId,
    /// Current job status.
    pub status: JobStatus,
    /// Path to the spooled audio input. Owned by the submission path until
    /// a worker claims the job, then by that worker until it deletes it.
    pub audio_path: PathBuf,
    /// Transcription parameters, validated at submission, immutable after.
    pub params: TranscriptionParams,
    /// Progress percentage 0–100, monotonically non-decreasing.
    pub progress: u8,
    /// When the job was created.
    pub created_at: DateTime<Utc>,
    /// When a worker claimed the job. Set exactly once.
    pub started_at: Option<DateTime<Utc>>,
    /// When the job reached a terminal state. Set exactly once.
    pub completed_at: Option<DateTime<Utc>>,
    /// Transcript, present if and only if status is Completed.
    pub result: Option<Transcript>,
    /// Failure description, present if and only if status is Failed.
    pub error: Option<String>,
}

impl Job {
    /// Build a fresh Queued record.
    pub fn new(audio_path: PathBuf, params: TranscriptionParams) -> Self {
        Self {
            id: JobId::new(),
            status: JobStatus::Queued,
            audio_path,
            params,
            progress: 0,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            result: None,
            error: None,
        }
    }
}

/// A partial update to a job record.
///
/// Only the populated fields are merged into the stored record; everything
/// else is left untouched. The store rejects a patch whose status change is
/// not allowed by the transition table, and a patch carrying both `result`
/// and `error`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobUpdate {
    /// New status.
    pub status: Option<JobStatus>,
    /// New progress percentage.
    pub progress: Option<u8>,
    /// Transcript for a completed job.
    pub result: Option<Transcript>,
    /// Failure description for a failed job.
    pub error: Option<String>,
    /// Claim timestamp.
    pub started_at: Option<DateTime<Utc>>,
    /// Terminal timestamp.
    pub completed_at: Option<DateTime<Utc>>,
}

impl JobUpdate {
    /// Patch applied when a worker claims the job.
    pub fn processing() -> Self {
        Self {
            status: Some(JobStatus::Processing),
            progress: Some(10),
            started_at: Some(Utc::now()),
            ..Self::default()
        }
    }

    /// Patch applied when transcription succeeds.
    pub fn completed(result: Transcript) -> Self {
        Self {
            status: Some(JobStatus::Completed),
            progress: Some(100),
            result: Some(result),
            completed_at: Some(Utc::now()),
            ..Self::default()
        }
    }

    /// Patch applied when the job fails. Progress is left unchanged.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: Some(JobStatus::Failed),
            error: Some(error.into()),
            completed_at: Some(Utc::now()),
            ..Self::default()
        }
    }

    /// True if the patch populates no fields at all.
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.progress.is_none()
            && self.result.is_none()
            && self.error.is_none()
            && self.started_at.is_none()
            && self.completed_at.is_none()
    }
}
