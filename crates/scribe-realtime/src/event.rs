//! Status event payload.

use serde::{Deserialize, Serialize};

use scribe_core::types::JobId;
use scribe_entity::JobStatus;

/// A single status notification for one job.
///
/// This is the full wire payload: observers that need the rest of the
/// record query the job store instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEvent {
    /// The job this event belongs to.
    pub job_id: JobId,
    /// Status after the update that produced this event.
    pub status: JobStatus,
    /// Progress after the update.
    pub progress: u8,
}

impl StatusEvent {
    /// Build an event for a job update.
    pub fn new(job_id: JobId, status: JobStatus, progress: u8) -> Self {
        Self {
            job_id,
            status,
            progress,
        }
    }
}
