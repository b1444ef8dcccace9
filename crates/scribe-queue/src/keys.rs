//! Redis key builders for every key Scribe writes.
//!
//! Centralising key construction prevents typos and makes it easy to
//! find every key the application uses. Builders take the configured
//! prefix so multiple deployments can share one Redis.

use scribe_core::types::JobId;

/// Key of the hash holding one job record.
pub fn job_record(prefix: &str, job_id: JobId) -> String {
    format!("{prefix}job:{job_id}")
}

/// Scan pattern matching every job record hash.
pub fn job_record_pattern(prefix: &str) -> String {
    format!("{prefix}job:*")
}

/// Key of the pending-id list (the FIFO work queue).
pub fn pending_list(prefix: &str) -> String {
    format!("{prefix}pending")
}

/// Extract the job id from a record key produced by [`job_record`].
pub fn job_id_from_record_key(prefix: &str, key: &str) -> Option<JobId> {
    key.strip_prefix(prefix)?
        .strip_prefix("job:")?
        .parse()
        .ok()
}
