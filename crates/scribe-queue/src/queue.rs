//! The work queue seam.

use std::time::Duration;

use async_trait::async_trait;

use scribe_core::result::AppResult;
use scribe_core::types::JobId;

/// Strict-FIFO queue of pending job ids.
///
/// The queue carries ids only; all payload lives in the job store.
/// Arrival order is the only ordering key.
///
/// The single-delivery guarantee of [`WorkQueue::dequeue`] is the sole
/// mechanism preventing two workers from processing one job: ownership of
/// a job transfers atomically to whichever caller receives its id. Any
/// backend implementing this trait must preserve that guarantee.
///
/// Duplicate enqueues of the same id are not guarded against; callers
/// enqueue each id once.
#[async_trait]
pub trait WorkQueue: Send + Sync + std::fmt::Debug {
    /// Append an id to the tail of the pending list. Never blocks.
    async fn enqueue(&self, job_id: JobId) -> AppResult<()>;

    /// Remove and return the id at the head of the list, waiting up to
    /// `timeout` for one to arrive. Returns `None` on timeout. Each
    /// enqueued id is delivered to exactly one concurrent caller.
    async fn dequeue(&self, timeout: Duration) -> AppResult<Option<JobId>>;

    /// Current number of pending ids. For backpressure and observability,
    /// never for control flow.
    async fn len(&self) -> AppResult<u64>;
}
