//! In-memory FIFO work queue.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;
use tokio::time::{timeout_at, Instant};
use tracing::debug;

use scribe_core::result::AppResult;
use scribe_core::types::JobId;

use crate::queue::WorkQueue;

/// In-memory FIFO queue of pending job ids.
///
/// A plain `VecDeque` under a std mutex, paired with a [`Notify`] so
/// blocked consumers wake when an id arrives. Single delivery falls out
/// of the mutex: `pop_front` hands each id to exactly one caller.
#[derive(Debug, Default)]
pub struct MemoryWorkQueue {
    pending: Mutex<VecDeque<JobId>>,
    arrival: Notify,
}

impl MemoryWorkQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn try_pop(&self) -> Option<JobId> {
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop_front()
    }
}

#[async_trait]
impl WorkQueue for MemoryWorkQueue {
    async fn enqueue(&self, job_id: JobId) -> AppResult<()> {
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push_back(job_id);
        // notify_one remembers a permit if no consumer is parked yet.
        self.arrival.notify_one();
        debug!(%job_id, "Enqueued job");
        Ok(())
    }

    async fn dequeue(&self, timeout: Duration) -> AppResult<Option<JobId>> {
        let deadline = Instant::now() + timeout;

        loop {
            // Register interest before re-checking the queue so an
            // enqueue between the pop and the await cannot be missed.
            let notified = self.arrival.notified();

            if let Some(job_id) = self.try_pop() {
                return Ok(Some(job_id));
            }

            if timeout_at(deadline, notified).await.is_err() {
                // Deadline passed; one last look in case an id arrived
                // exactly as the timer fired.
                return Ok(self.try_pop());
            }
        }
    }

    async fn len(&self) -> AppResult<u64> {
        let len = self
            .pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len();
        Ok(len as u64)
    }
}
