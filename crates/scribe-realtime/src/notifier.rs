//! The status notifier seam.

use async_trait::async_trait;
use tokio::sync::mpsc;

use scribe_core::result::AppResult;
use scribe_core::types::JobId;

use crate::event::StatusEvent;

/// Broadcast channel for per-job status events.
///
/// Delivery contract, identical for every backend:
/// - **No replay**: a subscriber only receives events published after it
///   subscribed. There is no buffer of past events.
/// - **No persistence**: events are never stored; if nobody is listening
///   when an event is published, it is silently lost.
/// - **At-most-once** per subscriber; a lagging subscriber may lose
///   events.
/// - **Publish never fails the caller**: backend failures are logged and
///   swallowed, because a missed notification never affects job
///   correctness, only observability.
#[async_trait]
pub trait StatusNotifier: Send + Sync + std::fmt::Debug {
    /// Fan an event out to every current subscriber of its job id.
    async fn publish(&self, event: &StatusEvent);

    /// Open a live tap on one job's events, yielding until dropped.
    async fn subscribe(&self, job_id: JobId) -> AppResult<StatusStream>;
}

/// A live subscription to one job's status events.
///
/// Dropping the stream closes the subscription.
#[derive(Debug)]
pub struct StatusStream {
    rx: mpsc::Receiver<StatusEvent>,
}

impl StatusStream {
    /// Wrap a receiver fed by a backend-specific forwarding task.
    pub(crate) fn new(rx: mpsc::Receiver<StatusEvent>) -> Self {
        Self { rx }
    }

    /// Wait for the next event. Returns `None` once the publishing side
    /// is gone.
    pub async fn next(&mut self) -> Option<StatusEvent> {
        self.rx.recv().await
    }

    /// Non-blocking poll for an already-delivered event.
    pub fn try_next(&mut self) -> Option<StatusEvent> {
        self.rx.try_recv().ok()
    }
}
