//! Worker runner — main loop that claims queued jobs and drives them to
//! a terminal status.

use std::io::ErrorKind as IoErrorKind;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time;
use tracing::{debug, error, info, warn};

use scribe_core::config::worker::WorkerConfig;
use scribe_core::types::JobId;
use scribe_entity::{Job, JobUpdate};
use scribe_queue::{JobStore, WorkQueue};

use crate::transcriber::Transcriber;

/// Main worker loop. One runner processes one job at a time; run several
/// runners for parallelism.
#[derive(Debug)]
pub struct WorkerRunner {
    /// Job store for claims and terminal updates.
    store: Arc<dyn JobStore>,
    /// Work queue to claim job ids from.
    queue: Arc<dyn WorkQueue>,
    /// Transcription engine.
    transcriber: Arc<dyn Transcriber>,
    /// Worker configuration.
    config: WorkerConfig,
    /// Worker identifier for logs.
    worker_id: String,
}

impl WorkerRunner {
    /// Create a new worker runner.
    pub fn new(
        store: Arc<dyn JobStore>,
        queue: Arc<dyn WorkQueue>,
        transcriber: Arc<dyn Transcriber>,
        config: WorkerConfig,
        worker_id: String,
    ) -> Self {
        Self {
            store,
            queue,
            transcriber,
            config,
            worker_id,
        }
    }

    /// Run until the cancel signal flips to true.
    ///
    /// Shutdown is only observed at loop-iteration boundaries, never
    /// mid-call: a dequeue in flight runs to completion (its bounded
    /// timeout caps the latency), and a claimed job always reaches its
    /// terminal status before the loop exits.
    pub async fn run(&self, cancel: watch::Receiver<bool>) {
        info!(
            worker = %self.worker_id,
            poll_timeout_seconds = self.config.poll_timeout_seconds,
            "Worker started"
        );

        let poll_timeout = Duration::from_secs(self.config.poll_timeout_seconds);
        let error_backoff = Duration::from_secs(self.config.error_backoff_seconds);

        loop {
            if *cancel.borrow() {
                break;
            }

            // Never cancel the dequeue itself: a blocking pop commits
            // server-side before the reply lands, so dropping the future
            // here would lose a single-delivered id.
            match self.queue.dequeue(poll_timeout).await {
                Ok(Some(job_id)) => {
                    // Once claimed, the job runs to its terminal status
                    // even during shutdown.
                    self.process(job_id).await;
                }
                Ok(None) => {
                    debug!(worker = %self.worker_id, "No pending jobs");
                }
                Err(error) => {
                    error!(worker = %self.worker_id, %error, "Failed to poll work queue");
                    time::sleep(error_backoff).await;
                }
            }
        }

        info!(worker = %self.worker_id, "Worker shut down");
    }

    /// Drive one claimed job from Queued to Completed or Failed.
    async fn process(&self, job_id: JobId) {
        let job = match self.store.get(job_id).await {
            Ok(Some(job)) => job,
            Ok(None) => {
                // Record expired between enqueue and claim.
                warn!(worker = %self.worker_id, %job_id, "Dequeued id has no record, skipping");
                return;
            }
            Err(error) => {
                error!(worker = %self.worker_id, %job_id, %error, "Failed to load claimed job");
                return;
            }
        };

        if let Err(error) = self.store.update(job_id, JobUpdate::processing()).await {
            error!(worker = %self.worker_id, %job_id, %error, "Failed to claim job, skipping");
            return;
        }
        info!(worker = %self.worker_id, %job_id, "Processing job");

        let audio_present = tokio::fs::try_exists(&job.audio_path)
            .await
            .unwrap_or(false);
        if !audio_present {
            let message = format!("Audio file not found: {}", job.audio_path.display());
            warn!(worker = %self.worker_id, %job_id, "{message}");
            self.finish(job_id, JobUpdate::failed(message)).await;
            return;
        }

        let outcome = self.transcriber.transcribe(&job.audio_path, &job.params).await;

        match outcome {
            Ok(transcript) => {
                info!(
                    worker = %self.worker_id,
                    %job_id,
                    duration_seconds = transcript.duration,
                    "Job completed"
                );
                self.finish(job_id, JobUpdate::completed(transcript)).await;
            }
            Err(error) => {
                error!(worker = %self.worker_id, %job_id, %error, "Transcription failed");
                self.finish(job_id, JobUpdate::failed(error.to_string()))
                    .await;
            }
        }

        self.cleanup_audio(&job).await;
    }

    /// Write the terminal update. A failure here leaves the job stuck in
    /// Processing until its record TTL expires; nothing else to do but
    /// log it.
    async fn finish(&self, job_id: JobId, patch: JobUpdate) {
        if let Err(error) = self.store.update(job_id, patch).await {
            error!(
                worker = %self.worker_id,
                %job_id,
                %error,
                "Failed to record terminal status"
            );
        }
    }

    /// Remove the spooled audio file. Best effort; a leftover file is
    /// reclaimed by disk cleanup, not worth failing the job over.
    async fn cleanup_audio(&self, job: &Job) {
        if let Err(error) = tokio::fs::remove_file(&job.audio_path).await {
            if error.kind() != IoErrorKind::NotFound {
                warn!(
                    worker = %self.worker_id,
                    job_id = %job.id,
                    path = %job.audio_path.display(),
                    %error,
                    "Failed to remove spooled audio"
                );
            }
        }
    }
}

/// Spawn `config.workers` runners sharing one cancel signal. Returns the
/// join handles so the caller can await a clean drain.
pub fn spawn_workers(
    store: Arc<dyn JobStore>,
    queue: Arc<dyn WorkQueue>,
    transcriber: Arc<dyn Transcriber>,
    config: &WorkerConfig,
    cancel: watch::Receiver<bool>,
) -> Vec<tokio::task::JoinHandle<()>> {
    (0..config.workers)
        .map(|n| {
            let runner = WorkerRunner::new(
                Arc::clone(&store),
                Arc::clone(&queue),
                Arc::clone(&transcriber),
                config.clone(),
                format!("worker-{n}"),
            );
            let cancel = cancel.clone();
            tokio::spawn(async move { runner.run(cancel).await })
        })
        .collect()
}
