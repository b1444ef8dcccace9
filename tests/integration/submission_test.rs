//! Submission and status-query paths over the in-memory backend.

mod helpers;

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::watch;

use scribe_core::config::storage::StorageConfig;
use scribe_core::error::ErrorKind;
use scribe_core::types::JobId;
use scribe_entity::{JobStatus, TranscriptionParams};
use scribe_queue::{JobStore, WorkQueue};
use scribe_service::{StatusService, SubmissionRequest, SubmissionService};
use scribe_worker::{Transcriber, WorkerRunner};

use helpers::{ScriptedTranscriber, TestBackend};

fn storage_config(dir: &tempfile::TempDir) -> StorageConfig {
    StorageConfig {
        spool_dir: dir.path().to_string_lossy().into_owned(),
        max_upload_size_mb: 1,
    }
}

fn request(file_name: &str, data: &[u8]) -> SubmissionRequest {
    SubmissionRequest {
        file_name: file_name.to_string(),
        data: Bytes::copy_from_slice(data),
        params: TranscriptionParams::default(),
    }
}

#[tokio::test]
async fn submit_spools_creates_and_enqueues() {
    let tb = TestBackend::new();
    let dir = tempfile::tempdir().unwrap();
    let service = SubmissionService::new(tb.backend.clone(), storage_config(&dir));

    let id = service.submit(request("meeting.wav", b"RIFFdata")).await.unwrap();

    let job = tb.backend.store().get(id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Queued);
    assert_eq!(job.progress, 0);
    assert_eq!(
        job.params.original_filename.as_deref(),
        Some("meeting.wav")
    );

    // Audio spooled under a fresh name, original extension kept.
    assert!(job.audio_path.starts_with(dir.path()));
    assert_eq!(
        job.audio_path.extension().and_then(|e| e.to_str()),
        Some("wav")
    );
    let spooled = tokio::fs::read(&job.audio_path).await.unwrap();
    assert_eq!(spooled, b"RIFFdata");

    // And the id is waiting in the queue.
    assert_eq!(tb.backend.queue().len().await.unwrap(), 1);
    assert_eq!(
        tb.backend
            .queue()
            .dequeue(Duration::from_millis(50))
            .await
            .unwrap(),
        Some(id)
    );
}

#[tokio::test]
async fn invalid_submissions_leave_no_trace() {
    let tb = TestBackend::new();
    let dir = tempfile::tempdir().unwrap();
    let service = SubmissionService::new(tb.backend.clone(), storage_config(&dir));

    // Empty payload.
    let err = service.submit(request("a.wav", b"")).await.unwrap_err();
    assert!(err.is_kind(ErrorKind::Validation));

    // Unsupported extension.
    let err = service
        .submit(request("archive.zip", b"PK"))
        .await
        .unwrap_err();
    assert!(err.is_kind(ErrorKind::Validation));

    // Oversize payload (limit is 1 MB here).
    let big = vec![0u8; 2 * 1024 * 1024];
    let err = service.submit(request("big.wav", &big)).await.unwrap_err();
    assert!(err.is_kind(ErrorKind::Validation));

    // Out-of-range parameters.
    let mut bad_params = request("a.wav", b"RIFF");
    bad_params.params.beam_size = 0;
    assert!(service.submit(bad_params).await.is_err());

    let mut bad_speakers = request("a.wav", b"RIFF");
    bad_speakers.params.enable_diarization = true;
    bad_speakers.params.min_speakers = Some(5);
    bad_speakers.params.max_speakers = Some(2);
    assert!(service.submit(bad_speakers).await.is_err());

    // Nothing was stored, enqueued, or left on disk.
    assert!(tb.backend.store().list(None, 10).await.unwrap().is_empty());
    assert_eq!(tb.backend.queue().len().await.unwrap(), 0);
    let mut entries = tokio::fs::read_dir(dir.path()).await.unwrap();
    assert!(entries.next_entry().await.unwrap().is_none());
}

#[tokio::test]
async fn status_service_reads_and_rejects_unknown_ids() {
    let tb = TestBackend::new();
    let dir = tempfile::tempdir().unwrap();
    let submission = SubmissionService::new(tb.backend.clone(), storage_config(&dir));
    let status = StatusService::new(tb.backend.clone());

    let err = status.get(JobId::new()).await.unwrap_err();
    assert!(err.is_kind(ErrorKind::NotFound));
    assert!(status.subscribe(JobId::new()).await.is_err());

    let id = submission.submit(request("a.wav", b"RIFF")).await.unwrap();

    let job = status.get(id).await.unwrap();
    assert_eq!(job.status, JobStatus::Queued);
    assert_eq!(status.queue_depth().await.unwrap(), 1);
    assert_eq!(status.list(None, 10).await.unwrap().len(), 1);
    assert_eq!(
        status
            .list(Some(JobStatus::Completed), 10)
            .await
            .unwrap()
            .len(),
        0
    );
}

#[tokio::test]
async fn submitted_job_flows_through_a_worker_to_completion() {
    let tb = TestBackend::new();
    let dir = tempfile::tempdir().unwrap();
    let submission = SubmissionService::new(tb.backend.clone(), storage_config(&dir));
    let status = StatusService::new(tb.backend.clone());
    let transcriber = Arc::new(ScriptedTranscriber::succeeding("the minutes"));

    let id = submission
        .submit(request("meeting.wav", b"RIFFdata"))
        .await
        .unwrap();
    let mut events = status.subscribe(id).await.unwrap();

    let (cancel_tx, cancel_rx) = watch::channel(false);
    let runner = WorkerRunner::new(
        Arc::clone(tb.backend.store()),
        Arc::clone(tb.backend.queue()),
        transcriber as Arc<dyn Transcriber>,
        scribe_core::config::worker::WorkerConfig {
            workers: 1,
            poll_timeout_seconds: 1,
            error_backoff_seconds: 1,
            ..Default::default()
        },
        "worker-0".to_string(),
    );
    let handle = tokio::spawn(async move { runner.run(cancel_rx).await });

    // Watch the job reach its terminal state through the notifier.
    let first = events.next().await.unwrap();
    assert_eq!(first.status, JobStatus::Processing);
    let second = events.next().await.unwrap();
    assert_eq!(second.status, JobStatus::Completed);

    cancel_tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(10), handle)
        .await
        .unwrap()
        .unwrap();

    let job = status.get(id).await.unwrap();
    assert_eq!(job.result.as_ref().unwrap().text, "the minutes");
    assert!(!job.audio_path.exists());
    assert_eq!(status.queue_depth().await.unwrap(), 0);
}
