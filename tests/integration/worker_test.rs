//! Worker loop end-to-end: claim, process, terminal status, cleanup.

mod helpers;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use scribe_core::config::worker::WorkerConfig;
use scribe_entity::{JobStatus, TranscriptionParams};
use scribe_queue::{JobStore, WorkQueue};
use scribe_realtime::StatusNotifier;
use scribe_worker::{Transcriber, WorkerRunner};

use helpers::{spool_audio, ScriptedTranscriber, TestBackend};

fn worker_config() -> WorkerConfig {
    WorkerConfig {
        workers: 1,
        poll_timeout_seconds: 1,
        error_backoff_seconds: 1,
        ..WorkerConfig::default()
    }
}

fn runner(tb: &TestBackend, transcriber: Arc<ScriptedTranscriber>) -> WorkerRunner {
    WorkerRunner::new(
        Arc::clone(tb.backend.store()),
        Arc::clone(tb.backend.queue()),
        transcriber as Arc<dyn Transcriber>,
        worker_config(),
        "worker-0".to_string(),
    )
}

async fn run_until_drained(tb: &TestBackend, runner: WorkerRunner, window: Duration) {
    let (cancel_tx, cancel_rx) = watch::channel(false);
    let handle = tokio::spawn(async move { runner.run(cancel_rx).await });
    tokio::time::sleep(window).await;
    cancel_tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(10), handle)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(tb.backend.queue().len().await.unwrap(), 0);
}

#[tokio::test]
async fn happy_path_reaches_completed_with_full_status_trail() {
    let tb = TestBackend::new();
    let dir = tempfile::tempdir().unwrap();
    let audio = spool_audio(dir.path(), "a.wav").await;
    let transcriber = Arc::new(ScriptedTranscriber::succeeding("transcribed text"));

    let id = tb
        .backend
        .store()
        .create(audio.clone(), TranscriptionParams::default())
        .await
        .unwrap();

    // Before any worker touches it.
    let job = tb.backend.store().get(id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Queued);
    assert_eq!(job.progress, 0);

    let mut events = tb.backend.notifier().subscribe(id).await.unwrap();
    tb.backend.queue().enqueue(id).await.unwrap();

    run_until_drained(
        &tb,
        runner(&tb, Arc::clone(&transcriber)),
        Duration::from_millis(200),
    )
    .await;

    let job = tb.backend.store().get(id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.progress, 100);
    assert_eq!(job.result.as_ref().unwrap().text, "transcribed text");
    assert!(job.error.is_none());
    assert!(job.started_at.is_some() && job.completed_at.is_some());

    // Status trail: Processing(10) then Completed(100), in that order.
    let first = events.next().await.unwrap();
    assert_eq!((first.status, first.progress), (JobStatus::Processing, 10));
    let second = events.next().await.unwrap();
    assert_eq!((second.status, second.progress), (JobStatus::Completed, 100));

    // Spooled audio removed after the terminal update.
    assert!(!audio.exists());
    assert_eq!(transcriber.calls(), vec![audio]);
}

#[tokio::test]
async fn engine_error_message_lands_verbatim_on_the_job() {
    let tb = TestBackend::new();
    let dir = tempfile::tempdir().unwrap();
    let audio = spool_audio(dir.path(), "a.wav").await;
    let transcriber = Arc::new(ScriptedTranscriber::failing("file not found"));

    let id = tb
        .backend
        .store()
        .create(audio, TranscriptionParams::default())
        .await
        .unwrap();
    tb.backend.queue().enqueue(id).await.unwrap();

    run_until_drained(&tb, runner(&tb, transcriber), Duration::from_millis(200)).await;

    let job = tb.backend.store().get(id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.error.as_deref(), Some("file not found"));
    assert!(job.result.is_none());
}

#[tokio::test]
async fn missing_audio_at_claim_fails_without_invoking_the_engine() {
    let tb = TestBackend::new();
    let transcriber = Arc::new(ScriptedTranscriber::succeeding("unused"));

    let id = tb
        .backend
        .store()
        .create(
            "/nonexistent/audio.wav".into(),
            TranscriptionParams::default(),
        )
        .await
        .unwrap();
    tb.backend.queue().enqueue(id).await.unwrap();

    run_until_drained(
        &tb,
        runner(&tb, Arc::clone(&transcriber)),
        Duration::from_millis(200),
    )
    .await;

    let job = tb.backend.store().get(id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert!(job.error.as_deref().unwrap().contains("not found"));
    // The Processing claim still happened first, for observability.
    assert!(job.started_at.is_some());
    assert!(transcriber.calls().is_empty());
}

#[tokio::test]
async fn single_worker_finishes_first_job_before_dequeuing_second() {
    let tb = TestBackend::new();
    let dir = tempfile::tempdir().unwrap();
    let audio1 = spool_audio(dir.path(), "j1.wav").await;
    let audio2 = spool_audio(dir.path(), "j2.wav").await;
    let transcriber = Arc::new(
        ScriptedTranscriber::succeeding("ok").with_dwell(Duration::from_millis(50)),
    );

    let store = tb.backend.store();
    let j1 = store
        .create(audio1.clone(), TranscriptionParams::default())
        .await
        .unwrap();
    let j2 = store
        .create(audio2.clone(), TranscriptionParams::default())
        .await
        .unwrap();
    tb.backend.queue().enqueue(j1).await.unwrap();
    tb.backend.queue().enqueue(j2).await.unwrap();

    run_until_drained(
        &tb,
        runner(&tb, Arc::clone(&transcriber)),
        Duration::from_millis(500),
    )
    .await;

    let first = store.get(j1).await.unwrap().unwrap();
    let second = store.get(j2).await.unwrap().unwrap();
    assert_eq!(first.status, JobStatus::Completed);
    assert_eq!(second.status, JobStatus::Completed);

    // FIFO claim order, and J1 was terminal before J2 was even claimed.
    assert_eq!(transcriber.calls(), vec![audio1, audio2]);
    assert!(first.completed_at.unwrap() <= second.started_at.unwrap());
}

#[tokio::test]
async fn competing_workers_each_claim_distinct_jobs() {
    let tb = TestBackend::new();
    let dir = tempfile::tempdir().unwrap();
    let transcriber = Arc::new(
        ScriptedTranscriber::succeeding("ok").with_dwell(Duration::from_millis(10)),
    );

    let store = tb.backend.store();
    let mut ids = Vec::new();
    for n in 0..12 {
        let audio = spool_audio(dir.path(), &format!("{n}.wav")).await;
        let id = store
            .create(audio, TranscriptionParams::default())
            .await
            .unwrap();
        tb.backend.queue().enqueue(id).await.unwrap();
        ids.push(id);
    }

    let (cancel_tx, cancel_rx) = watch::channel(false);
    let handles: Vec<_> = (0..4)
        .map(|n| {
            let runner = WorkerRunner::new(
                Arc::clone(tb.backend.store()),
                Arc::clone(tb.backend.queue()),
                Arc::clone(&transcriber) as Arc<dyn Transcriber>,
                worker_config(),
                format!("worker-{n}"),
            );
            let cancel = cancel_rx.clone();
            tokio::spawn(async move { runner.run(cancel).await })
        })
        .collect();

    tokio::time::sleep(Duration::from_millis(500)).await;
    cancel_tx.send(true).unwrap();
    for handle in handles {
        tokio::time::timeout(Duration::from_secs(10), handle)
            .await
            .unwrap()
            .unwrap();
    }

    // Every job completed exactly once: one engine call per job.
    assert_eq!(transcriber.calls().len(), ids.len());
    for id in ids {
        let job = store.get(id).await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Completed);
    }
}

#[tokio::test]
async fn shutdown_lets_the_in_flight_job_finish() {
    let tb = TestBackend::new();
    let dir = tempfile::tempdir().unwrap();
    let audio = spool_audio(dir.path(), "slow.wav").await;
    let transcriber = Arc::new(
        ScriptedTranscriber::succeeding("ok").with_dwell(Duration::from_millis(200)),
    );

    let id = tb
        .backend
        .store()
        .create(audio, TranscriptionParams::default())
        .await
        .unwrap();
    tb.backend.queue().enqueue(id).await.unwrap();

    let (cancel_tx, cancel_rx) = watch::channel(false);
    let runner = runner(&tb, transcriber);
    let handle = tokio::spawn(async move { runner.run(cancel_rx).await });

    // Signal shutdown while the job is mid-transcription.
    tokio::time::sleep(Duration::from_millis(50)).await;
    cancel_tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(10), handle)
        .await
        .unwrap()
        .unwrap();

    let job = tb.backend.store().get(id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Completed);
}
