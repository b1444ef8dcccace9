//! Job store behavior through the assembled backend.

mod helpers;

use std::path::PathBuf;

use chrono::Utc;

use scribe_entity::{JobStatus, JobUpdate, Transcript, TranscriptionParams};
use scribe_queue::JobStore;
use scribe_realtime::StatusNotifier;

use helpers::TestBackend;

#[tokio::test]
async fn full_lifecycle_is_visible_through_get() {
    let tb = TestBackend::new();
    let store = tb.backend.store();

    let id = store
        .create(PathBuf::from("a.wav"), TranscriptionParams::default())
        .await
        .unwrap();

    let job = store.get(id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Queued);
    assert_eq!(job.progress, 0);
    assert!(job.started_at.is_none() && job.completed_at.is_none());
    assert!(job.result.is_none() && job.error.is_none());

    store.update(id, JobUpdate::processing()).await.unwrap();
    let job = store.get(id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Processing);
    assert_eq!(job.progress, 10);
    assert!(job.started_at.is_some());

    let transcript = Transcript {
        text: "hello world".to_string(),
        ..Default::default()
    };
    store
        .update(id, JobUpdate::completed(transcript.clone()))
        .await
        .unwrap();
    let job = store.get(id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.progress, 100);
    assert_eq!(job.result, Some(transcript));
    assert!(job.error.is_none());
    assert!(job.completed_at.is_some());
}

#[tokio::test]
async fn terminal_states_admit_no_further_transitions() {
    let tb = TestBackend::new();
    let store = tb.backend.store();

    let id = store
        .create(PathBuf::from("a.wav"), TranscriptionParams::default())
        .await
        .unwrap();
    store.update(id, JobUpdate::processing()).await.unwrap();
    store.update(id, JobUpdate::failed("boom")).await.unwrap();

    // Failed -> Processing and Failed -> Completed are both illegal.
    assert!(store.update(id, JobUpdate::processing()).await.is_err());
    assert!(store
        .update(id, JobUpdate::completed(Transcript::default()))
        .await
        .is_err());

    let job = tb.backend.store().get(id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.error.as_deref(), Some("boom"));
    assert!(job.result.is_none());
}

#[tokio::test]
async fn update_touches_only_the_addressed_record() {
    let tb = TestBackend::new();
    let store = tb.backend.store();

    let a = store
        .create(PathBuf::from("a.wav"), TranscriptionParams::default())
        .await
        .unwrap();
    let b = store
        .create(PathBuf::from("b.wav"), TranscriptionParams::default())
        .await
        .unwrap();

    store.update(a, JobUpdate::processing()).await.unwrap();

    let other = store.get(b).await.unwrap().unwrap();
    assert_eq!(other.status, JobStatus::Queued);
    assert_eq!(other.progress, 0);
}

#[tokio::test]
async fn every_successful_update_publishes_a_status_event() {
    let tb = TestBackend::new();
    let store = tb.backend.store();

    let id = store
        .create(PathBuf::from("a.wav"), TranscriptionParams::default())
        .await
        .unwrap();

    let mut stream = tb.backend.notifier().subscribe(id).await.unwrap();

    store.update(id, JobUpdate::processing()).await.unwrap();
    store
        .update(id, JobUpdate::completed(Transcript::default()))
        .await
        .unwrap();

    let first = stream.next().await.unwrap();
    assert_eq!(first.job_id, id);
    assert_eq!(first.status, JobStatus::Processing);
    assert_eq!(first.progress, 10);

    let second = stream.next().await.unwrap();
    assert_eq!(second.status, JobStatus::Completed);
    assert_eq!(second.progress, 100);
}

#[tokio::test]
async fn rejected_updates_publish_nothing() {
    let tb = TestBackend::new();
    let store = tb.backend.store();

    let id = store
        .create(PathBuf::from("a.wav"), TranscriptionParams::default())
        .await
        .unwrap();
    let mut stream = tb.backend.notifier().subscribe(id).await.unwrap();

    // Queued -> Completed skips Processing and must be rejected.
    assert!(store
        .update(id, JobUpdate::completed(Transcript::default()))
        .await
        .is_err());

    assert!(stream.try_next().is_none());
}

#[tokio::test]
async fn sweep_respects_status_and_age() {
    let tb = TestBackend::new();
    let store = tb.backend.store();

    // One active and one fresh terminal job; neither qualifies.
    let active = store
        .create(PathBuf::from("a.wav"), TranscriptionParams::default())
        .await
        .unwrap();
    let fresh = store
        .create(PathBuf::from("b.wav"), TranscriptionParams::default())
        .await
        .unwrap();
    store.update(fresh, JobUpdate::processing()).await.unwrap();
    store
        .update(fresh, JobUpdate::failed("transient"))
        .await
        .unwrap();

    assert_eq!(store.sweep_expired(7).await.unwrap(), 0);
    assert!(store.get(active).await.unwrap().is_some());
    assert!(store.get(fresh).await.unwrap().is_some());

    // Cutoff of zero days: any terminal job completed before "now" goes.
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    assert_eq!(store.sweep_expired(0).await.unwrap(), 1);
    assert!(store.get(fresh).await.unwrap().is_none());
    assert!(store.get(active).await.unwrap().is_some());
}

#[tokio::test]
async fn list_is_newest_first_and_filterable() {
    let tb = TestBackend::new();
    let store = tb.backend.store();

    let mut ids = Vec::new();
    for n in 0..3 {
        let id = store
            .create(
                PathBuf::from(format!("{n}.wav")),
                TranscriptionParams::default(),
            )
            .await
            .unwrap();
        ids.push(id);
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }
    store.update(ids[0], JobUpdate::processing()).await.unwrap();

    let all = store.list(None, 10).await.unwrap();
    assert_eq!(all.len(), 3);
    assert!(all.windows(2).all(|w| w[0].created_at >= w[1].created_at));

    let queued = store.list(Some(JobStatus::Queued), 10).await.unwrap();
    assert_eq!(queued.len(), 2);
    assert!(queued.iter().all(|j| j.status == JobStatus::Queued));

    let capped = store.list(None, 2).await.unwrap();
    assert_eq!(capped.len(), 2);
}

#[tokio::test]
async fn timestamps_are_ordered() {
    let tb = TestBackend::new();
    let store = tb.backend.store();

    let before = Utc::now();
    let id = store
        .create(PathBuf::from("a.wav"), TranscriptionParams::default())
        .await
        .unwrap();
    store.update(id, JobUpdate::processing()).await.unwrap();
    store
        .update(id, JobUpdate::completed(Transcript::default()))
        .await
        .unwrap();

    let job = store.get(id).await.unwrap().unwrap();
    assert!(job.created_at >= before);
    assert!(job.started_at.unwrap() >= job.created_at);
    assert!(job.completed_at.unwrap() >= job.started_at.unwrap());
}
