//! Work queue semantics: FIFO order, bounded blocking, single delivery.

mod helpers;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use scribe_core::types::JobId;
use scribe_queue::memory::MemoryWorkQueue;
use scribe_queue::WorkQueue;

use helpers::TestBackend;

#[tokio::test]
async fn ids_come_back_in_arrival_order() {
    let tb = TestBackend::new();
    let queue = tb.backend.queue();

    let ids: Vec<JobId> = (0..5).map(|_| JobId::new()).collect();
    for id in &ids {
        queue.enqueue(*id).await.unwrap();
    }
    assert_eq!(queue.len().await.unwrap(), 5);

    for expected in &ids {
        let got = queue.dequeue(Duration::from_millis(50)).await.unwrap();
        assert_eq!(got, Some(*expected));
    }
    assert_eq!(queue.len().await.unwrap(), 0);
}

#[tokio::test]
async fn dequeue_waits_no_longer_than_the_timeout() {
    let tb = TestBackend::new();

    let started = tokio::time::Instant::now();
    let got = tb
        .backend
        .queue()
        .dequeue(Duration::from_millis(80))
        .await
        .unwrap();

    assert_eq!(got, None);
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(80));
    assert!(elapsed < Duration::from_secs(2));
}

#[tokio::test]
async fn enqueue_wakes_a_parked_consumer_promptly() {
    let queue = Arc::new(MemoryWorkQueue::new());
    let id = JobId::new();

    let consumer = {
        let queue = Arc::clone(&queue);
        tokio::spawn(async move {
            let started = tokio::time::Instant::now();
            let got = queue.dequeue(Duration::from_secs(10)).await.unwrap();
            (got, started.elapsed())
        })
    };

    tokio::time::sleep(Duration::from_millis(30)).await;
    queue.enqueue(id).await.unwrap();

    let (got, waited) = consumer.await.unwrap();
    assert_eq!(got, Some(id));
    // Woken by the enqueue, not by the 10s timeout.
    assert!(waited < Duration::from_secs(5));
}

#[tokio::test]
async fn each_id_is_delivered_to_exactly_one_consumer() {
    let queue = Arc::new(MemoryWorkQueue::new());

    let consumers: Vec<_> = (0..8)
        .map(|_| {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move {
                let mut seen = Vec::new();
                while let Some(id) = queue.dequeue(Duration::from_millis(200)).await.unwrap() {
                    seen.push(id);
                }
                seen
            })
        })
        .collect();

    let mut expected = HashSet::new();
    for _ in 0..100 {
        let id = JobId::new();
        expected.insert(id);
        queue.enqueue(id).await.unwrap();
    }

    let mut delivered = Vec::new();
    for consumer in consumers {
        delivered.extend(consumer.await.unwrap());
    }

    // No duplicates, no losses.
    let unique: HashSet<JobId> = delivered.iter().copied().collect();
    assert_eq!(unique.len(), delivered.len());
    assert_eq!(unique, expected);
}
