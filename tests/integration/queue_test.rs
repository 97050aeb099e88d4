//! Unsynced queue persistence and notification tests

use crate::common::{post, Fixture, QUEUE_KEY};
use engageiq_sync::client::clock::SystemClock;
use engageiq_sync::client::local_db::{LocalStorage, SqliteStorage};
use engageiq_sync::client::offline::UnsyncedQueue;
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[tokio::test]
async fn test_queue_survives_restart() {
    let fixture = Fixture::new();
    let queue = fixture.open_queue().await;
    queue.add(post("p1", "first")).await;
    queue.add(post("p2", "second")).await;
    let before = queue.snapshot().await;
    drop(queue);

    let reopened = fixture.open_queue().await;
    assert_eq!(reopened.snapshot().await, before);
    crate::assert_queue_ids!(reopened, ["p1", "p2"]);
}

#[tokio::test]
async fn test_sqlite_backed_queue_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(SqliteStorage::FILE_NAME);

    {
        let storage = SqliteStorage::open(&path).await.unwrap();
        let queue = UnsyncedQueue::open(Arc::new(storage.clone()), QUEUE_KEY, Arc::new(SystemClock)).await;
        assert!(queue.add(post("p1", "hi")).await);
        storage.pool().close().await;
    }

    let storage = SqliteStorage::open(&path).await.unwrap();
    let queue = UnsyncedQueue::open(Arc::new(storage), QUEUE_KEY, Arc::new(SystemClock)).await;
    let entry = queue.get("p1").await.expect("entry restored");
    assert_eq!(entry.payload.field("title"), Some(&serde_json::json!("hi")));
}

#[tokio::test]
async fn test_corrupt_value_starts_empty_and_recovers() {
    let storage = SqliteStorage::in_memory().await.unwrap();
    storage.set(QUEUE_KEY, "{not json").await.unwrap();

    let queue = UnsyncedQueue::open(Arc::new(storage.clone()), QUEUE_KEY, Arc::new(SystemClock)).await;
    assert!(queue.is_empty().await);

    queue.add(post("p1", "hi")).await;
    let reopened = UnsyncedQueue::open(Arc::new(storage), QUEUE_KEY, Arc::new(SystemClock)).await;
    assert_eq!(reopened.len().await, 1);
}

#[tokio::test]
async fn test_every_subscriber_sees_every_mutation() {
    let fixture = Fixture::new();
    let queue = fixture.open_queue().await;

    let snapshots: Vec<Arc<Mutex<Vec<Vec<String>>>>> =
        (0..5).map(|_| Arc::new(Mutex::new(Vec::new()))).collect();
    let mut subscriptions = Vec::new();
    for sink in &snapshots {
        let sink = sink.clone();
        subscriptions.push(
            queue
                .subscribe(move |entries| {
                    let ids = entries.iter().map(|e| e.id().to_string()).collect();
                    sink.lock().unwrap().push(ids);
                })
                .await,
        );
    }

    queue.add(post("p1", "hi")).await;
    for sink in &snapshots {
        // initial snapshot plus one mutation carrying the new entry
        let seen = sink.lock().unwrap();
        assert_eq!(*seen, vec![Vec::<String>::new(), vec!["p1".to_string()]]);
    }

    let first = subscriptions.remove(0);
    assert!(first.unsubscribe());
    queue.remove("p1").await;
    assert_eq!(snapshots[0].lock().unwrap().len(), 2);
    let last = snapshots[1].lock().unwrap().last().cloned();
    assert_eq!(last, Some(Vec::new()));
    assert_eq!(snapshots[1].lock().unwrap().len(), 3);
}

#[tokio::test]
async fn test_panicking_subscriber_does_not_break_queue() {
    let fixture = Fixture::new();
    let queue = fixture.open_queue().await;
    queue.add(post("p0", "seed")).await;

    let _bad = queue
        .subscribe(|entries| {
            if entries.len() > 1 {
                panic!("listener bug");
            }
        })
        .await;
    let seen = Arc::new(AtomicUsize::new(0));
    let counter = seen.clone();
    let _good = queue
        .subscribe(move |entries| counter.store(entries.len(), Ordering::SeqCst))
        .await;

    assert!(queue.add(post("p1", "hi")).await);
    assert_eq!(seen.load(Ordering::SeqCst), 2);
    assert_eq!(fixture.open_queue().await.len().await, 2);
}
