//! Retry pass scenarios

use crate::common::{post, Fixture};
use engageiq_sync::client::offline::RetryOneOutcome;
use engageiq_sync::shared::{DocumentType, Payload};
use pretty_assertions::assert_eq;
use serde_json::json;

#[tokio::test]
async fn test_p1_delivered_on_first_pass() {
    let fixture = Fixture::new();
    let queue = fixture.open_queue().await;
    let reconciler = fixture.reconciler(queue.clone());

    assert!(queue.add(post("p1", "hi")).await);
    let entry = queue.get("p1").await.unwrap();
    assert_eq!(entry.attempts, 0);

    let report = reconciler.retry_all().await;
    assert_eq!(report.attempted, 1);
    assert_eq!(report.succeeded, vec!["p1".to_string()]);
    assert!(queue.is_empty().await);

    let stored = fixture.store.get("post", "p1").unwrap();
    assert_eq!(stored.data["title"], json!("hi"));
}

#[tokio::test]
async fn test_p1_failure_then_backoff_then_success() {
    let fixture = Fixture::new();
    let queue = fixture.open_queue().await;
    let reconciler = fixture.reconciler(queue.clone());
    queue.add(post("p1", "hi")).await;

    fixture.store.set_offline(true);
    let report = reconciler.retry_all().await;
    assert_eq!(report.attempted, 1);
    assert!(report.succeeded.is_empty());

    let entry = queue.get("p1").await.unwrap();
    assert_eq!(entry.attempts, 1);
    assert_eq!(entry.last_attempt, Some(crate::common::START_MS));

    // under a second later nothing is eligible
    fixture.clock.advance(999);
    assert_eq!(reconciler.retry_all().await.attempted, 0);

    // attempts=1 waits two seconds
    fixture.clock.advance(1_000);
    assert_eq!(reconciler.retry_all().await.attempted, 0);
    fixture.clock.advance(1);
    let report = reconciler.retry_all().await;
    assert_eq!(report.attempted, 1);
    assert_eq!(queue.get("p1").await.unwrap().attempts, 2);

    fixture.store.set_offline(false);
    fixture.clock.advance(4_000);
    let report = reconciler.retry_all().await;
    assert_eq!(report.succeeded, vec!["p1".to_string()]);
    crate::assert_queue_ids!(queue, []);
}

#[tokio::test]
async fn test_invalid_entries_are_purged_and_reported() {
    let fixture = Fixture::new();
    let queue = fixture.open_queue().await;
    let reconciler = fixture.reconciler(queue.clone());

    queue.add(post("p1", "hi")).await;
    queue
        .add_value(json!({"id": "x1", "type": "not-a-collection", "body": "?"}))
        .await;
    queue.add_value(json!({"id": "x2"})).await;

    let report = reconciler.retry_all().await;
    let mut purged = report.purged.clone();
    purged.sort();
    assert_eq!(purged, vec!["x1".to_string(), "x2".to_string()]);
    assert_eq!(report.attempted, 1);
    assert!(queue.is_empty().await);
    assert_eq!(fixture.reporter.reports().len(), 2);

    // purged entries never come back
    assert_eq!(reconciler.retry_all().await.attempted, 0);
    assert_eq!(fixture.reporter.reports().len(), 2);
}

#[tokio::test]
async fn test_large_queue_is_fully_delivered_across_types() {
    let fixture = Fixture::new();
    let queue = fixture.open_queue().await;
    let reconciler = fixture.reconciler(queue.clone());

    for i in 0..230 {
        queue.add(post(&format!("p{}", i), "bulk")).await;
    }
    for i in 0..20 {
        queue
            .add(Payload::new(format!("c{}", i), DocumentType::Comment).with_field("body", "x"))
            .await;
    }

    let report = reconciler.retry_all().await;
    assert_eq!(report.attempted, 250);
    assert_eq!(report.succeeded.len(), 250);
    assert_eq!(fixture.store.count("post"), 230);
    assert_eq!(fixture.store.count("comment"), 20);
    assert!(queue.is_empty().await);
}

#[tokio::test]
async fn test_replayed_write_does_not_duplicate() {
    let fixture = Fixture::new();
    let queue = fixture.open_queue().await;
    let reconciler = fixture.reconciler(queue.clone());

    // the store already has p1 from a write whose ack was lost
    fixture.store.fail_id("p2");
    queue.add(post("p1", "hi")).await;
    queue.add(post("p2", "hi")).await;
    reconciler.retry_all().await;
    queue.add(post("p1", "hi")).await;
    fixture.store.heal_id("p2");
    fixture.clock.advance(2_000);
    reconciler.retry_all().await;

    assert_eq!(fixture.store.count("post"), 2);
    assert!(queue.is_empty().await);
}

#[tokio::test]
async fn test_retry_one_never_errors() {
    let fixture = Fixture::new();
    let queue = fixture.open_queue().await;
    let reconciler = fixture.reconciler(queue.clone());
    queue.add(post("p1", "hi")).await;

    fixture.store.set_offline(true);
    assert_eq!(reconciler.retry_one("p1").await, RetryOneOutcome::Failed);
    assert_eq!(reconciler.retry_one("p1").await, RetryOneOutcome::Failed);
    assert_eq!(queue.get("p1").await.unwrap().attempts, 2);

    fixture.store.set_offline(false);
    assert_eq!(reconciler.retry_one("p1").await, RetryOneOutcome::Delivered);
    assert_eq!(reconciler.retry_one("p1").await, RetryOneOutcome::NotFound);
}
