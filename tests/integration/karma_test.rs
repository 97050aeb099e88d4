//! Karma award scenarios

use crate::common::Fixture;
use assert_matches::assert_matches;
use engageiq_sync::client::karma::{AwardOutcome, AwardRequest, PendingAward};
use engageiq_sync::shared::DailyProgressRecord;
use pretty_assertions::assert_eq;

const DAY: &str = "2026-10-19";

fn progress(fixture: &Fixture, user: &str) -> DailyProgressRecord {
    fixture
        .store
        .get("daily-progress", &format!("progress-{}-{}", user, DAY))
        .expect("progress record")
        .decode()
        .expect("decodes")
}

#[tokio::test]
async fn test_post_created_twice_counts_once() {
    let fixture = Fixture::new();
    let karma = fixture.karma(fixture.open_queue().await);

    let first = karma.award(AwardRequest::new("u1", "post_created").on(DAY)).await;
    let second = karma.award(AwardRequest::new("u1", "post_created").on(DAY)).await;

    assert_matches!(first, AwardOutcome::Applied { points: 5, .. });
    assert_matches!(second, AwardOutcome::AlreadyApplied { .. });

    let record = progress(&fixture, "u1");
    assert_eq!(record.posts, 1);
    assert_eq!(record.karma_earned, 5);
    crate::assert_stored!(fixture.store, "audit", "award-u1-post_created-none-2026-10-19");
}

#[tokio::test]
async fn test_repeat_after_restart_is_detected_remotely() {
    let fixture = Fixture::new();
    let karma = fixture.karma(fixture.open_queue().await);
    karma.award(AwardRequest::new("u1", "post_created").on(DAY)).await;

    // new session, empty in-memory state
    let restarted = fixture.karma(fixture.open_queue().await);
    let outcome = restarted.award(AwardRequest::new("u1", "create-post").on(DAY)).await;
    assert!(matches!(outcome, AwardOutcome::AlreadyApplied { .. }));
    assert_eq!(progress(&fixture, "u1").posts, 1);
}

#[tokio::test]
async fn test_distinct_related_ids_count_separately() {
    let fixture = Fixture::new();
    let karma = fixture.karma(fixture.open_queue().await);

    for post_id in ["p1", "p2", "p3"] {
        let outcome = karma
            .award(AwardRequest::new("u1", "like").related(post_id).on(DAY))
            .await;
        assert!(matches!(outcome, AwardOutcome::Applied { points: 1, .. }));
    }

    let record = progress(&fixture, "u1");
    assert_eq!(record.likes, 3);
    assert_eq!(record.karma_earned, 3);
    assert_eq!(karma.daily_progress("u1", DAY).await.unwrap().likes, 3);
}

#[tokio::test]
async fn test_offline_award_syncs_through_queue() {
    let fixture = Fixture::new();
    let queue = fixture.open_queue().await;
    let karma = fixture.karma(queue.clone());
    let reconciler = fixture.reconciler(queue.clone());

    fixture.store.set_offline(true);
    let outcome = karma.award(AwardRequest::new("u1", "group_joined").on(DAY)).await;
    assert_matches!(outcome, AwardOutcome::Queued { .. });
    crate::assert_queue_ids!(queue, ["award-u1-group_joined-none-2026-10-19"]);

    fixture.store.set_offline(false);
    let report = reconciler.retry_all().await;
    assert_eq!(report.succeeded.len(), 1);
    assert!(queue.is_empty().await);

    let record = progress(&fixture, "u1");
    assert_eq!(record.groups_joined, 1);
    assert_eq!(record.karma_earned, 3);

    // the queued audit document now blocks a replay from another session
    let other = fixture.karma(fixture.open_queue().await);
    let replay = other.award(AwardRequest::new("u1", "join_group").on(DAY)).await;
    assert!(matches!(replay, AwardOutcome::AlreadyApplied { .. }));
}

#[tokio::test]
async fn test_offline_award_after_restart_adds_to_stored_progress() {
    let fixture = Fixture::new();
    let karma = fixture.karma(fixture.open_queue().await);
    for post_id in ["p1", "p2", "p3"] {
        karma.award(AwardRequest::new("u1", "post").related(post_id).on(DAY)).await;
    }
    let before = progress(&fixture, "u1");
    assert_eq!((before.posts, before.karma_earned), (3, 15));

    // new process: empty in-memory progress, same queue storage
    let queue = fixture.open_queue().await;
    let restarted = fixture.karma(queue.clone());
    fixture.store.set_offline(true);
    let outcome = restarted
        .award(AwardRequest::new("u1", "post").related("p4").on(DAY))
        .await;
    assert_matches!(outcome, AwardOutcome::Queued { .. });

    fixture.store.set_offline(false);
    fixture.reconciler(queue.clone()).retry_all().await;

    let after = progress(&fixture, "u1");
    assert_eq!((after.posts, after.karma_earned), (4, 20));
    assert!(queue.is_empty().await);

    // delivering the same award again changes nothing
    let audit = fixture
        .store
        .get("audit", "award-u1-post_created-p4-2026-10-19")
        .expect("audit written");
    let award = PendingAward::new(audit.decode().unwrap());
    queue.add(award.to_payload().unwrap()).await;
    fixture.reconciler(queue.clone()).retry_all().await;
    assert_eq!(progress(&fixture, "u1").posts, 4);
    assert!(queue.is_empty().await);
}

#[tokio::test]
async fn test_follow_awards_once_per_target_per_day() {
    let fixture = Fixture::new();
    let karma = fixture.karma(fixture.open_queue().await);

    assert!(karma.record_follow("u1", "u2").await.is_success());
    assert!(matches!(
        karma.record_follow("u1", "u2").await,
        AwardOutcome::AlreadyApplied { .. }
    ));
    assert!(matches!(
        karma.record_follow("u1", "u3").await,
        AwardOutcome::Applied { points: 2, .. }
    ));

    assert_eq!(karma.total_karma("u1").await.unwrap(), 4);
}
