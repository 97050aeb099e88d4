//! Property-based tests for the backoff schedule

use engageiq_sync::client::offline::{BackoffStrategy, QueueEntry};
use engageiq_sync::shared::{DocumentType, Payload};
use proptest::prelude::*;

fn entry(attempts: u32, last_attempt: u64) -> QueueEntry {
    QueueEntry {
        payload: Payload::new("p1", DocumentType::Post),
        attempts,
        last_attempt: Some(last_attempt),
        added_at: 0,
    }
}

proptest! {
    #[test]
    fn test_not_ready_before_doubling_delay(
        attempts in 0u32..=8,
        last in 0u64..1_000_000_000_000,
        early in 1u64..1_000,
    ) {
        let backoff = BackoffStrategy::default();
        let delay = 1_000u64 << attempts;
        let e = entry(attempts, last);

        prop_assert!(!backoff.is_ready(&e, last + delay - early.min(delay)));
        prop_assert!(backoff.is_ready(&e, last + delay));
        prop_assert!(backoff.is_ready(&e, last + delay + early));
    }

    #[test]
    fn test_delay_is_monotonic_and_capped(attempts in 0u32..64) {
        let backoff = BackoffStrategy::default();
        prop_assert!(backoff.delay_ms(attempts) <= backoff.delay_ms(attempts + 1));
        prop_assert!(backoff.delay_ms(attempts) <= 300_000);
    }

    #[test]
    fn test_remaining_is_zero_iff_ready(
        attempts in 0u32..20,
        last in 0u64..1_000_000,
        now in 0u64..2_000_000,
    ) {
        let backoff = BackoffStrategy::default();
        let e = entry(attempts, last);
        prop_assert_eq!(backoff.remaining_ms(&e, now) == 0, backoff.is_ready(&e, now));
    }
}
