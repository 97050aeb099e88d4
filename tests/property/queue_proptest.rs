//! Property-based tests for queue deduplication

use crate::common::{post, Fixture};
use proptest::prelude::*;
use std::collections::HashSet;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_queue_holds_one_entry_per_id(ids in prop::collection::vec("[a-z]{1,3}", 0..40)) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();

        let (len, listed, reopened) = runtime.block_on(async {
            let fixture = Fixture::new();
            let queue = fixture.open_queue().await;
            for id in &ids {
                queue.add(post(id, "x")).await;
            }
            (queue.len().await, queue.list_ids().await, fixture.open_queue().await.list_ids().await)
        });

        let unique: HashSet<String> = ids.into_iter().collect();
        prop_assert_eq!(len, unique.len());
        prop_assert_eq!(&listed, &unique);
        prop_assert_eq!(&reopened, &unique);
    }
}
