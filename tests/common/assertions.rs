//! Custom assertion macros for queue and store state

/// Assert that a result is ok and return the value
#[macro_export]
macro_rules! assert_ok {
    ($result:expr) => {
        match $result {
            Ok(value) => value,
            Err(e) => panic!("Expected Ok, got Err: {:?}", e),
        }
    };
    ($result:expr, $message:expr) => {
        match $result {
            Ok(value) => value,
            Err(e) => panic!("{}: {:?}", $message, e),
        }
    };
}

/// Assert that the queue holds exactly the given ids
#[macro_export]
macro_rules! assert_queue_ids {
    ($queue:expr, [$($id:expr),* $(,)?]) => {{
        let actual = $queue.list_ids().await;
        let expected: std::collections::HashSet<String> =
            [$($id.to_string()),*].into_iter().collect();
        assert_eq!(actual, expected, "unexpected queue contents");
    }};
}

/// Assert that the store holds a document of the given type and id
#[macro_export]
macro_rules! assert_stored {
    ($store:expr, $doc_type:expr, $id:expr) => {
        assert!(
            $store.get($doc_type, $id).is_some(),
            "Expected {} {} in the store",
            $doc_type,
            $id
        );
    };
}
