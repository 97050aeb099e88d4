//! Integration tests
//!
//! End-to-end scenarios over the public API

mod http_store_test;
mod karma_test;
mod queue_test;
mod reconcile_test;
