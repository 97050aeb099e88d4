//! Property-based tests
//!
//! Uses proptest to generate random inputs and verify properties

mod backoff_proptest;
mod queue_proptest;
