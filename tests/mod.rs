//! Test suite for EngageIQ Sync
//!
//! This module organizes all tests

pub mod common;
pub mod integration;
pub mod property;
