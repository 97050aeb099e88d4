//! # Backoff Strategies
//!
//! Decides which queued entries may be retried right now. An entry that has
//! failed `a` times waits `base * 2^a` since its last attempt; with the
//! default one-second base that is 1s, 2s, 4s, 8s, ... up to the ceiling.
//!
//! ## Usage
//!
//! ```rust
//! use engageiq_sync::client::offline::retry::BackoffStrategy;
//!
//! let backoff = BackoffStrategy::default();
//! assert_eq!(backoff.delay_ms(0), 1_000);
//! assert_eq!(backoff.delay_ms(3), 8_000);
//! ```

use crate::client::offline::queue::QueueEntry;
use crate::shared::config::{AppConfig, DEFAULT_BACKOFF_BASE_MS, DEFAULT_BACKOFF_MAX_MS};

/// Backoff strategy configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackoffStrategy {
    /// Fixed interval between retries
    Fixed {
        /// Interval in milliseconds
        interval_ms: u64,
    },
    /// Delay doubling with every failed attempt
    Exponential {
        /// Delay before the first retry, in milliseconds
        base_ms: u64,
        /// Ceiling on the delay, in milliseconds
        max_ms: u64,
    },
}

impl Default for BackoffStrategy {
    fn default() -> Self {
        BackoffStrategy::Exponential {
            base_ms: DEFAULT_BACKOFF_BASE_MS,
            max_ms: DEFAULT_BACKOFF_MAX_MS,
        }
    }
}

impl BackoffStrategy {
    /// Exponential strategy from the configured base and ceiling
    pub fn from_config(config: &AppConfig) -> Self {
        BackoffStrategy::Exponential {
            base_ms: config.backoff_base_ms,
            max_ms: config.backoff_max_ms,
        }
    }

    /// Delay required after an entry's last attempt, given its attempt count
    pub fn delay_ms(&self, attempts: u32) -> u64 {
        match *self {
            BackoffStrategy::Fixed { interval_ms } => interval_ms,
            BackoffStrategy::Exponential { base_ms, max_ms } => {
                let factor = 1u64.checked_shl(attempts).unwrap_or(u64::MAX);
                base_ms.saturating_mul(factor).min(max_ms)
            }
        }
    }

    /// Whether an entry may be retried at `now_ms`.
    ///
    /// A never-attempted entry counts its last attempt as the epoch, so it is
    /// always eligible.
    pub fn is_ready(&self, entry: &QueueEntry, now_ms: u64) -> bool {
        let last = entry.last_attempt.unwrap_or(0);
        now_ms.saturating_sub(last) >= self.delay_ms(entry.attempts)
    }

    /// Milliseconds until an entry becomes eligible, zero if it already is
    pub fn remaining_ms(&self, entry: &QueueEntry, now_ms: u64) -> u64 {
        let ready_at = entry
            .last_attempt
            .unwrap_or(0)
            .saturating_add(self.delay_ms(entry.attempts));
        ready_at.saturating_sub(now_ms)
    }

    /// Entries eligible for a retry at `now_ms`
    pub fn ready<'a>(&self, entries: &'a [QueueEntry], now_ms: u64) -> Vec<&'a QueueEntry> {
        entries.iter().filter(|e| self.is_ready(e, now_ms)).collect()
    }
}
