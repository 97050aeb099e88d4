//! Time source for queue timestamps, backoff and daily progress dates.

use chrono::{Local, TimeZone};
use std::sync::atomic::{AtomicU64, Ordering};

/// Milliseconds since the Unix epoch and the matching local calendar date
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> u64;

    /// Local date of `now_ms`, formatted `YYYY-MM-DD`
    fn today(&self) -> String {
        local_date(self.now_ms())
    }
}

/// Format a timestamp as a local calendar date
pub fn local_date(ms: u64) -> String {
    match Local.timestamp_millis_opt(ms as i64).single() {
        Some(dt) => dt.format("%Y-%m-%d").to_string(),
        None => Local::now().format("%Y-%m-%d").to_string(),
    }
}

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        chrono::Utc::now().timestamp_millis().max(0) as u64
    }
}

/// Manually advanced clock for tests and simulations
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: AtomicU64::new(start_ms),
        }
    }

    pub fn set(&self, ms: u64) {
        self.now.store(ms, Ordering::SeqCst);
    }

    pub fn advance(&self, ms: u64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}
