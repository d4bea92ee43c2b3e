//! Fixed-window request rate limiting.
//!
//! A [`RateLimiter`] is an in-process counter store keyed by
//! `(client identity, route)`. It is owned by the application state and
//! shared behind an `Arc`; counters are not coordinated across processes.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use chrono::Utc;

use crate::error::CoreError;
use crate::types::Timestamp;

/// Default number of search requests per window.
pub const DEFAULT_SEARCH_MAX_REQUESTS: u32 = 30;

/// Default search window length.
pub const DEFAULT_SEARCH_WINDOW: Duration = Duration::from_secs(60);

/// How many requests a key may make inside one window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub max_requests: u32,
    pub window: Duration,
}

impl RateLimitPolicy {
    pub const fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
        }
    }

    /// The search endpoint policy: 30 requests per 60 seconds.
    pub const fn search() -> Self {
        Self::new(DEFAULT_SEARCH_MAX_REQUESTS, DEFAULT_SEARCH_WINDOW)
    }

    /// End of a window that opens at `now`, saturating at the largest
    /// representable timestamp.
    fn window_end(&self, now: Timestamp) -> Timestamp {
        chrono::TimeDelta::from_std(self.window)
            .ok()
            .and_then(|delta| now.checked_add_signed(delta))
            .unwrap_or(chrono::DateTime::<Utc>::MAX_UTC)
    }
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self::search()
    }
}

/// Counter state for one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitRecord {
    pub count: u32,
    pub window_reset_at: Timestamp,
}

/// Outcome of a single [`RateLimiter::check_and_increment`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    /// Requests left in the current window after this one.
    pub remaining: u32,
    /// When the window reopens. Only set when the request was denied.
    pub retry_after: Option<Timestamp>,
}

/// Build the counter key for a client on a route.
pub fn rate_limit_key(identity: &str, route: &str) -> String {
    format!("{identity}:{route}")
}

/// In-memory fixed-window counter store.
///
/// All mutation goes through one mutex, so increments on the same key are
/// serialized even on a multi-threaded runtime. The lock is never held
/// across an `.await`.
#[derive(Debug, Default)]
pub struct RateLimiter {
    records: Mutex<HashMap<String, RateLimitRecord>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a request for `key` against `policy` using the wall clock.
    pub fn check_and_increment(&self, key: &str, policy: &RateLimitPolicy) -> RateLimitDecision {
        self.check_and_increment_at(key, policy, Utc::now())
    }

    /// Count a request for `key` as if it arrived at `now`.
    ///
    /// A missing or expired record opens a fresh window with `count = 1`.
    /// Otherwise the count is incremented and the request is denied once it
    /// exceeds `policy.max_requests`.
    pub fn check_and_increment_at(
        &self,
        key: &str,
        policy: &RateLimitPolicy,
        now: Timestamp,
    ) -> RateLimitDecision {
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);

        let record = records
            .entry(key.to_string())
            .and_modify(|record| {
                if now >= record.window_reset_at {
                    record.count = 1;
                    record.window_reset_at = policy.window_end(now);
                } else {
                    record.count = record.count.saturating_add(1);
                }
            })
            .or_insert_with(|| RateLimitRecord {
                count: 1,
                window_reset_at: policy.window_end(now),
            });

        if record.count > policy.max_requests {
            RateLimitDecision {
                allowed: false,
                remaining: 0,
                retry_after: Some(record.window_reset_at),
            }
        } else {
            RateLimitDecision {
                allowed: true,
                remaining: policy.max_requests - record.count,
                retry_after: None,
            }
        }
    }

    /// Like [`check_and_increment`](Self::check_and_increment) but turns a
    /// denial into [`CoreError::RateLimited`].
    pub fn enforce(&self, key: &str, policy: &RateLimitPolicy) -> Result<u32, CoreError> {
        let decision = self.check_and_increment(key, policy);
        match decision.retry_after {
            Some(retry_after) if !decision.allowed => Err(CoreError::RateLimited { retry_after }),
            _ => Ok(decision.remaining),
        }
    }

    /// Snapshot of the record for `key`, if any.
    pub fn record(&self, key: &str) -> Option<RateLimitRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Drop every record whose window has closed. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        self.sweep_at(Utc::now())
    }

    /// Drop every record whose window closed at or before `now`.
    ///
    /// Records still inside their window are left alone, so a denied key
    /// stays denied until its window actually ends.
    pub fn sweep_at(&self, now: Timestamp) -> usize {
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        let before = records.len();
        records.retain(|_, record| now < record.window_reset_at);
        before - records.len()
    }

    /// Number of tracked keys.
    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Whole seconds until `retry_after`, rounded up and never below 1.
pub fn seconds_until(retry_after: Timestamp, now: Timestamp) -> i64 {
    let millis = (retry_after - now).num_milliseconds();
    ((millis + 999) / 1000).max(1)
}
