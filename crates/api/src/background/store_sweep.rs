//! Periodic cleanup of the in-memory stores.
//!
//! Rate-limit records and cache entries expire lazily, so expired entries
//! for keys that are never touched again would stay in memory forever.
//! This task removes them on a fixed interval.

use std::sync::Arc;
use std::time::Duration;

use repairdesk_core::rate_limit::RateLimiter;
use tokio_util::sync::CancellationToken;

use crate::state::Caches;

/// Run the sweep loop until `cancel` is triggered.
///
/// Only rate-limit windows that have already closed are removed, so a
/// sweep never resets a key that is currently denied.
pub async fn run(
    rate_limiter: Arc<RateLimiter>,
    caches: Arc<Caches>,
    interval: Duration,
    cancel: CancellationToken,
) {
    tracing::info!(interval_secs = interval.as_secs(), "Store sweep started");

    let mut ticker = tokio::time::interval(interval);
    // The first tick completes immediately; nothing has expired yet.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Store sweep stopping");
                break;
            }
            _ = ticker.tick() => {
                let records = rate_limiter.sweep();
                let entries = caches.sweep();
                if records + entries > 0 {
                    tracing::debug!(records, entries, "Store sweep: removed expired entries");
                }
            }
        }
    }
}
