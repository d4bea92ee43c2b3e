//! Short-lived in-process key/value cache with per-entry TTL.
//!
//! Expiry is evaluated lazily on read; [`TtlCache::sweep`] exists only to
//! reclaim memory and is driven by the API's background sweep task.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use chrono::Utc;

use crate::types::Timestamp;

/// TTL for general query results (list pages, single-entity lookups).
pub const QUERY_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// TTL for identity lookups.
pub const USER_CACHE_TTL: Duration = Duration::from_secs(10 * 60);

/// TTL for search results.
pub const SEARCH_CACHE_TTL: Duration = Duration::from_secs(2 * 60);

/// A cached value plus the bookkeeping needed to expire it.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub data: V,
    pub created_at: Timestamp,
    pub ttl: Duration,
}

impl<V> CacheEntry<V> {
    /// An entry is expired once strictly more than `ttl` has passed.
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        let age = now - self.created_at;
        match age.to_std() {
            Ok(age) => age > self.ttl,
            // Negative age: the clock went backwards, keep the entry.
            Err(_) => false,
        }
    }
}

/// Thread-safe TTL cache. Values are cloned out on read.
#[derive(Debug)]
pub struct TtlCache<V> {
    default_ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry<V>>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            default_ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub fn get(&self, key: &str) -> Option<V> {
        self.get_at(key, Utc::now())
    }

    /// Look up `key` as of `now`, evicting it if it has expired.
    pub fn get_at(&self, key: &str, now: Timestamp) -> Option<V> {
        let mut entries = self.lock();
        if entries.get(key)?.is_expired_at(now) {
            entries.remove(key);
            return None;
        }
        entries.get(key).map(|entry| entry.data.clone())
    }

    pub fn set(&self, key: impl Into<String>, value: V) {
        self.set_at(key, value, self.default_ttl, Utc::now());
    }

    pub fn set_with_ttl(&self, key: impl Into<String>, value: V, ttl: Duration) {
        self.set_at(key, value, ttl, Utc::now());
    }

    /// Insert or replace `key`, treating `now` as its creation time.
    pub fn set_at(&self, key: impl Into<String>, value: V, ttl: Duration, now: Timestamp) {
        self.lock().insert(
            key.into(),
            CacheEntry {
                data: value,
                created_at: now,
                ttl,
            },
        );
    }

    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn has_at(&self, key: &str, now: Timestamp) -> bool {
        self.get_at(key, now).is_some()
    }

    /// Remove `key`. Returns `true` if an entry was present.
    pub fn delete(&self, key: &str) -> bool {
        self.lock().remove(key).is_some()
    }

    /// Remove every entry whose key starts with `prefix`.
    pub fn delete_prefix(&self, prefix: &str) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        before - entries.len()
    }

    /// Number of stored entries, including expired ones not yet evicted.
    pub fn size(&self) -> usize {
        self.lock().len()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn sweep(&self) -> usize {
        self.sweep_at(Utc::now())
    }

    /// Evict every entry expired as of `now`. Returns how many were removed.
    pub fn sweep_at(&self, now: Timestamp) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired_at(now));
        before - entries.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, CacheEntry<V>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn t0() -> Timestamp {
        Utc.with_ymd_and_hms(2026, 10, 1, 9, 30, 0).unwrap()
    }

    fn secs(n: i64) -> chrono::TimeDelta {
        chrono::TimeDelta::seconds(n)
    }

    #[test]
    fn value_is_returned_within_ttl() {
        let cache = TtlCache::new(Duration::from_secs(10));
        cache.set_at("k", 7, Duration::from_secs(10), t0());
        assert_eq!(cache.get_at("k", t0() + secs(10)), Some(7));
    }

    #[test]
    fn expired_value_is_absent_and_evicted() {
        let cache = TtlCache::new(Duration::from_secs(10));
        cache.set_at("k", "v".to_string(), Duration::from_secs(10), t0());
        assert_eq!(cache.size(), 1);

        assert_eq!(cache.get_at("k", t0() + secs(11)), None);
        assert_eq!(cache.size(), 0);
    }

    #[test]
    fn set_replaces_and_restarts_ttl() {
        let cache = TtlCache::new(Duration::from_secs(10));
        cache.set_at("k", 1, Duration::from_secs(10), t0());
        cache.set_at("k", 2, Duration::from_secs(10), t0() + secs(8));
        assert_eq!(cache.get_at("k", t0() + secs(15)), Some(2));
    }

    #[test]
    fn has_and_delete() {
        let cache = TtlCache::new(SEARCH_CACHE_TTL);
        cache.set("a", 1);
        assert!(cache.has("a"));
        assert!(cache.delete("a"));
        assert!(!cache.has("a"));
        assert!(!cache.delete("a"));
    }

    #[test]
    fn delete_prefix_only_touches_matching_keys() {
        let cache = TtlCache::new(QUERY_CACHE_TTL);
        cache.set("customers:list:1", 1);
        cache.set("customers:list:2", 2);
        cache.set("tickets:list:1", 3);
        assert_eq!(cache.delete_prefix("customers:"), 2);
        assert_eq!(cache.size(), 1);
    }

    #[test]
    fn sweep_reclaims_expired_entries_only() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.set_at("short", 1, Duration::from_secs(5), t0());
        cache.set_at("long", 2, Duration::from_secs(60), t0());
        assert_eq!(cache.sweep_at(t0() + secs(30)), 1);
        assert_eq!(cache.size(), 1);
        assert_eq!(cache.get_at("long", t0() + secs(30)), Some(2));
    }

    #[test]
    fn named_ttls() {
        assert_eq!(QUERY_CACHE_TTL, Duration::from_secs(300));
        assert_eq!(USER_CACHE_TTL, Duration::from_secs(600));
        assert_eq!(SEARCH_CACHE_TTL, Duration::from_secs(120));
    }
}
