use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use repairdesk_core::cache::{TtlCache, QUERY_CACHE_TTL, SEARCH_CACHE_TTL, USER_CACHE_TTL};
use repairdesk_core::rate_limit::RateLimiter;

use crate::config::ServerConfig;
use crate::middleware::auth::AuthUser;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
/// The rate limiter and caches live here rather than in globals, so every
/// test router gets its own.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: repairdesk_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Fixed-window counters for the search actions.
    pub rate_limiter: Arc<RateLimiter>,
    /// Named TTL caches.
    pub caches: Arc<Caches>,
}

impl AppState {
    pub fn new(pool: repairdesk_db::DbPool, config: ServerConfig) -> Self {
        Self {
            pool,
            config: Arc::new(config),
            rate_limiter: Arc::new(RateLimiter::new()),
            caches: Arc::new(Caches::new()),
        }
    }
}

/// The three cache instances, each with its own default TTL.
///
/// List pages and search results are stored as JSON so one cache can hold
/// rows of any entity; keys are prefixed with the entity name.
///
/// Each entity also has a generation counter, bumped on every invalidation.
/// A read captures the generation before querying and only fills the cache
/// if it is unchanged, so a page read before a write is never stored after
/// the write's invalidation.
pub struct Caches {
    /// URL-driven list pages (5 min).
    pub query: TtlCache<serde_json::Value>,
    /// Decoded bearer tokens, keyed by token digest (10 min).
    pub users: TtlCache<AuthUser>,
    /// Search action results (2 min).
    pub search: TtlCache<serde_json::Value>,
    generations: Mutex<HashMap<String, u64>>,
}

impl Caches {
    pub fn new() -> Self {
        Self {
            query: TtlCache::new(QUERY_CACHE_TTL),
            users: TtlCache::new(USER_CACHE_TTL),
            search: TtlCache::new(SEARCH_CACHE_TTL),
            generations: Mutex::new(HashMap::new()),
        }
    }

    /// Current cache generation of `entity`. Capture it before querying.
    pub fn generation(&self, entity: &str) -> u64 {
        self.lock_generations().get(entity).copied().unwrap_or(0)
    }

    /// Drop every list page and search result cached for `entity`.
    pub fn invalidate_entity(&self, entity: &str) {
        let mut generations = self.lock_generations();
        *generations.entry(entity.to_string()).or_insert(0) += 1;

        let prefix = format!("{entity}:");
        let lists = self.query.delete_prefix(&prefix);
        let searches = self.search.delete_prefix(&prefix);
        tracing::debug!(entity, lists, searches, "Invalidated cached reads");
    }

    /// Store a list page unless `entity` was invalidated since `generation`.
    pub fn fill_list(
        &self,
        entity: &str,
        generation: u64,
        key: String,
        value: serde_json::Value,
    ) -> bool {
        self.fill_if_current(&self.query, entity, generation, key, value)
    }

    /// Store a search result unless `entity` was invalidated since `generation`.
    pub fn fill_search(
        &self,
        entity: &str,
        generation: u64,
        key: String,
        value: serde_json::Value,
    ) -> bool {
        self.fill_if_current(&self.search, entity, generation, key, value)
    }

    fn fill_if_current(
        &self,
        cache: &TtlCache<serde_json::Value>,
        entity: &str,
        generation: u64,
        key: String,
        value: serde_json::Value,
    ) -> bool {
        // Held across the set so an invalidation cannot slip in between.
        let generations = self.lock_generations();
        if generations.get(entity).copied().unwrap_or(0) != generation {
            tracing::debug!(entity, key = %key, "Skipped cache fill after invalidation");
            return false;
        }
        cache.set(key, value);
        true
    }

    /// Sweep expired entries from every cache. Returns the number removed.
    pub fn sweep(&self) -> usize {
        self.query.sweep() + self.users.sweep() + self.search.sweep()
    }

    fn lock_generations(&self) -> MutexGuard<'_, HashMap<String, u64>> {
        self.generations.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Caches {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn fill_stores_when_nothing_was_invalidated() {
        let caches = Caches::new();
        let generation = caches.generation("customer");

        assert!(caches.fill_list("customer", generation, "customer:list:".into(), json!([1])));
        assert_eq!(caches.query.get("customer:list:"), Some(json!([1])));
    }

    #[test]
    fn fill_after_invalidation_is_dropped() {
        let caches = Caches::new();
        let generation = caches.generation("customer");

        // A write lands while the read is still querying.
        caches.invalidate_entity("customer");

        assert!(!caches.fill_search(
            "customer",
            generation,
            "customer:search:doe:1:10".into(),
            json!({ "data": [] }),
        ));
        assert!(!caches.search.has("customer:search:doe:1:10"));

        let fresh = caches.generation("customer");
        assert!(caches.fill_search("customer", fresh, "customer:search:doe:1:10".into(), json!({})));
    }

    #[test]
    fn invalidation_is_per_entity() {
        let caches = Caches::new();
        let ticket_generation = caches.generation("ticket");
        caches.query.set("ticket:list:", json!([]));

        caches.invalidate_entity("customer");

        assert!(caches.query.has("ticket:list:"));
        assert!(caches.fill_list("ticket", ticket_generation, "ticket:list:page=2".into(), json!([])));
    }
}
