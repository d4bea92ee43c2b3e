//! Shared query parameter types for API handlers.
//!
//! List endpoints take their whole state from the URL query string, using
//! the same keys the client-side pagination controller writes.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use repairdesk_core::pagination::{PaginationConfig, PaginationState};
use repairdesk_core::sanitize::sanitize_text;
use repairdesk_core::search::like_pattern;

use crate::error::{AppError, AppResult};

/// Pagination, search, sort and filter state of a list request.
///
/// Never rejects: unparseable values fall back to their defaults exactly as
/// they do in the browser.
#[derive(Debug, Clone)]
pub struct ListQuery {
    pub state: PaginationState,
    /// Canonical query string, used as the list cache key.
    pub canonical: String,
}

impl ListQuery {
    pub fn from_query(query: &str) -> Self {
        let config = PaginationConfig::default();
        let state = PaginationState::from_query(query, &config);
        let canonical = state.to_query(&config);
        Self { state, canonical }
    }

    /// `ILIKE` pattern for the sanitized `search` key, `None` when it is blank.
    pub fn pattern(&self) -> Option<String> {
        let search = sanitize_text(&self.state.search);
        (!search.is_empty()).then(|| like_pattern(&search))
    }

    /// Parse a boolean filter (`true`/`false`). An absent filter is `None`.
    pub fn bool_filter(&self, key: &str) -> AppResult<Option<bool>> {
        match self.state.filter(key) {
            None => Ok(None),
            Some(value) => value.parse::<bool>().map(Some).map_err(|_| {
                AppError::BadRequest(format!("Filter '{key}' must be true or false"))
            }),
        }
    }

    /// Cache key for this page of `entity`'s list.
    pub fn cache_key(&self, entity: &str) -> String {
        format!("{entity}:list:{}", self.canonical)
    }
}

impl<S: Send + Sync> FromRequestParts<S> for ListQuery {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_query(parts.uri.query().unwrap_or("")))
    }
}
