//! The search action: the server-side boundary of the search pipeline.
//!
//! Every search request runs the same sequence:
//!
//! 1. validate the request shape
//! 2. sanitize the query text
//! 3. count the request against the caller's rate limit
//! 4. answer from the search cache when possible
//! 5. run the paginated query and cache the result
//!
//! Responses use the [`ActionResponse`] envelope. Failures other than
//! validation and rate limiting collapse into one generic message; the
//! underlying error is logged by the query layer and never sent.

use std::collections::BTreeMap;

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use repairdesk_core::rate_limit::{rate_limit_key, seconds_until};
use repairdesk_core::sanitize::sanitize_text;
use repairdesk_core::search::{
    field_errors, rate_limited_message, ActionResponse, SearchRequest, SearchResult,
    SEARCH_FAILED_MESSAGE,
};
use repairdesk_db::repositories::{SearchRepo, SearchSource};
use serde::de::DeserializeOwned;
use serde::Serialize;
use validator::Validate;

use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Why a search action did not produce data.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    /// The request shape was rejected; keyed by camelCase field name.
    #[error("Invalid search request")]
    Validation(BTreeMap<String, Vec<String>>),

    /// The caller exceeded the search rate limit.
    #[error("Rate limited for {retry_after_secs}s")]
    RateLimited { retry_after_secs: i64 },

    /// Anything else.
    #[error("Search failed")]
    Failed,
}

impl IntoResponse for ActionError {
    fn into_response(self) -> Response {
        match self {
            ActionError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                Json(ActionResponse::<()>::validation(errors)),
            )
                .into_response(),
            ActionError::RateLimited { retry_after_secs } => {
                let mut response = (
                    StatusCode::TOO_MANY_REQUESTS,
                    Json(ActionResponse::<()>::server_error(rate_limited_message(
                        retry_after_secs,
                    ))),
                )
                    .into_response();
                response
                    .headers_mut()
                    .insert(header::RETRY_AFTER, retry_after_secs.into());
                response
            }
            ActionError::Failed => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ActionResponse::<()>::server_error(SEARCH_FAILED_MESSAGE)),
            )
                .into_response(),
        }
    }
}

/// Cache key for one page of a sanitized search.
///
/// Matching is case-insensitive, so the query is lowercased.
pub fn search_cache_key(entity: &str, request: &SearchRequest) -> String {
    format!(
        "{entity}:search:{}:{}:{}",
        request.query.to_lowercase(),
        request.page,
        request.page_size
    )
}

/// Run the search pipeline for `user` against `source`.
///
/// `route` names the endpoint for the rate-limit key, so each search route
/// has its own window per user.
pub async fn run_search<T, S>(
    state: &AppState,
    user: &AuthUser,
    route: &str,
    source: &S,
    request: SearchRequest,
) -> Result<SearchResult<T>, ActionError>
where
    T: Serialize + DeserializeOwned + Send,
    S: SearchSource<T>,
{
    if let Err(errors) = request.validate() {
        return Err(ActionError::Validation(field_errors(&errors)));
    }

    let request = request.with_query(sanitize_text(&request.query));

    let key = rate_limit_key(&user.user_id.to_string(), route);
    let decision = state
        .rate_limiter
        .check_and_increment(&key, &state.config.search_rate_limit);
    if let (false, Some(retry_after)) = (decision.allowed, decision.retry_after) {
        let retry_after_secs = seconds_until(retry_after, Utc::now());
        tracing::warn!(user_id = user.user_id, route, retry_after_secs, "Search rate limited");
        return Err(ActionError::RateLimited { retry_after_secs });
    }

    let entity = source.entity();
    let cache_key = search_cache_key(entity, &request);
    if let Some(cached) = state.caches.search.get(&cache_key) {
        match serde_json::from_value::<SearchResult<T>>(cached) {
            Ok(result) => {
                tracing::debug!(entity, key = %cache_key, "Search cache hit");
                return Ok(result);
            }
            Err(e) => {
                tracing::warn!(entity, error = %e, "Discarding undecodable cached search");
                state.caches.search.delete(&cache_key);
            }
        }
    }

    let generation = state.caches.generation(entity);
    let result = SearchRepo::search(source, &request.query, request.page, request.page_size)
        .await
        .map_err(|_| ActionError::Failed)?;

    match serde_json::to_value(&result) {
        Ok(value) => {
            state.caches.fill_search(entity, generation, cache_key, value);
        }
        Err(e) => tracing::warn!(entity, error = %e, "Search result not cacheable"),
    }

    Ok(result)
}
