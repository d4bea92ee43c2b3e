//! JWT-based authentication extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use repairdesk_core::error::CoreError;
use repairdesk_core::types::DbId;

use crate::auth::jwt::{token_digest, verify_token, Claims};
use crate::error::AppError;
use crate::state::AppState;

/// Authenticated user extracted from a JWT Bearer token in the `Authorization` header.
///
/// Decoded identities are kept in the `users` cache keyed by the token's
/// digest. A cached identity is only reused while the token itself is
/// still unexpired.
///
/// ```ignore
/// async fn my_handler(user: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = user.user_id, is_manager = user.is_manager, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    /// The user's id (from `claims.sub`).
    pub user_id: DbId,
    /// The user's email, used as the technician name on tickets.
    pub email: String,
    pub is_manager: bool,
    /// Token expiry (UTC Unix timestamp).
    pub expires_at: i64,
}

impl AuthUser {
    fn is_expired(&self) -> bool {
        self.expires_at <= chrono::Utc::now().timestamp()
    }
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email,
            is_manager: claims.is_manager,
            expires_at: claims.exp,
        }
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized(
                    "Missing Authorization header".into(),
                ))
            })?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid Authorization format. Expected: Bearer <token>".into(),
            ))
        })?;

        let cache_key = token_digest(token);
        if let Some(user) = state.caches.users.get(&cache_key) {
            if !user.is_expired() {
                return Ok(user);
            }
            state.caches.users.delete(&cache_key);
        }

        let claims = verify_token(token, &state.config.jwt).map_err(|_| {
            AppError::Core(CoreError::Unauthorized("Invalid or expired token".into()))
        })?;

        let user = AuthUser::from(claims);
        state.caches.users.set(cache_key, user.clone());

        Ok(user)
    }
}
