use crate::types::{DbId, Timestamp};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// A fixed-window rate limit was exceeded; the window reopens at `retry_after`.
    #[error("Rate limit exceeded until {retry_after}")]
    RateLimited { retry_after: Timestamp },

    #[error("Internal error: {0}")]
    Internal(String),
}
