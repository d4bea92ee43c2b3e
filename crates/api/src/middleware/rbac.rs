//! Manager-only authorization rules.
//!
//! Every endpoint requires an authenticated user; a few individual changes
//! (deactivating a customer, assigning another technician's work) are
//! reserved for managers. Handlers call [`require_manager`] before applying
//! such a change.

use repairdesk_core::error::CoreError;

use super::auth::AuthUser;
use crate::error::{AppError, AppResult};

/// Reject with 403 Forbidden unless `user` is a manager.
///
/// `action` completes the sentence "Only managers may ...".
pub fn require_manager(user: &AuthUser, action: &str) -> AppResult<()> {
    if user.is_manager {
        return Ok(());
    }
    tracing::warn!(user_id = user.user_id, action, "Manager-only action refused");
    Err(AppError::Core(CoreError::Forbidden(format!(
        "Only managers may {action}"
    ))))
}
