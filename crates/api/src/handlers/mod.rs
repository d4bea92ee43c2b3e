pub mod customer;
pub mod search;
pub mod ticket;

use repairdesk_core::error::CoreError;
use repairdesk_core::search::field_errors;
use validator::Validate;

use crate::error::{AppError, AppResult};

/// Run `validator` rules on a request body, flattening failures into one
/// `VALIDATION_ERROR` message (`field: message; ...`).
pub(crate) fn validate_input<T: Validate>(input: &T) -> AppResult<()> {
    input.validate().map_err(|errors| {
        let message = field_errors(&errors)
            .into_iter()
            .map(|(field, messages)| format!("{field}: {}", messages.join(", ")))
            .collect::<Vec<_>>()
            .join("; ");
        AppError::Core(CoreError::Validation(message))
    })
}
