//! Shared response envelope types for API handlers.
//!
//! CRUD and list endpoints use a `{ "data": ... }` envelope. The search
//! actions answer with [`repairdesk_core::search::ActionResponse`] instead.

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
///
/// # Example
///
/// ```ignore
/// Ok(Json(DataResponse { data: customer }))
/// ```
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}
