//! Handlers for the search actions.
//!
//! Both endpoints share [`run_search`]; only the row type and the search
//! source differ.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use repairdesk_core::search::{ActionResponse, SearchRequest, SearchResult};
use repairdesk_db::models::customer::Customer;
use repairdesk_db::models::ticket::TicketSearchRow;
use repairdesk_db::repositories::{CustomerSearch, TicketSearch};

use crate::action::{run_search, ActionError};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Route names used in rate-limit keys.
pub const CUSTOMER_SEARCH_ROUTE: &str = "customers/search";
pub const TICKET_SEARCH_ROUTE: &str = "tickets/search";

/// A malformed JSON body is reported like any other validation failure.
fn request_body(payload: Result<Json<SearchRequest>, JsonRejection>) -> Result<SearchRequest, ActionError> {
    payload.map(|Json(request)| request).map_err(|rejection| {
        ActionError::Validation(
            [("request".to_string(), vec![rejection.body_text()])]
                .into_iter()
                .collect(),
        )
    })
}

/// POST /api/v1/customers/search
pub async fn search_customers(
    State(state): State<AppState>,
    user: AuthUser,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<ActionResponse<SearchResult<Customer>>>, ActionError> {
    let request = request_body(payload)?;
    let source = CustomerSearch::new(state.pool.clone());
    let result = run_search(&state, &user, CUSTOMER_SEARCH_ROUTE, &source, request).await?;
    Ok(Json(ActionResponse::success(result)))
}

/// POST /api/v1/tickets/search
pub async fn search_tickets(
    State(state): State<AppState>,
    user: AuthUser,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<ActionResponse<SearchResult<TicketSearchRow>>>, ActionError> {
    let request = request_body(payload)?;
    let source = TicketSearch::new(state.pool.clone());
    let result = run_search(&state, &user, TICKET_SEARCH_ROUTE, &source, request).await?;
    Ok(Json(ActionResponse::success(result)))
}
