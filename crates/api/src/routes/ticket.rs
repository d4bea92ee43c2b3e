//! Route definitions for the `/tickets` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{search, ticket};
use crate::state::AppState;

/// Routes mounted at `/tickets`.
///
/// ```text
/// GET    /          -> list_tickets  (?page&pageSize&search&sortBy&sortOrder&completed&tech)
/// POST   /          -> create_ticket
/// POST   /search    -> search_tickets
/// GET    /{id}      -> get_ticket
/// PUT    /{id}      -> update_ticket
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(ticket::list_tickets).post(ticket::create_ticket))
        .route("/search", post(search::search_tickets))
        .route("/{id}", get(ticket::get_ticket).put(ticket::update_ticket))
}
