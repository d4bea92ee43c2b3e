//! Route definitions for the `/customers` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{customer, search};
use crate::state::AppState;

/// Routes mounted at `/customers`.
///
/// ```text
/// GET    /          -> list_customers  (?page&pageSize&search&sortBy&sortOrder&active)
/// POST   /          -> create_customer
/// POST   /search    -> search_customers
/// GET    /{id}      -> get_customer
/// PUT    /{id}      -> update_customer
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(customer::list_customers).post(customer::create_customer),
        )
        .route("/search", post(search::search_customers))
        .route(
            "/{id}",
            get(customer::get_customer).put(customer::update_customer),
        )
}
