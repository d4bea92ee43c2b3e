pub mod customer;
pub mod health;
pub mod ticket;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /customers                 list (GET), create (POST)
/// /customers/search          search action (POST)
/// /customers/{id}            get, update (GET, PUT)
///
/// /tickets                   list (GET), create (POST)
/// /tickets/search            search action (POST)
/// /tickets/{id}              get, update (GET, PUT)
/// ```
///
/// Every route requires a Bearer token.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/customers", customer::router())
        .nest("/tickets", ticket::router())
}
