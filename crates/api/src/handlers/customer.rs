//! Handlers for the `/customers` resource.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use repairdesk_core::error::CoreError;
use repairdesk_core::pagination::SortOrder;
use repairdesk_core::search::SearchResult;
use repairdesk_core::types::DbId;
use repairdesk_db::models::customer::{
    CreateCustomer, Customer, CustomerListQuery, CustomerSort, UpdateCustomer,
};
use repairdesk_db::repositories::CustomerRepo;

use super::validate_input;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::require_manager;
use crate::query::ListQuery;
use crate::response::DataResponse;
use crate::state::AppState;

const ENTITY: &str = "customer";

/// Ticket rows carry customer fields, so customer writes invalidate both.
fn invalidate(state: &AppState) {
    state.caches.invalidate_entity(ENTITY);
    state.caches.invalidate_entity(super::ticket::ENTITY);
}

/// POST /api/v1/customers
pub async fn create_customer(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<CreateCustomer>,
) -> AppResult<(StatusCode, Json<DataResponse<Customer>>)> {
    validate_input(&input)?;

    let customer = CustomerRepo::create(&state.pool, &input).await?;
    invalidate(&state);

    tracing::info!(customer_id = customer.id, user_id = user.user_id, "Customer created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: customer })))
}

/// GET /api/v1/customers/{id}
pub async fn get_customer(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Customer>>> {
    let customer = CustomerRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Customer",
            id,
        }))?;
    Ok(Json(DataResponse { data: customer }))
}

/// PUT /api/v1/customers/{id}
///
/// Partial update. Only managers may deactivate a customer.
pub async fn update_customer(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateCustomer>,
) -> AppResult<Json<DataResponse<Customer>>> {
    validate_input(&input)?;
    if input.active == Some(false) {
        require_manager(&user, "deactivate customers")?;
    }

    let customer = CustomerRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Customer",
            id,
        }))?;
    invalidate(&state);

    tracing::info!(customer_id = id, user_id = user.user_id, "Customer updated");
    Ok(Json(DataResponse { data: customer }))
}

/// GET /api/v1/customers
///
/// URL-driven list: `page`, `pageSize`, `search`, `sortBy`, `sortOrder` and
/// the `active` filter. Unknown `sortBy` values fall back to name order.
pub async fn list_customers(
    State(state): State<AppState>,
    _user: AuthUser,
    query: ListQuery,
) -> AppResult<Json<DataResponse<SearchResult<Customer>>>> {
    let cache_key = query.cache_key(ENTITY);
    if let Some(cached) = state.caches.query.get(&cache_key) {
        if let Ok(page) = serde_json::from_value::<SearchResult<Customer>>(cached) {
            tracing::debug!(key = %cache_key, "Customer list cache hit");
            return Ok(Json(DataResponse { data: page }));
        }
    }

    let generation = state.caches.generation(ENTITY);
    let params = CustomerListQuery {
        pattern: query.pattern(),
        active: query.bool_filter("active")?,
        sort: query
            .state
            .sort_by
            .as_deref()
            .and_then(CustomerSort::parse)
            .unwrap_or_default(),
        order: query.state.sort_order.unwrap_or(SortOrder::Asc),
        limit: query.state.page_size,
        offset: query.state.offset(),
    };

    let (rows, total) = CustomerRepo::list_page(&state.pool, &params).await?;
    let page = SearchResult::new(rows, total, query.state.page, query.state.page_size);

    if let Ok(value) = serde_json::to_value(&page) {
        state.caches.fill_list(ENTITY, generation, cache_key, value);
    }
    Ok(Json(DataResponse { data: page }))
}
