//! Handlers for the `/tickets` resource.
//!
//! Technicians are identified by email. A ticket's `tech` is either a
//! technician's email or `"unassigned"`.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use repairdesk_core::error::CoreError;
use repairdesk_core::pagination::SortOrder;
use repairdesk_core::roles::{is_assigned, UNASSIGNED_TECH};
use repairdesk_core::search::SearchResult;
use repairdesk_core::types::DbId;
use repairdesk_db::models::ticket::{
    CreateTicket, Ticket, TicketListQuery, TicketSearchRow, TicketSort, UpdateTicket,
};
use repairdesk_db::repositories::{CustomerRepo, TicketRepo};

use super::validate_input;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::require_manager;
use crate::query::ListQuery;
use crate::response::DataResponse;
use crate::state::AppState;

pub(crate) const ENTITY: &str = "ticket";

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Ticket",
        id,
    })
}

/// Assigning work to anyone but yourself (or leaving it unassigned) is a manager action.
fn check_assignment(user: &AuthUser, tech: &str) -> AppResult<()> {
    if is_assigned(tech) && tech != user.email {
        require_manager(user, "assign tickets to other technicians")?;
    }
    Ok(())
}

/// POST /api/v1/tickets
///
/// Opens a ticket for an active customer. `tech` defaults to `"unassigned"`.
pub async fn create_ticket(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<CreateTicket>,
) -> AppResult<(StatusCode, Json<DataResponse<Ticket>>)> {
    validate_input(&input)?;

    let customer = CustomerRepo::find_by_id(&state.pool, input.customer_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Customer",
            id: input.customer_id,
        }))?;
    if !customer.active {
        return Err(AppError::Core(CoreError::Validation(
            "Tickets cannot be opened for an inactive customer".into(),
        )));
    }

    let tech = input.tech.as_deref().unwrap_or(UNASSIGNED_TECH);
    check_assignment(&user, tech)?;

    let ticket = TicketRepo::create(&state.pool, &input, tech).await?;
    state.caches.invalidate_entity(ENTITY);

    tracing::info!(
        ticket_id = ticket.id,
        customer_id = ticket.customer_id,
        tech = %ticket.tech,
        "Ticket created",
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: ticket })))
}

/// GET /api/v1/tickets/{id}
///
/// Returns the ticket joined with its customer's contact fields.
pub async fn get_ticket(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<TicketSearchRow>>> {
    let row = TicketRepo::find_row_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(DataResponse { data: row }))
}

/// PUT /api/v1/tickets/{id}
///
/// Non-managers may only update tickets assigned to them, and may only
/// reassign them to themselves.
pub async fn update_ticket(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateTicket>,
) -> AppResult<Json<DataResponse<Ticket>>> {
    validate_input(&input)?;

    let existing = TicketRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    if !user.is_manager && existing.tech != user.email {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only the assigned technician may update this ticket".into(),
        )));
    }
    if let Some(tech) = input.tech.as_deref() {
        check_assignment(&user, tech)?;
    }

    let ticket = TicketRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| not_found(id))?;
    state.caches.invalidate_entity(ENTITY);

    tracing::info!(ticket_id = id, user_id = user.user_id, "Ticket updated");
    Ok(Json(DataResponse { data: ticket }))
}

/// GET /api/v1/tickets
///
/// URL-driven list: `page`, `pageSize`, `search`, `sortBy`, `sortOrder` and
/// the `completed` and `tech` filters. Unknown `sortBy` values fall back to
/// creation order.
pub async fn list_tickets(
    State(state): State<AppState>,
    _user: AuthUser,
    query: ListQuery,
) -> AppResult<Json<DataResponse<SearchResult<TicketSearchRow>>>> {
    let cache_key = query.cache_key(ENTITY);
    if let Some(cached) = state.caches.query.get(&cache_key) {
        if let Ok(page) = serde_json::from_value::<SearchResult<TicketSearchRow>>(cached) {
            tracing::debug!(key = %cache_key, "Ticket list cache hit");
            return Ok(Json(DataResponse { data: page }));
        }
    }

    let generation = state.caches.generation(ENTITY);
    let params = TicketListQuery {
        pattern: query.pattern(),
        completed: query.bool_filter("completed")?,
        tech: query.state.filter("tech").map(str::to_string),
        sort: query
            .state
            .sort_by
            .as_deref()
            .and_then(TicketSort::parse)
            .unwrap_or_default(),
        order: query.state.sort_order.unwrap_or(SortOrder::Asc),
        limit: query.state.page_size,
        offset: query.state.offset(),
    };

    let (rows, total) = TicketRepo::list_page(&state.pool, &params).await?;
    let page = SearchResult::new(rows, total, query.state.page, query.state.page_size);

    if let Ok(value) = serde_json::to_value(&page) {
        state.caches.fill_list(ENTITY, generation, cache_key, value);
    }
    Ok(Json(DataResponse { data: page }))
}
