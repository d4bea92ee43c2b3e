//! Repository for the `tickets` table.
//!
//! Read paths that need customer details join `customers` with an explicit
//! `t.customer_id = c.id` equality predicate.

use repairdesk_core::types::DbId;
use sqlx::PgPool;

use crate::models::ticket::{CreateTicket, Ticket, TicketListQuery, TicketSearchRow, UpdateTicket};

/// Column list shared across single-table queries.
const COLUMNS: &str = "id, customer_id, title, description, completed, tech, created_at, updated_at";

/// Column list for ticket rows joined with their customer.
const JOINED_COLUMNS: &str = "t.id, t.customer_id, t.title, t.description, t.completed, t.tech, \
     t.created_at, t.updated_at, \
     c.first_name, c.last_name, c.email, c.phone, c.city, c.zip";

const JOINED_FROM: &str = "tickets t INNER JOIN customers c ON t.customer_id = c.id";

/// Substring match over ticket and owning-customer fields. `$1` is the `ILIKE` pattern.
pub(crate) const MATCH_CLAUSE: &str = "(t.title ILIKE $1 \
     OR t.description ILIKE $1 \
     OR c.first_name ILIKE $1 \
     OR c.last_name ILIKE $1 \
     OR (c.first_name || ' ' || c.last_name) ILIKE $1 \
     OR c.email ILIKE $1)";

/// Provides CRUD, listing and match queries for tickets.
pub struct TicketRepo;

impl TicketRepo {
    /// Insert a new ticket assigned to `tech`, returning the created row.
    pub async fn create(
        pool: &PgPool,
        input: &CreateTicket,
        tech: &str,
    ) -> Result<Ticket, sqlx::Error> {
        let query = format!(
            "INSERT INTO tickets (customer_id, title, description, tech)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Ticket>(&query)
            .bind(input.customer_id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(tech)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Ticket>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tickets WHERE id = $1");
        sqlx::query_as::<_, Ticket>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a ticket together with its customer's contact fields.
    pub async fn find_row_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<TicketSearchRow>, sqlx::Error> {
        let query = format!("SELECT {JOINED_COLUMNS} FROM {JOINED_FROM} WHERE t.id = $1");
        sqlx::query_as::<_, TicketSearchRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Update a ticket. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateTicket,
    ) -> Result<Option<Ticket>, sqlx::Error> {
        let query = format!(
            "UPDATE tickets SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                completed = COALESCE($4, completed),
                tech = COALESCE($5, tech)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Ticket>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.completed)
            .bind(&input.tech)
            .fetch_optional(pool)
            .await
    }

    /// One page of joined ticket rows plus the total row count for the same filters.
    pub async fn list_page(
        pool: &PgPool,
        params: &TicketListQuery,
    ) -> Result<(Vec<TicketSearchRow>, i64), sqlx::Error> {
        let filter = format!(
            "($1::TEXT IS NULL OR {MATCH_CLAUSE}) \
             AND ($2::BOOLEAN IS NULL OR t.completed = $2) \
             AND ($3::TEXT IS NULL OR t.tech = $3)"
        );

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM {JOINED_FROM} WHERE {filter}"
        ))
        .bind(&params.pattern)
        .bind(params.completed)
        .bind(&params.tech)
        .fetch_one(pool)
        .await?;

        let query = format!(
            "SELECT {JOINED_COLUMNS} FROM {JOINED_FROM} WHERE {filter} \
             ORDER BY {} LIMIT $4 OFFSET $5",
            params.sort.order_by(params.order)
        );
        let rows = sqlx::query_as::<_, TicketSearchRow>(&query)
            .bind(&params.pattern)
            .bind(params.completed)
            .bind(&params.tech)
            .bind(params.limit)
            .bind(params.offset)
            .fetch_all(pool)
            .await?;

        Ok((rows, total))
    }

    /// Count tickets whose own or customer fields match an `ILIKE` pattern.
    pub async fn count_matching(pool: &PgPool, pattern: &str) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM {JOINED_FROM} WHERE {MATCH_CLAUSE}"
        ))
        .bind(pattern)
        .fetch_one(pool)
        .await
    }

    /// One page of joined ticket rows matching an `ILIKE` pattern, oldest first.
    pub async fn find_matching(
        pool: &PgPool,
        pattern: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<TicketSearchRow>, sqlx::Error> {
        let query = format!(
            "SELECT {JOINED_COLUMNS} FROM {JOINED_FROM} WHERE {MATCH_CLAUSE}
             ORDER BY t.created_at ASC, t.id ASC
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, TicketSearchRow>(&query)
            .bind(pattern)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }
}
