//! Repository for the `customers` table.

use repairdesk_core::types::DbId;
use sqlx::PgPool;

use crate::models::customer::{CreateCustomer, Customer, CustomerListQuery, UpdateCustomer};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, first_name, last_name, email, phone, address1, address2, \
     city, state, zip, notes, active, created_at, updated_at";

/// Substring match over every searchable customer field. `$1` is the `ILIKE` pattern.
pub(crate) const MATCH_CLAUSE: &str = "(first_name ILIKE $1 \
     OR last_name ILIKE $1 \
     OR (first_name || ' ' || last_name) ILIKE $1 \
     OR email ILIKE $1 \
     OR phone ILIKE $1)";

/// Provides CRUD, listing and match queries for customers.
pub struct CustomerRepo;

impl CustomerRepo {
    /// Insert a new customer, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateCustomer) -> Result<Customer, sqlx::Error> {
        let query = format!(
            "INSERT INTO customers
                (first_name, last_name, email, phone, address1, address2, city, state, zip, notes)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Customer>(&query)
            .bind(&input.first_name)
            .bind(&input.last_name)
            .bind(&input.email)
            .bind(&input.phone)
            .bind(&input.address1)
            .bind(&input.address2)
            .bind(&input.city)
            .bind(&input.state)
            .bind(&input.zip)
            .bind(&input.notes)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Customer>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM customers WHERE id = $1");
        sqlx::query_as::<_, Customer>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Update a customer. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateCustomer,
    ) -> Result<Option<Customer>, sqlx::Error> {
        let query = format!(
            "UPDATE customers SET
                first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                email = COALESCE($4, email),
                phone = COALESCE($5, phone),
                address1 = COALESCE($6, address1),
                address2 = COALESCE($7, address2),
                city = COALESCE($8, city),
                state = COALESCE($9, state),
                zip = COALESCE($10, zip),
                notes = COALESCE($11, notes),
                active = COALESCE($12, active)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Customer>(&query)
            .bind(id)
            .bind(&input.first_name)
            .bind(&input.last_name)
            .bind(&input.email)
            .bind(&input.phone)
            .bind(&input.address1)
            .bind(&input.address2)
            .bind(&input.city)
            .bind(&input.state)
            .bind(&input.zip)
            .bind(&input.notes)
            .bind(input.active)
            .fetch_optional(pool)
            .await
    }

    /// One page of customers plus the total row count for the same filters.
    pub async fn list_page(
        pool: &PgPool,
        params: &CustomerListQuery,
    ) -> Result<(Vec<Customer>, i64), sqlx::Error> {
        let filter = format!(
            "($1::TEXT IS NULL OR {MATCH_CLAUSE}) AND ($2::BOOLEAN IS NULL OR active = $2)"
        );

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM customers WHERE {filter}"
        ))
        .bind(&params.pattern)
        .bind(params.active)
        .fetch_one(pool)
        .await?;

        let query = format!(
            "SELECT {COLUMNS} FROM customers WHERE {filter} ORDER BY {} LIMIT $3 OFFSET $4",
            params.sort.order_by(params.order)
        );
        let rows = sqlx::query_as::<_, Customer>(&query)
            .bind(&params.pattern)
            .bind(params.active)
            .bind(params.limit)
            .bind(params.offset)
            .fetch_all(pool)
            .await?;

        Ok((rows, total))
    }

    /// Count customers matching an `ILIKE` pattern.
    pub async fn count_matching(pool: &PgPool, pattern: &str) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM customers WHERE {MATCH_CLAUSE}"
        ))
        .bind(pattern)
        .fetch_one(pool)
        .await
    }

    /// One page of customers matching an `ILIKE` pattern, by first then last name.
    pub async fn find_matching(
        pool: &PgPool,
        pattern: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Customer>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM customers WHERE {MATCH_CLAUSE}
             ORDER BY first_name ASC, last_name ASC, id ASC
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, Customer>(&query)
            .bind(pattern)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }
}
