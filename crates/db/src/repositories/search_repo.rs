//! Paginated substring search (the search query layer).
//!
//! [`SearchRepo::search`] is generic over the row type: it only needs a
//! [`SearchSource`] that can count and fetch rows matching an `ILIKE`
//! pattern. [`CustomerSearch`] and [`TicketSearch`] are the PostgreSQL
//! sources; tests plug in in-memory ones.

use async_trait::async_trait;
use repairdesk_core::search::{like_pattern, page_offset, SearchResult};
use sqlx::PgPool;

use crate::models::customer::Customer;
use crate::models::ticket::TicketSearchRow;
use crate::repositories::{CustomerRepo, TicketRepo};

/// Failure of the search query layer.
///
/// Deliberately opaque: the underlying store error is logged where it
/// happens and never carried to callers.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("Search failed")]
    Failed,
}

/// A store that can match rows of type `T` against an `ILIKE` pattern.
#[async_trait]
pub trait SearchSource<T>: Send + Sync {
    /// Entity name used in log lines.
    fn entity(&self) -> &'static str;

    /// Total number of rows matching `pattern`.
    async fn count_matches(&self, pattern: &str) -> Result<i64, sqlx::Error>;

    /// `limit` matching rows starting at `offset`, in the source's fixed order.
    async fn fetch_matches(
        &self,
        pattern: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<T>, sqlx::Error>;
}

/// Customer search over first name, last name, full name, email and phone.
#[derive(Clone)]
pub struct CustomerSearch {
    pool: PgPool,
}

impl CustomerSearch {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SearchSource<Customer> for CustomerSearch {
    fn entity(&self) -> &'static str {
        "customer"
    }

    async fn count_matches(&self, pattern: &str) -> Result<i64, sqlx::Error> {
        CustomerRepo::count_matching(&self.pool, pattern).await
    }

    async fn fetch_matches(
        &self,
        pattern: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Customer>, sqlx::Error> {
        CustomerRepo::find_matching(&self.pool, pattern, limit, offset).await
    }
}

/// Ticket search over title, description and the owning customer's name and email.
#[derive(Clone)]
pub struct TicketSearch {
    pool: PgPool,
}

impl TicketSearch {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SearchSource<TicketSearchRow> for TicketSearch {
    fn entity(&self) -> &'static str {
        "ticket"
    }

    async fn count_matches(&self, pattern: &str) -> Result<i64, sqlx::Error> {
        TicketRepo::count_matching(&self.pool, pattern).await
    }

    async fn fetch_matches(
        &self,
        pattern: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<TicketSearchRow>, sqlx::Error> {
        TicketRepo::find_matching(&self.pool, pattern, limit, offset).await
    }
}

/// Provides the generic paginated search.
pub struct SearchRepo;

impl SearchRepo {
    /// Run a case-insensitive substring search and return one page of results.
    ///
    /// - A blank query returns an empty result without touching the store.
    /// - The total is counted independently of the page slice.
    /// - Pages past the end come back empty with the real total.
    pub async fn search<T, S>(
        source: &S,
        query: &str,
        page: i64,
        page_size: i64,
    ) -> Result<SearchResult<T>, SearchError>
    where
        T: Send,
        S: SearchSource<T> + ?Sized,
    {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return Ok(SearchResult::empty(page, page_size));
        }

        let pattern = like_pattern(trimmed);
        let entity = source.entity();

        let total_count = source.count_matches(&pattern).await.map_err(|e| {
            tracing::error!(entity, error = %e, "Search count query failed");
            SearchError::Failed
        })?;

        let offset = page_offset(page, page_size);
        let data = if offset >= total_count {
            Vec::new()
        } else {
            source
                .fetch_matches(&pattern, page_size, offset)
                .await
                .map_err(|e| {
                    tracing::error!(entity, error = %e, "Search page query failed");
                    SearchError::Failed
                })?
        };

        tracing::debug!(
            entity,
            total_count,
            page,
            page_size,
            returned = data.len(),
            "Search executed",
        );

        Ok(SearchResult::new(data, total_count, page, page_size))
    }
}
