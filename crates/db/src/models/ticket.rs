//! Ticket entity model and DTOs.

use repairdesk_core::pagination::SortOrder;
use repairdesk_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `tickets` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: DbId,
    pub customer_id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    /// Technician email, or `"unassigned"`.
    pub tech: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A ticket joined with the customer it belongs to.
///
/// Returned by ticket search and the ticket list view.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketSearchRow {
    pub id: DbId,
    pub customer_id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub tech: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub city: String,
    pub zip: String,
}

/// DTO for opening a ticket.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTicket {
    pub customer_id: DbId,
    #[validate(length(min = 1, max = 200, message = "Title is required"))]
    pub title: String,
    #[validate(length(max = 5000, message = "Description is too long"))]
    pub description: Option<String>,
    /// Defaults to `"unassigned"`.
    #[validate(length(min = 1, max = 254, message = "Invalid technician"))]
    pub tech: Option<String>,
}

/// DTO for updating a ticket. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTicket {
    #[validate(length(min = 1, max = 200, message = "Title is required"))]
    pub title: Option<String>,
    #[validate(length(max = 5000, message = "Description is too long"))]
    pub description: Option<String>,
    pub completed: Option<bool>,
    #[validate(length(min = 1, max = 254, message = "Invalid technician"))]
    pub tech: Option<String>,
}

/// Sortable columns of the ticket list, keyed by their `sortBy` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TicketSort {
    #[default]
    CreatedAt,
    Title,
    Tech,
    Completed,
    FirstName,
    LastName,
    Email,
}

impl TicketSort {
    /// Parse a `sortBy` value. Unknown columns yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        let sort = match value {
            "createdAt" => Self::CreatedAt,
            "title" => Self::Title,
            "tech" => Self::Tech,
            "completed" => Self::Completed,
            "firstName" => Self::FirstName,
            "lastName" => Self::LastName,
            "email" => Self::Email,
            _ => return None,
        };
        Some(sort)
    }

    /// `ORDER BY` clause over the `t` (tickets) / `c` (customers) aliases.
    pub fn order_by(&self, order: SortOrder) -> String {
        let dir = order.as_sql();
        let column = match self {
            Self::CreatedAt => "t.created_at",
            Self::Title => "t.title",
            Self::Tech => "t.tech",
            Self::Completed => "t.completed",
            Self::FirstName => "c.first_name",
            Self::LastName => "c.last_name",
            Self::Email => "c.email",
        };
        format!("{column} {dir}, t.id {dir}")
    }
}

/// Parameters for a filtered, sorted page of tickets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketListQuery {
    /// `ILIKE` pattern (already wrapped in `%`), or `None` for no text filter.
    pub pattern: Option<String>,
    pub completed: Option<bool>,
    pub tech: Option<String>,
    pub sort: TicketSort,
    pub order: SortOrder,
    pub limit: i64,
    pub offset: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticket_sort_qualifies_columns() {
        assert_eq!(
            TicketSort::LastName.order_by(SortOrder::Desc),
            "c.last_name DESC, t.id DESC"
        );
        assert_eq!(
            TicketSort::default().order_by(SortOrder::Asc),
            "t.created_at ASC, t.id ASC"
        );
    }

    #[test]
    fn unknown_sort_is_rejected() {
        assert_eq!(TicketSort::parse("customer_id"), None);
    }

    #[test]
    fn blank_title_fails_validation() {
        let input = CreateTicket {
            customer_id: 1,
            title: String::new(),
            description: None,
            tech: None,
        };
        assert!(input.validate().is_err());
    }
}
