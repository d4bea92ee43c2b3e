//! Customer entity model and DTOs.

use repairdesk_core::pagination::SortOrder;
use repairdesk_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `customers` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: DbId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address1: String,
    pub address2: Option<String>,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub notes: Option<String>,
    pub active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Customer {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// DTO for creating a customer.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomer {
    #[validate(length(min = 1, max = 100, message = "First name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100, message = "Last name is required"))]
    pub last_name: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 7, max = 20, message = "Invalid phone number"))]
    pub phone: String,
    #[validate(length(min = 1, max = 250, message = "Address is required"))]
    pub address1: String,
    pub address2: Option<String>,
    #[validate(length(min = 1, max = 100, message = "City is required"))]
    pub city: String,
    #[validate(length(equal = 2, message = "State must be exactly 2 characters"))]
    pub state: String,
    #[validate(length(min = 5, max = 10, message = "Invalid zip code"))]
    pub zip: String,
    pub notes: Option<String>,
}

/// DTO for updating a customer. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCustomer {
    #[validate(length(min = 1, max = 100, message = "First name is required"))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 100, message = "Last name is required"))]
    pub last_name: Option<String>,
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    #[validate(length(min = 7, max = 20, message = "Invalid phone number"))]
    pub phone: Option<String>,
    #[validate(length(min = 1, max = 250, message = "Address is required"))]
    pub address1: Option<String>,
    pub address2: Option<String>,
    #[validate(length(min = 1, max = 100, message = "City is required"))]
    pub city: Option<String>,
    #[validate(length(equal = 2, message = "State must be exactly 2 characters"))]
    pub state: Option<String>,
    #[validate(length(min = 5, max = 10, message = "Invalid zip code"))]
    pub zip: Option<String>,
    pub notes: Option<String>,
    /// Only managers may set this to `false`.
    pub active: Option<bool>,
}

/// Sortable columns of the customer list, keyed by their `sortBy` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CustomerSort {
    #[default]
    Name,
    FirstName,
    LastName,
    Email,
    Phone,
    City,
    Zip,
    CreatedAt,
}

impl CustomerSort {
    /// Parse a `sortBy` value. Unknown columns yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        let sort = match value {
            "name" => Self::Name,
            "firstName" => Self::FirstName,
            "lastName" => Self::LastName,
            "email" => Self::Email,
            "phone" => Self::Phone,
            "city" => Self::City,
            "zip" => Self::Zip,
            "createdAt" => Self::CreatedAt,
            _ => return None,
        };
        Some(sort)
    }

    /// `ORDER BY` clause for this column; `id` breaks ties.
    pub fn order_by(&self, order: SortOrder) -> String {
        let dir = order.as_sql();
        match self {
            Self::Name => format!("first_name {dir}, last_name {dir}, id {dir}"),
            Self::FirstName => format!("first_name {dir}, id {dir}"),
            Self::LastName => format!("last_name {dir}, id {dir}"),
            Self::Email => format!("email {dir}, id {dir}"),
            Self::Phone => format!("phone {dir}, id {dir}"),
            Self::City => format!("city {dir}, id {dir}"),
            Self::Zip => format!("zip {dir}, id {dir}"),
            Self::CreatedAt => format!("created_at {dir}, id {dir}"),
        }
    }
}

/// Parameters for a filtered, sorted page of customers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerListQuery {
    /// `ILIKE` pattern (already wrapped in `%`), or `None` for no text filter.
    pub pattern: Option<String>,
    pub active: Option<bool>,
    pub sort: CustomerSort,
    pub order: SortOrder,
    pub limit: i64,
    pub offset: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_parse_known_and_unknown() {
        assert_eq!(CustomerSort::parse("lastName"), Some(CustomerSort::LastName));
        assert_eq!(CustomerSort::parse("password"), None);
        assert_eq!(CustomerSort::parse("first_name; DROP TABLE"), None);
    }

    #[test]
    fn default_sort_is_first_then_last_name() {
        assert_eq!(
            CustomerSort::default().order_by(SortOrder::Asc),
            "first_name ASC, last_name ASC, id ASC"
        );
    }

    #[test]
    fn create_dto_validation() {
        let mut input = CreateCustomer {
            first_name: "Jane".into(),
            last_name: "Doe".into(),
            email: "jane@x.com".into(),
            phone: "555-0100".into(),
            address1: "1 Main St".into(),
            address2: None,
            city: "Springfield".into(),
            state: "IL".into(),
            zip: "62701".into(),
            notes: None,
        };
        assert!(input.validate().is_ok());

        input.email = "not-an-email".into();
        input.state = "Illinois".into();
        let errors = input.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("state"));
    }
}
