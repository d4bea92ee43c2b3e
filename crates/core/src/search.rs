//! Search request/response shapes and pagination arithmetic.
//!
//! Shared by the search query layer (`repairdesk-db`), the search action
//! (`repairdesk-api`) and the debounced client controller
//! (`repairdesk-client`), so the wire contract lives in exactly one place.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

// ---------------------------------------------------------------------------
// Limits
// ---------------------------------------------------------------------------

/// Page used when the caller does not ask for one.
pub const DEFAULT_PAGE: i64 = 1;

/// Rows per page used when the caller does not ask for a size.
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Largest page a caller may request.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Message sent to clients for any failure that is not validation or rate limiting.
pub const SEARCH_FAILED_MESSAGE: &str = "Search failed. Please try again.";

/// User-facing message for a rate-limited search.
pub fn rate_limited_message(retry_after_secs: i64) -> String {
    format!("Too many requests. Please try again in {retry_after_secs} seconds.")
}

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

fn default_page() -> i64 {
    DEFAULT_PAGE
}

fn default_page_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

/// A single search invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 200, message = "Search query is required (max 200 characters)"))]
    pub query: String,

    #[serde(default = "default_page")]
    #[validate(range(min = 1, message = "Page must be at least 1"))]
    pub page: i64,

    #[serde(default = "default_page_size")]
    #[validate(range(min = 1, max = 100, message = "Page size must be between 1 and 100"))]
    pub page_size: i64,
}

impl SearchRequest {
    /// A first-page request with the default page size.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page(mut self, page: i64, page_size: i64) -> Self {
        self.page = page;
        self.page_size = page_size;
        self
    }

    /// Copy of this request with `query` replaced.
    pub fn with_query(&self, query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..self.clone()
        }
    }
}

/// Flatten validator output into `{ field: [messages] }` with camelCase field names.
pub fn field_errors(errors: &ValidationErrors) -> BTreeMap<String, Vec<String>> {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| {
            let messages = errs
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string())
                })
                .collect();
            (snake_to_camel(&field.to_string()), messages)
        })
        .collect()
}

fn snake_to_camel(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = false;
    for c in name.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

/// One page of matches plus the total match count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult<T> {
    pub data: Vec<T>,
    pub total_count: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
}

impl<T> SearchResult<T> {
    pub fn new(data: Vec<T>, total_count: i64, page: i64, page_size: i64) -> Self {
        Self {
            data,
            total_count,
            page,
            page_size,
            total_pages: total_pages(total_count, page_size),
        }
    }

    /// The result for a blank query: no rows, zero counts.
    pub fn empty(page: i64, page_size: i64) -> Self {
        Self {
            data: Vec::new(),
            total_count: 0,
            page,
            page_size,
            total_pages: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// `ceil(total_count / page_size)`; zero for an empty set or a non-positive size.
pub fn total_pages(total_count: i64, page_size: i64) -> i64 {
    if total_count <= 0 || page_size <= 0 {
        return 0;
    }
    (total_count + page_size - 1) / page_size
}

/// Row offset of the first row on `page` (1-based).
pub fn page_offset(page: i64, page_size: i64) -> i64 {
    (page.max(1) - 1).saturating_mul(page_size.max(0))
}

/// Wrap a trimmed query as an `ILIKE` substring pattern.
///
/// `%`, `_` and `\` in the input are escaped so they match literally.
///
/// ```
/// use repairdesk_core::search::like_pattern;
///
/// assert_eq!(like_pattern(" doe "), "%doe%");
/// assert_eq!(like_pattern("50%"), "%50\\%%");
/// ```
pub fn like_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.trim().chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

// ---------------------------------------------------------------------------
// Action envelope
// ---------------------------------------------------------------------------

/// Response envelope of a server action: exactly one field is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResponse<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_errors: Option<BTreeMap<String, Vec<String>>>,
}

impl<T> ActionResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            server_error: None,
            validation_errors: None,
        }
    }

    pub fn server_error(message: impl Into<String>) -> Self {
        Self {
            data: None,
            server_error: Some(message.into()),
            validation_errors: None,
        }
    }

    pub fn validation(errors: BTreeMap<String, Vec<String>>) -> Self {
        Self {
            data: None,
            server_error: None,
            validation_errors: Some(errors),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
