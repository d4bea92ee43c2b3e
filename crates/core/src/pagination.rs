//! URL-derived pagination, sort and filter state.
//!
//! The query string is the only place list-view state lives. Every read
//! re-derives a [`PaginationState`] from it, and every change produces a new
//! canonical query string; nothing is mutated in place.
//!
//! Canonical form omits default values: `page=1`, the default page size, an
//! empty search, and unset sort keys never appear in the output.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use crate::search::{self, DEFAULT_PAGE, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

pub const PAGE_KEY: &str = "page";
pub const PAGE_SIZE_KEY: &str = "pageSize";
pub const SEARCH_KEY: &str = "search";
pub const SORT_BY_KEY: &str = "sortBy";
pub const SORT_ORDER_KEY: &str = "sortOrder";

/// Query-string keys that are never treated as filters.
pub const RESERVED_KEYS: [&str; 5] = [PAGE_KEY, PAGE_SIZE_KEY, SEARCH_KEY, SORT_BY_KEY, SORT_ORDER_KEY];

/// Default width of the page-number window.
pub const DEFAULT_SHOW_PAGE_RANGE: i64 = 5;

pub fn is_reserved_key(key: &str) -> bool {
    RESERVED_KEYS.contains(&key)
}

/// Per-view pagination settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationConfig {
    pub default_page_size: i64,
    pub max_page_size: i64,
    pub show_page_range: i64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
            show_page_range: DEFAULT_SHOW_PAGE_RANGE,
        }
    }
}

impl PaginationConfig {
    fn clamp_page_size(&self, page_size: i64) -> i64 {
        page_size.clamp(1, self.max_page_size.max(1))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }

    /// Parse `asc`/`desc` (any casing). Anything else is `None`.
    pub fn parse(value: &str) -> Option<Self> {
        if value.eq_ignore_ascii_case("asc") {
            Some(SortOrder::Asc)
        } else if value.eq_ignore_ascii_case("desc") {
            Some(SortOrder::Desc)
        } else {
            None
        }
    }

    /// SQL keyword for an `ORDER BY` clause.
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// A single change to apply to a [`PaginationState`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaginationUpdate {
    Page(i64),
    /// Resets the page to 1.
    PageSize(i64),
    /// Resets the page to 1.
    Search(String),
    Sort {
        sort_by: Option<String>,
        sort_order: Option<SortOrder>,
    },
    /// Set (`Some`) or remove (`None`) one filter. Resets the page to 1.
    Filter { key: String, value: Option<String> },
    /// Remove every filter. Resets the page to 1.
    ClearFilters,
}

/// List-view state derived from a query string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationState {
    pub page: i64,
    pub page_size: i64,
    pub search: String,
    pub sort_by: Option<String>,
    pub sort_order: Option<SortOrder>,
    pub filters: BTreeMap<String, String>,
}

impl PaginationState {
    /// The state of a URL with no query string.
    pub fn defaults(config: &PaginationConfig) -> Self {
        Self {
            page: DEFAULT_PAGE,
            page_size: config.default_page_size,
            search: String::new(),
            sort_by: None,
            sort_order: None,
            filters: BTreeMap::new(),
        }
    }

    /// Derive the state from a query string (a leading `?` is allowed).
    ///
    /// Unparseable numbers fall back to their defaults; values are clamped
    /// into range. Repeated keys resolve last-write-wins.
    pub fn from_query(query: &str, config: &PaginationConfig) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut state = Self::defaults(config);

        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                PAGE_KEY => {
                    state.page = value.trim().parse::<i64>().unwrap_or(DEFAULT_PAGE).max(1);
                }
                PAGE_SIZE_KEY => {
                    let size = value
                        .trim()
                        .parse::<i64>()
                        .unwrap_or(config.default_page_size);
                    state.page_size = config.clamp_page_size(size);
                }
                SEARCH_KEY => state.search = value.into_owned(),
                SORT_BY_KEY => {
                    state.sort_by = Some(value.into_owned()).filter(|v| !v.is_empty());
                }
                SORT_ORDER_KEY => state.sort_order = SortOrder::parse(&value),
                _ => {
                    if value.is_empty() {
                        state.filters.remove(key.as_ref());
                    } else {
                        state.filters.insert(key.to_string(), value.into_owned());
                    }
                }
            }
        }

        state
    }

    /// Canonical query string (no leading `?`), empty when everything is default.
    pub fn to_query(&self, config: &PaginationConfig) -> String {
        let mut out = form_urlencoded::Serializer::new(String::new());

        if self.page > DEFAULT_PAGE {
            out.append_pair(PAGE_KEY, &self.page.to_string());
        }
        if self.page_size != config.default_page_size {
            out.append_pair(PAGE_SIZE_KEY, &self.page_size.to_string());
        }
        if !self.search.trim().is_empty() {
            out.append_pair(SEARCH_KEY, &self.search);
        }
        if let Some(sort_by) = &self.sort_by {
            out.append_pair(SORT_BY_KEY, sort_by);
        }
        if let Some(order) = self.sort_order {
            out.append_pair(SORT_ORDER_KEY, order.as_str());
        }
        for (key, value) in &self.filters {
            out.append_pair(key, value);
        }

        out.finish()
    }

    /// New state with `update` applied. `self` is left untouched.
    pub fn apply(&self, update: PaginationUpdate, config: &PaginationConfig) -> Self {
        let mut next = self.clone();
        match update {
            PaginationUpdate::Page(page) => next.page = page.max(1),
            PaginationUpdate::PageSize(size) => {
                next.page_size = config.clamp_page_size(size);
                next.page = DEFAULT_PAGE;
            }
            PaginationUpdate::Search(search) => {
                next.search = search;
                next.page = DEFAULT_PAGE;
            }
            PaginationUpdate::Sort {
                sort_by,
                sort_order,
            } => {
                next.sort_by = sort_by.filter(|s| !s.is_empty());
                next.sort_order = sort_order;
            }
            PaginationUpdate::Filter { key, value } => {
                if !is_reserved_key(&key) {
                    match value.filter(|v| !v.is_empty()) {
                        Some(value) => {
                            next.filters.insert(key, value);
                        }
                        None => {
                            next.filters.remove(&key);
                        }
                    }
                    next.page = DEFAULT_PAGE;
                }
            }
            PaginationUpdate::ClearFilters => {
                next.filters.clear();
                next.page = DEFAULT_PAGE;
            }
        }
        next
    }

    /// Apply `updates` in order and return the canonical query string.
    pub fn build_query(
        &self,
        updates: impl IntoIterator<Item = PaginationUpdate>,
        config: &PaginationConfig,
    ) -> String {
        updates
            .into_iter()
            .fold(self.clone(), |state, update| state.apply(update, config))
            .to_query(config)
    }

    /// Row offset of the current page.
    pub fn offset(&self) -> i64 {
        search::page_offset(self.page, self.page_size)
    }

    pub fn filter(&self, key: &str) -> Option<&str> {
        self.filters.get(key).map(String::as_str)
    }

    /// Page-number window around the current page.
    pub fn page_range(&self, total_pages: i64, config: &PaginationConfig) -> Vec<i64> {
        page_range(self.page, total_pages, config.show_page_range)
    }
}

/// Join a path and a query string, dropping the `?` for an empty query.
pub fn with_query(path: &str, query: &str) -> String {
    if query.is_empty() {
        path.to_string()
    } else {
        format!("{path}?{query}")
    }
}

/// A contiguous run of page numbers of width `show`, centred on `current`.
///
/// The run is shifted (not truncated) at either end so it stays `show`
/// wide; it is shorter only when `total_pages < show`.
///
/// ```
/// use repairdesk_core::pagination::page_range;
///
/// assert_eq!(page_range(1, 10, 5), vec![1, 2, 3, 4, 5]);
/// assert_eq!(page_range(6, 10, 5), vec![4, 5, 6, 7, 8]);
/// assert_eq!(page_range(10, 10, 5), vec![6, 7, 8, 9, 10]);
/// ```
pub fn page_range(current: i64, total_pages: i64, show: i64) -> Vec<i64> {
    if total_pages <= 0 || show <= 0 {
        return Vec::new();
    }

    let width = show.min(total_pages);
    let current = current.clamp(1, total_pages);

    let mut start = (current - show / 2).max(1);
    let mut end = start + width - 1;
    if end > total_pages {
        end = total_pages;
        start = (end - width + 1).max(1);
    }

    (start..=end).collect()
}
