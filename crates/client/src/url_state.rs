//! URL-driven list navigation.
//!
//! [`UrlPaginationController`] keeps no pagination state of its own. Every
//! call re-reads the query string from the [`Navigator`], derives a
//! [`PaginationState`], applies the change and pushes the new canonical
//! URL. Back/forward navigation therefore can never desynchronize it.

use repairdesk_core::pagination::{
    with_query, PaginationConfig, PaginationState, PaginationUpdate, SortOrder,
};

/// Access to the current location and history.
pub trait Navigator {
    /// Current query string, with or without a leading `?`.
    fn current_query(&self) -> String;

    /// Navigate to `url` (`path` or `path?query`).
    fn push(&self, url: String);
}

/// Pagination, search, sort and filter navigation for one list view.
pub struct UrlPaginationController<R> {
    navigator: R,
    path: String,
    config: PaginationConfig,
}

impl<R: Navigator> UrlPaginationController<R> {
    pub fn new(navigator: R, path: impl Into<String>, config: PaginationConfig) -> Self {
        Self {
            navigator,
            path: path.into(),
            config,
        }
    }

    pub fn navigator(&self) -> &R {
        &self.navigator
    }

    /// State derived from the current URL.
    pub fn state(&self) -> PaginationState {
        PaginationState::from_query(&self.navigator.current_query(), &self.config)
    }

    /// URL after applying `updates` to the current state, without navigating.
    pub fn url_for(&self, updates: impl IntoIterator<Item = PaginationUpdate>) -> String {
        let query = self.state().build_query(updates, &self.config);
        with_query(&self.path, &query)
    }

    /// Apply `updates` and push the resulting URL. Returns the pushed URL.
    pub fn navigate(&self, updates: impl IntoIterator<Item = PaginationUpdate>) -> String {
        let url = self.url_for(updates);
        tracing::debug!(url = %url, "List navigation");
        self.navigator.push(url.clone());
        url
    }

    pub fn go_to_page(&self, page: i64) -> String {
        self.navigate([PaginationUpdate::Page(page)])
    }

    pub fn set_page_size(&self, page_size: i64) -> String {
        self.navigate([PaginationUpdate::PageSize(page_size)])
    }

    pub fn set_search(&self, search: impl Into<String>) -> String {
        self.navigate([PaginationUpdate::Search(search.into())])
    }

    pub fn set_sort(&self, sort_by: Option<String>, sort_order: Option<SortOrder>) -> String {
        self.navigate([PaginationUpdate::Sort {
            sort_by,
            sort_order,
        }])
    }

    /// Set a filter, or remove it with `None` or an empty value.
    pub fn set_filter(&self, key: impl Into<String>, value: Option<String>) -> String {
        self.navigate([PaginationUpdate::Filter {
            key: key.into(),
            value,
        }])
    }

    pub fn clear_filters(&self) -> String {
        self.navigate([PaginationUpdate::ClearFilters])
    }

    /// Page numbers to show around the current page.
    pub fn page_range(&self, total_pages: i64) -> Vec<i64> {
        self.state().page_range(total_pages, &self.config)
    }
}
