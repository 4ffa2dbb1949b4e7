use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_PER_PAGE, MAX_PER_PAGE};

/// Query parameters shared by paginated listings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub search: Option<String>,
    pub role: Option<String>,
}

impl ListQuery {
    /// Page window with out-of-range values clamped
    pub fn window(&self) -> PageWindow {
        PageWindow::new(
            self.page.unwrap_or(1),
            self.per_page.unwrap_or(DEFAULT_PER_PAGE),
        )
    }

    /// Search term as a LIKE pattern, if a non-blank term was given
    pub fn search_pattern(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: u32,
    pub per_page: u32,
}

impl PageWindow {
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, MAX_PER_PAGE),
        }
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.per_page)
    }
}

/// Pagination envelope returned alongside list results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
    pub total_pages: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl Pagination {
    pub fn new(window: PageWindow, total: i64) -> Self {
        let per_page = i64::from(window.per_page);
        let total_pages = (total + per_page - 1) / per_page;
        Self {
            page: window.page,
            per_page: window.per_page,
            total,
            total_pages,
            has_next: i64::from(window.page) < total_pages,
            has_prev: window.page > 1,
        }
    }
}
