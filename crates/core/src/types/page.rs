//! Offset pagination shared by list endpoints.

use serde::{Deserialize, Serialize};

/// A validated page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    per_page: u32,
}

impl PageRequest {
    /// Build a request from optional query values.
    ///
    /// `page` defaults to 1 and is raised to at least 1. `per_page` defaults
    /// to `default_per_page` and is clamped to `1..=max_per_page`.
    #[must_use]
    pub fn new(
        page: Option<u32>,
        per_page: Option<u32>,
        default_per_page: u32,
        max_per_page: u32,
    ) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page.unwrap_or(default_per_page).clamp(1, max_per_page.max(1)),
        }
    }

    #[must_use]
    pub const fn page(self) -> u32 {
        self.page
    }

    #[must_use]
    pub const fn per_page(self) -> u32 {
        self.per_page
    }

    /// Row limit for SQL.
    #[must_use]
    pub fn limit(self) -> i64 {
        i64::from(self.per_page)
    }

    /// Row offset for SQL.
    #[must_use]
    pub fn offset(self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.per_page)
    }
}

/// One page of results plus the metadata a client needs to paginate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
    pub total_pages: i64,
}

impl<T> Page<T> {
    #[must_use]
    pub fn new(items: Vec<T>, request: PageRequest, total: i64) -> Self {
        let per_page = i64::from(request.per_page);
        let total = total.max(0);
        Self {
            items,
            page: request.page,
            per_page: request.per_page,
            total,
            total_pages: (total + per_page - 1) / per_page,
        }
    }

    /// Convert the items while keeping the page metadata.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            per_page: self.per_page,
            total: self.total,
            total_pages: self.total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_defaults_and_clamps() {
        let req = PageRequest::new(None, None, 12, 48);
        assert_eq!((req.page(), req.per_page()), (1, 12));

        let req = PageRequest::new(Some(0), Some(500), 12, 48);
        assert_eq!((req.page(), req.per_page()), (1, 48));

        let req = PageRequest::new(Some(3), Some(0), 12, 48);
        assert_eq!(req.per_page(), 1);
        assert_eq!(req.offset(), 2);
    }

    #[test]
    fn test_total_pages_rounds_up() {
        let req = PageRequest::new(Some(2), Some(10), 12, 48);
        assert_eq!(req.offset(), 10);
        let page: Page<u8> = Page::new(Vec::new(), req, 21);
        assert_eq!(page.total_pages, 3);
        let empty: Page<u8> = Page::new(Vec::new(), req, 0);
        assert_eq!(empty.total_pages, 0);
    }
}
