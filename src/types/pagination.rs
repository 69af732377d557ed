//! Pagination Convention
//!
//! Query params `page` (default 1, 1-indexed) and `limit` (default 10).
//! List responses wrap their payload as
//! `{data, pagination: {currentPage, totalPages, totalItems, itemsPerPage}}`.

use serde::{Deserialize, Serialize};

/// Query-string pagination parameters.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl PageParams {
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(10).max(1)
    }

    /// Zero-based row offset for the requested page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page() - 1) * u64::from(self.limit())
    }
}

/// Pagination metadata included in every list response.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_items: u64,
    pub items_per_page: u32,
}

impl Pagination {
    /// Compute metadata for a page. An empty result set still reports one
    /// page, never zero.
    pub fn new(page: u32, limit: u32, total_items: u64) -> Self {
        let limit = limit.max(1);
        let total_pages = (total_items.div_ceil(u64::from(limit)) as u32).max(1);
        Self {
            current_page: page.max(1),
            total_pages,
            total_items,
            items_per_page: limit,
        }
    }
}

/// A page of data plus its pagination metadata.
#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, page: u32, limit: u32, total_items: u64) -> Self {
        Self {
            data,
            pagination: Pagination::new(page, limit, total_items),
        }
    }
}
