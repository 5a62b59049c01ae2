//! Offset pagination shared by all list endpoints.

use serde::{Deserialize, Serialize};

/// Requested page, as received from `?page=&limit=` query parameters.
///
/// Values are clamped rather than rejected: a missing or zero page becomes
/// page 1 and the limit is kept within `1..=MAX_LIMIT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub struct Pagination {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl Pagination {
    pub const DEFAULT_LIMIT: u32 = 12;
    pub const MAX_LIMIT: u32 = 100;

    #[must_use]
    pub const fn new(page: u32, limit: u32) -> Self {
        Self {
            page: Some(page),
            limit: Some(limit),
        }
    }

    /// 1-based page number.
    #[must_use]
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    #[must_use]
    pub fn limit(&self) -> u32 {
        self.limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT)
    }

    /// Number of rows to skip (`OFFSET`).
    #[must_use]
    pub fn offset(&self) -> i64 {
        i64::from(self.page() - 1) * i64::from(self.limit())
    }

    /// Page size as an SQL `LIMIT` value.
    #[must_use]
    pub fn sql_limit(&self) -> i64 {
        i64::from(self.limit())
    }
}

/// Pagination metadata returned alongside a page of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub total_pages: i64,
}

impl PageInfo {
    #[must_use]
    pub fn new(pagination: &Pagination, total: i64) -> Self {
        let limit = i64::from(pagination.limit());
        Self {
            page: pagination.page(),
            limit: pagination.limit(),
            total,
            total_pages: (total.max(0) + limit - 1) / limit,
        }
    }
}

/// A page of items plus its metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub pagination: PageInfo,
}

impl<T> Paginated<T> {
    #[must_use]
    pub fn new(items: Vec<T>, pagination: &Pagination, total: i64) -> Self {
        Self {
            items,
            pagination: PageInfo::new(pagination, total),
        }
    }

    /// Convert every item, keeping the metadata.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            items: self.items.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let p = Pagination::default();
        assert_eq!(p.page(), 1);
        assert_eq!(p.limit(), Pagination::DEFAULT_LIMIT);
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn test_clamping() {
        let p = Pagination::new(0, 0);
        assert_eq!(p.page(), 1);
        assert_eq!(p.limit(), 1);

        let p = Pagination::new(3, 1_000);
        assert_eq!(p.limit(), Pagination::MAX_LIMIT);
        assert_eq!(p.offset(), 200);
    }

    #[test]
    fn test_total_pages_rounds_up() {
        let p = Pagination::new(1, 10);
        assert_eq!(PageInfo::new(&p, 0).total_pages, 0);
        assert_eq!(PageInfo::new(&p, 10).total_pages, 1);
        assert_eq!(PageInfo::new(&p, 11).total_pages, 2);
    }

    #[test]
    fn test_map_keeps_metadata() {
        let page = Paginated::new(vec![1, 2, 3], &Pagination::new(2, 3), 9);
        let mapped = page.map(|n| n * 10);
        assert_eq!(mapped.items, vec![10, 20, 30]);
        assert_eq!(mapped.pagination.page, 2);
        assert_eq!(mapped.pagination.total_pages, 3);
    }
}
