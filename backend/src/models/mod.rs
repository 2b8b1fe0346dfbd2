//! Data models shared across database access and API handlers.

use serde::Serialize;
use utoipa::ToSchema;

pub const DEFAULT_PAGE_LIMIT: i64 = 10;
pub const MAX_PAGE_LIMIT: i64 = 100;

/// Normalised page request: page starts at 1, limit within 1..=100.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit
                .filter(|limit| *limit > 0)
                .unwrap_or(DEFAULT_PAGE_LIMIT)
                .min(MAX_PAGE_LIMIT),
        }
    }

    /// Rows to skip; saturates for absurdly large page numbers.
    pub fn offset(&self) -> i64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Pagination metadata returned alongside list results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PageInfo {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PageInfo {
    pub fn new(request: PageRequest, total: i64) -> Self {
        let total = total.max(0);
        let total_pages = (total + request.limit - 1) / request.limit;
        Self {
            page: request.page,
            limit: request.limit,
            total,
            total_pages,
            has_next: request.page < total_pages,
            has_prev: request.page > 1,
        }
    }
}

/// Wrapper for paginated API responses.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaginatedResponse<T: Serialize> {
    pub data: Vec<T>,
    pub pagination: PageInfo,
}

impl<T: Serialize> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, request: PageRequest, total: i64) -> Self {
        Self {
            data,
            pagination: PageInfo::new(request, total),
        }
    }
}

/// Raised when a stored enum column holds a value the code does not know.
#[derive(Debug, thiserror::Error)]
#[error("unknown {kind} value: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

pub mod attendance;
pub mod attendance_history;
pub mod department;
pub mod employee;
pub mod report;
pub mod user;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_request_applies_defaults_and_bounds() {
        assert_eq!(PageRequest::new(None, None), PageRequest { page: 1, limit: 10 });
        assert_eq!(PageRequest::new(Some(0), Some(500)), PageRequest { page: 1, limit: 100 });
        assert_eq!(PageRequest::new(Some(3), Some(-4)), PageRequest { page: 3, limit: 10 });
        assert_eq!(PageRequest::new(Some(3), Some(20)).offset(), 40);
    }

    #[test]
    fn huge_page_numbers_saturate_instead_of_overflowing() {
        let request = PageRequest::new(Some(i64::MAX), Some(100));
        assert_eq!(request.offset(), i64::MAX);

        let info = PageInfo::new(request, 5);
        assert_eq!(info.total_pages, 1);
        assert!(!info.has_next);
        assert!(info.has_prev);
    }

    #[test]
    fn page_info_computes_navigation() {
        let info = PageInfo::new(PageRequest::new(Some(2), Some(10)), 25);
        assert_eq!(info.total_pages, 3);
        assert!(info.has_next);
        assert!(info.has_prev);

        let empty = PageInfo::new(PageRequest::default(), 0);
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_next);
        assert!(!empty.has_prev);
    }
}
