//! Page/limit parameters shared by list queries.

/// Page returned when the request does not ask for one.
pub const DEFAULT_PAGE: usize = 1;
/// Items per page when the request does not set `limit`.
pub const DEFAULT_ITEMS_PER_PAGE: usize = 100;
/// Largest `limit` a caller may request.
pub const MAX_ITEMS_PER_PAGE: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// One-based page number.
    pub page: usize,
    pub per_page: usize,
}

impl Pagination {
    pub const fn new(page: usize, per_page: usize) -> Self {
        Self { page, per_page }
    }

    /// Number of rows to skip before this page starts.
    pub const fn offset(&self) -> usize {
        self.page.saturating_sub(1).saturating_mul(self.per_page)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE, DEFAULT_ITEMS_PER_PAGE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_first_page_of_one_hundred() {
        let pagination = Pagination::default();
        assert_eq!(pagination.page, 1);
        assert_eq!(pagination.per_page, 100);
        assert_eq!(pagination.offset(), 0);
    }

    #[test]
    fn offset_skips_previous_pages() {
        assert_eq!(Pagination::new(2, 3).offset(), 3);
        assert_eq!(Pagination::new(5, 3).offset(), 12);
    }

    #[test]
    fn offset_saturates_instead_of_overflowing() {
        assert_eq!(Pagination::new(usize::MAX, 500).offset(), usize::MAX);
    }
}
