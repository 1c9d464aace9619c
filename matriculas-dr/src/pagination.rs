//! Pagination for dataset browsing

/// Records per page in dataset views
pub const PAGE_SIZE: usize = 10;

/// Pagination metadata calculated from total results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Current page number (1-indexed)
    pub page: usize,
    pub total_pages: usize,
    /// Index of the first record on the page
    pub offset: usize,
}

impl Pagination {
    /// The records of this page
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let start = self.offset.min(items.len());
        let end = (start + PAGE_SIZE).min(items.len());
        &items[start..end]
    }
}

/// Clamp the requested page into `[1, total_pages]`
///
/// # Examples
/// ```
/// use matriculas_dr::pagination::calculate_pagination;
///
/// // 25 results = 3 pages (10 + 10 + 5)
/// let p = calculate_pagination(25, 2);
/// assert_eq!(p.total_pages, 3);
/// assert_eq!(p.offset, 10);
///
/// let p = calculate_pagination(25, 99);
/// assert_eq!(p.page, 3);
/// ```
pub fn calculate_pagination(total_results: usize, requested_page: usize) -> Pagination {
    let total_pages = total_results.div_ceil(PAGE_SIZE);
    let page = requested_page.max(1).min(total_pages.max(1));
    let offset = (page - 1) * PAGE_SIZE;

    Pagination {
        page,
        total_pages,
        offset,
    }
}
