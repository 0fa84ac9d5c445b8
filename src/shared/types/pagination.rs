/// Paginated response wrapper
#[derive(Debug)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
}

impl<T> PaginatedResult<T> {
    pub fn new(items: Vec<T>, total: u64, page: u32, limit: u32) -> Self {
        let total_pages = ((total as f64) / (limit.max(1) as f64)).ceil() as u32;
        Self {
            items,
            total,
            page,
            limit,
            total_pages,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PaginatedResult<U> {
        PaginatedResult {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            limit: self.limit,
            total_pages: self.total_pages,
        }
    }
}

/// Slice an already-filtered list into one page (used by the in-memory store).
pub fn paginate_vec<T>(items: Vec<T>, page: u32, limit: u32) -> PaginatedResult<T> {
    let total = items.len() as u64;
    let offset = ((page.max(1) - 1) * limit) as usize;
    let page_items = items.into_iter().skip(offset).take(limit as usize).collect();
    PaginatedResult::new(page_items, total, page, limit)
}
