use serde::{Deserialize, Serialize};

pub const MAX_PAGE_SIZE: i64 = 10;

/// A normalized page window. Always satisfies `1 <= limit <= MAX_PAGE_SIZE`,
/// `page >= 1` and `offset == (page - 1) * limit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub limit: i64,
    pub page: i64,
    pub offset: i64,
}

impl Pagination {
    pub fn normalize(requested_limit: i64, requested_page: i64) -> Self {
        let limit = if (1..=MAX_PAGE_SIZE).contains(&requested_limit) {
            requested_limit
        } else {
            MAX_PAGE_SIZE
        };
        let page = requested_page.max(1);
        // saturate so absurd page numbers still yield a valid (empty) window
        let offset = (page - 1).saturating_mul(limit);
        Self {
            limit,
            page,
            offset,
        }
    }

    pub fn total_pages(&self, total: u64) -> u64 {
        total_pages(total, self.limit)
    }
}

/// `ceil(total / limit)`; zero when there is nothing to page through.
pub fn total_pages(total: u64, limit: i64) -> u64 {
    let limit = limit.max(1) as u64;
    total.div_ceil(limit)
}
