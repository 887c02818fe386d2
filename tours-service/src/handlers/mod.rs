//! HTTP handlers.

pub mod applications;
pub mod audit;
pub mod auth;
pub mod clients;
pub mod content;
pub mod dashboard;
pub mod products;
pub mod users;

use serde::{Deserialize, Serialize};

fn default_page() -> i64 {
    1
}

fn default_per_page() -> i64 {
    20
}

/// `?page=&per_page=` query params shared by the list endpoints.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_per_page")]
    pub per_page: i64,
}

impl PageQuery {
    /// Clamp to sane bounds and convert to (limit, offset).
    pub fn limit_offset(&self) -> (i64, i64) {
        let per_page = self.per_page.clamp(1, 100);
        let page = self.page.max(1);
        (per_page, (page - 1) * per_page)
    }
}

/// Pagination envelope returned alongside list results.
#[derive(Debug, Serialize)]
pub struct Pagination {
    pub page: i64,
    pub pages: i64,
    pub per_page: i64,
    pub total: i64,
}

impl Pagination {
    pub fn new(query: &PageQuery, total: i64) -> Self {
        let per_page = query.per_page.clamp(1, 100);
        let page = query.page.max(1);
        let pages = if total == 0 {
            0
        } else {
            (total + per_page - 1) / per_page
        };
        Self {
            page,
            pages,
            per_page,
            total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_query_clamps() {
        let q = PageQuery {
            page: 0,
            per_page: 10_000,
        };
        assert_eq!(q.limit_offset(), (100, 0));

        let q = PageQuery {
            page: 3,
            per_page: 20,
        };
        assert_eq!(q.limit_offset(), (20, 40));
    }

    #[test]
    fn pagination_counts_pages() {
        let q = PageQuery {
            page: 1,
            per_page: 20,
        };
        assert_eq!(Pagination::new(&q, 0).pages, 0);
        assert_eq!(Pagination::new(&q, 20).pages, 1);
        assert_eq!(Pagination::new(&q, 21).pages, 2);
    }
}
