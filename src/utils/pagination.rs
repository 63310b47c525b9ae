use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 50;

/// Page parameters as submitted by the caller, clamped to sane bounds.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PageParams {
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.limit()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageMetadata {
    pub total_items: i64,
    pub total_pages: i64,
    pub current_page: i64,
    pub limit: i64,
    pub has_next_page: bool,
    pub has_previous_page: bool,
    pub next_page: Option<i64>,
    pub prev_page: Option<i64>,
}

pub fn paginate(total_items: i64, page: i64, limit: i64) -> PageMetadata {
    let total_pages = (total_items + limit - 1) / limit;

    PageMetadata {
        total_items,
        total_pages,
        current_page: page,
        limit,
        has_next_page: page < total_pages,
        has_previous_page: page > 1,
        next_page: if page < total_pages { Some(page + 1) } else { None },
        prev_page: if page > 1 { Some(page - 1) } else { None },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_clamp_to_bounds() {
        let params = PageParams {
            page: Some(0),
            limit: Some(500),
        };
        assert_eq!(params.page(), 1);
        assert_eq!(params.limit(), MAX_PAGE_SIZE);
        assert_eq!(params.offset(), 0);

        let defaults = PageParams {
            page: None,
            limit: None,
        };
        assert_eq!(defaults.page(), 1);
        assert_eq!(defaults.limit(), DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn metadata_marks_edges() {
        let first = paginate(25, 1, 10);
        assert_eq!(first.total_pages, 3);
        assert!(first.has_next_page);
        assert!(!first.has_previous_page);
        assert_eq!(first.next_page, Some(2));
        assert_eq!(first.prev_page, None);

        let last = paginate(25, 3, 10);
        assert!(!last.has_next_page);
        assert_eq!(last.prev_page, Some(2));

        let empty = paginate(0, 1, 10);
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_next_page);
    }
}
