//! Page arithmetic for the store listing.

pub const PAGE_SIZE: i64 = 4;

/// A resolved 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
}

impl PageRequest {
    /// Missing or non-positive page numbers mean the first page.
    pub fn new(page: Option<i64>) -> Self {
        Self {
            page: page.filter(|p| *p >= 1).unwrap_or(1),
        }
    }

    pub fn skip(&self) -> i64 {
        self.page.saturating_sub(1).saturating_mul(PAGE_SIZE)
    }

    pub fn limit(&self) -> i64 {
        PAGE_SIZE
    }
}

/// Total number of pages needed for `count` stores.
pub fn page_count(count: i64) -> i64 {
    if count <= 0 {
        0
    } else {
        (count + PAGE_SIZE - 1) / PAGE_SIZE
    }
}

/// What the listing handler should do with a fetched page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    Show { page: i64, pages: i64 },
    /// The page was past the end; send the caller to the last one instead.
    RedirectTo { page: i64 },
}

pub fn resolve_page(request: PageRequest, returned: usize, count: i64) -> PageOutcome {
    let pages = page_count(count);
    if returned == 0 && request.skip() > 0 {
        PageOutcome::RedirectTo { page: pages.max(1) }
    } else {
        PageOutcome::Show {
            page: request.page,
            pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ten_stores_make_three_pages() {
        assert_eq!(page_count(10), 3);
        assert_eq!(page_count(8), 2);
        assert_eq!(page_count(1), 1);
        assert_eq!(page_count(0), 0);
    }

    #[test]
    fn skip_follows_page_number() {
        assert_eq!(PageRequest::new(None).skip(), 0);
        assert_eq!(PageRequest::new(Some(0)).page, 1);
        assert_eq!(PageRequest::new(Some(-3)).page, 1);
        assert_eq!(PageRequest::new(Some(3)).skip(), 8);
    }

    #[test]
    fn past_the_end_redirects_to_last_page() {
        let outcome = resolve_page(PageRequest::new(Some(5)), 0, 10);
        assert_eq!(outcome, PageOutcome::RedirectTo { page: 3 });
    }

    #[test]
    fn empty_first_page_is_shown() {
        let outcome = resolve_page(PageRequest::new(Some(1)), 0, 0);
        assert_eq!(outcome, PageOutcome::Show { page: 1, pages: 0 });
    }

    #[test]
    fn past_the_end_with_no_stores_goes_to_page_one() {
        let outcome = resolve_page(PageRequest::new(Some(2)), 0, 0);
        assert_eq!(outcome, PageOutcome::RedirectTo { page: 1 });
    }
}
