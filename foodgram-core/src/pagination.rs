//! Page-number pagination with `page` and `limit` query parameters.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::PaginationError;

pub const DEFAULT_PAGE_SIZE: i64 = 6;
pub const MAX_PAGE_SIZE: i64 = 100;
pub const PAGE_QUERY_PARAM: &str = "page";

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageRequest {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PageRequest {
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1)
    }

    /// Requested page size. A missing or non-positive `limit` means the
    /// default; anything above [`MAX_PAGE_SIZE`] is capped.
    pub fn limit(&self) -> i64 {
        self.limit
            .filter(|limit| *limit > 0)
            .map_or(DEFAULT_PAGE_SIZE, |limit| limit.min(MAX_PAGE_SIZE))
    }

    pub fn offset(&self) -> i64 {
        (self.page().max(1) - 1) * self.limit()
    }

    /// Reject pages past the end. Page 1 is always valid, even when empty.
    pub fn check(&self, count: i64) -> Result<(), PaginationError> {
        let page = self.page();
        if page < 1 {
            return Err(PaginationError::InvalidPage);
        }
        let last = ((count + self.limit() - 1) / self.limit()).max(1);
        if page > last {
            return Err(PaginationError::InvalidPage);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub count: i64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    /// Build a page; `request_url` is the absolute URL of the current request
    /// and is used to derive the `next`/`previous` links.
    pub fn new(results: Vec<T>, count: i64, request: &PageRequest, request_url: &str) -> Self {
        let page = request.page().max(1);
        let has_next = page * request.limit() < count;

        let next = has_next.then(|| page_url(request_url, Some(page + 1)));
        let previous = match page {
            1 => None,
            2 => Some(page_url(request_url, None)),
            p => Some(page_url(request_url, Some(p - 1))),
        };

        Self {
            count,
            next,
            previous,
            results,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            count: self.count,
            next: self.next,
            previous: self.previous,
            results: self.results.into_iter().map(f).collect(),
        }
    }
}

/// Replace (or, with `None`, remove) the page parameter while keeping every
/// other query parameter in its original order.
fn page_url(request_url: &str, page: Option<i64>) -> String {
    let Ok(url) = Url::parse(request_url) else {
        return request_url.to_string();
    };

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != PAGE_QUERY_PARAM)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    let mut new_url = url.clone();
    new_url.set_query(None);
    if !kept.is_empty() || page.is_some() {
        let mut pairs = new_url.query_pairs_mut();
        for (key, value) in &kept {
            pairs.append_pair(key, value);
        }
        if let Some(page) = page {
            pairs.append_pair(PAGE_QUERY_PARAM, &page.to_string());
        }
    }

    new_url.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(page: Option<i64>, limit: Option<i64>) -> PageRequest {
        PageRequest { page, limit }
    }

    #[test]
    fn test_defaults() {
        let r = PageRequest::default();
        assert_eq!(r.page(), 1);
        assert_eq!(r.limit(), DEFAULT_PAGE_SIZE);
        assert_eq!(r.offset(), 0);
    }

    #[test]
    fn test_offset_and_limit_bounds() {
        assert_eq!(req(Some(3), Some(10)).offset(), 20);
        assert_eq!(req(None, Some(0)).limit(), DEFAULT_PAGE_SIZE);
        assert_eq!(req(None, Some(-4)).limit(), DEFAULT_PAGE_SIZE);
        assert_eq!(req(None, Some(5000)).limit(), MAX_PAGE_SIZE);
    }

    #[test]
    fn test_check_page_range() {
        assert!(req(Some(1), Some(6)).check(0).is_ok());
        assert!(req(Some(2), Some(6)).check(12).is_ok());
        assert_eq!(
            req(Some(3), Some(6)).check(12),
            Err(PaginationError::InvalidPage)
        );
        assert_eq!(
            req(Some(0), Some(6)).check(12),
            Err(PaginationError::InvalidPage)
        );
    }

    #[test]
    fn test_links_on_middle_page() {
        let page = Page::new(
            vec![1, 2],
            6,
            &req(Some(2), Some(2)),
            "http://localhost:3000/api/recipes?limit=2&page=2&author=3",
        );
        assert_eq!(
            page.next.as_deref(),
            Some("http://localhost:3000/api/recipes?limit=2&author=3&page=3")
        );
        assert_eq!(
            page.previous.as_deref(),
            Some("http://localhost:3000/api/recipes?limit=2&author=3")
        );
    }

    #[test]
    fn test_links_on_first_and_last_page() {
        let first = Page::new(vec![1], 3, &req(None, Some(1)), "http://h/api/users");
        assert_eq!(first.next.as_deref(), Some("http://h/api/users?page=2"));
        assert_eq!(first.previous, None);

        let last = Page::new(vec![3], 3, &req(Some(3), Some(1)), "http://h/api/users?page=3");
        assert_eq!(last.next, None);
        assert_eq!(last.previous.as_deref(), Some("http://h/api/users?page=2"));
    }

    #[test]
    fn test_map_keeps_links() {
        let page = Page::new(vec![1, 2], 10, &req(None, Some(2)), "http://h/x").map(|n| n * 10);
        assert_eq!(page.results, vec![10, 20]);
        assert_eq!(page.count, 10);
        assert!(page.next.is_some());
    }
}
