use serde::{Deserialize, Serialize};

pub const DEFAULT_PER_PAGE: usize = 12;
pub const MAX_PER_PAGE: usize = 50;
pub const PAGE_WINDOW: usize = 5;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: usize,
    pub per_page: usize,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: 1, per_page: DEFAULT_PER_PAGE }
    }
}

impl PageRequest {
    /// Builds a 1-based request, clamping `per_page` into `1..=MAX_PER_PAGE`.
    pub fn new(page: Option<usize>, per_page: Option<usize>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE),
        }
    }

    pub fn offset(&self) -> usize {
        (self.page - 1).saturating_mul(self.per_page)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub per_page: usize,
    pub total_items: usize,
    pub total_pages: usize,
    pub page_window: Vec<usize>,
}

pub fn paginate<T>(items: Vec<T>, request: PageRequest) -> Page<T> {
    let total_items = items.len();
    let total_pages = total_items.div_ceil(request.per_page);
    let items = items
        .into_iter()
        .skip(request.offset())
        .take(request.per_page)
        .collect();

    Page {
        items,
        page: request.page,
        per_page: request.per_page,
        total_items,
        total_pages,
        page_window: page_window(request.page, total_pages),
    }
}

/// Page numbers shown in the pager: at most five, kept around `current`.
pub fn page_window(current: usize, total_pages: usize) -> Vec<usize> {
    let current = current as i64;
    let total = total_pages as i64;
    let window = PAGE_WINDOW as i64;

    let start = (current - 3).min(total - window).max(0);
    let end = total.min((current + 2).max(window));

    (start..end.max(start)).map(|i| (i + 1) as usize).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paginate_middle_page() {
        let page = paginate((1..=30).collect::<Vec<_>>(), PageRequest::new(Some(2), Some(12)));
        assert_eq!(page.items, (13..=24).collect::<Vec<_>>());
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.total_items, 30);
    }

    #[test]
    fn test_page_past_end_is_empty() {
        let page = paginate(vec![1, 2, 3], PageRequest::new(Some(9), None));
        assert!(page.items.is_empty());
        assert_eq!(page.total_pages, 1);
    }

    #[test]
    fn test_request_clamps() {
        let request = PageRequest::new(Some(0), Some(500));
        assert_eq!(request, PageRequest { page: 1, per_page: MAX_PER_PAGE });
        assert_eq!(PageRequest::new(None, Some(0)).per_page, 1);
    }

    #[test]
    fn test_page_window() {
        assert_eq!(page_window(1, 3), vec![1, 2, 3]);
        assert_eq!(page_window(1, 10), vec![1, 2, 3, 4, 5]);
        assert_eq!(page_window(6, 10), vec![4, 5, 6, 7, 8]);
        assert_eq!(page_window(10, 10), vec![6, 7, 8, 9, 10]);
        assert!(page_window(1, 0).is_empty());
    }
}
