use serde::{Deserialize, Serialize};

/// Page selection as received from a caller. Missing or zero values fall
/// back to the first page and the configured page size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: Option<usize>,
    #[serde(alias = "limit")]
    pub page_size: Option<usize>,
}

impl PageRequest {
    pub fn new(page: usize, page_size: Option<usize>) -> Self {
        Self {
            page: Some(page),
            page_size,
        }
    }

    /// 1-indexed page number, never below 1
    pub fn page_number(&self) -> usize {
        self.page.unwrap_or(1).max(1)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub page_size: usize,
    pub total_count: usize,
    pub total_pages: usize,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            page_size: self.page_size,
            total_count: self.total_count,
            total_pages: self.total_pages,
        }
    }
}

/// Slice `[(page-1)*page_size, page*page_size)` clamped to the list. Pages
/// past the end are empty rather than errors.
pub fn paginate<T: Clone>(items: &[T], page: usize, page_size: usize) -> Page<T> {
    let page = page.max(1);
    let page_size = page_size.max(1);
    let total_count = items.len();
    let total_pages = total_count.div_ceil(page_size);

    let start = (page - 1).saturating_mul(page_size).min(total_count);
    let end = start.saturating_add(page_size).min(total_count);

    Page {
        items: items[start..end].to_vec(),
        page,
        page_size,
        total_count,
        total_pages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paginate_slices_pages() {
        let items: Vec<u32> = (0..13).collect();

        let first = paginate(&items, 1, 10);
        assert_eq!(first.items.len(), 10);
        assert_eq!(first.total_count, 13);
        assert_eq!(first.total_pages, 2);

        let second = paginate(&items, 2, 10);
        assert_eq!(second.items, vec![10, 11, 12]);
    }

    #[test]
    fn test_out_of_range_page_is_empty() {
        let items: Vec<u32> = (0..5).collect();
        let page = paginate(&items, 4, 10);
        assert!(page.items.is_empty());
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.page, 4);

        let huge = paginate(&items, usize::MAX, usize::MAX);
        assert!(huge.items.is_empty());
    }

    #[test]
    fn test_empty_list_has_zero_pages() {
        let page = paginate::<u32>(&[], 1, 10);
        assert!(page.items.is_empty());
        assert_eq!(page.total_pages, 0);
    }

    #[test]
    fn test_page_request_defaults() {
        assert_eq!(PageRequest::default().page_number(), 1);
        assert_eq!(PageRequest::new(0, None).page_number(), 1);
        assert_eq!(PageRequest::new(3, Some(5)).page_number(), 3);
    }
}
