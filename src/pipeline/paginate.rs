//! Pagination stage - client-side slicing and the server page window

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Pagination block as returned by the data source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    pub page: usize,
    pub limit: usize,
    pub total: usize,
}

impl PageInfo {
    pub fn new(page: usize, limit: usize, total: usize) -> Self {
        Self { page, limit, total }
    }

    /// Number of pages; an empty collection still has one (empty) page
    pub fn total_pages(&self) -> usize {
        total_pages(self.total, self.limit)
    }

    /// Whether `page` is a valid 1-based page index
    pub fn contains(&self, page: usize) -> bool {
        page >= 1 && page <= self.total_pages()
    }
}

/// One page of records with its pagination block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub pagination: PageInfo,
}

/// Errors from page navigation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PageError {
    #[error("Page {requested} is out of range (1..={total_pages})")]
    OutOfRange { requested: usize, total_pages: usize },

    #[error("Page size must be at least 1")]
    ZeroLimit,
}

/// `ceil(total / limit)`, never less than 1
pub fn total_pages(total: usize, limit: usize) -> usize {
    if limit == 0 {
        return 1;
    }
    total.div_ceil(limit).max(1)
}

/// Validate a page request against a collection size
pub fn check_page(page: usize, limit: usize, total: usize) -> Result<(), PageError> {
    if limit == 0 {
        return Err(PageError::ZeroLimit);
    }
    let pages = total_pages(total, limit);
    if page == 0 || page > pages {
        return Err(PageError::OutOfRange {
            requested: page,
            total_pages: pages,
        });
    }
    Ok(())
}

/// Borrow the 1-based `page` of `items`; out-of-range pages yield an empty slice
pub fn paginate<T>(items: &[T], page: usize, limit: usize) -> &[T] {
    if page == 0 || limit == 0 {
        return &[];
    }
    let start = (page - 1).saturating_mul(limit);
    if start >= items.len() {
        return &[];
    }
    let end = start.saturating_add(limit).min(items.len());
    &items[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(0, 10), 1);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
        assert_eq!(total_pages(25, 5), 5);
    }

    #[test]
    fn test_paginate_slices() {
        let items: Vec<u32> = (1..=7).collect();
        assert_eq!(paginate(&items, 1, 3), &[1, 2, 3]);
        assert_eq!(paginate(&items, 3, 3), &[7]);
        assert!(paginate(&items, 4, 3).is_empty());
        assert!(paginate(&items, 0, 3).is_empty());
    }

    #[test]
    fn test_pages_reconstruct_collection() {
        let items: Vec<u32> = (0..23).collect();
        for limit in 1..=25 {
            let pages = total_pages(items.len(), limit);
            let rebuilt: Vec<u32> = (1..=pages)
                .flat_map(|p| paginate(&items, p, limit).iter().copied())
                .collect();
            assert_eq!(rebuilt, items, "limit {}", limit);
        }
    }

    #[test]
    fn test_check_page() {
        assert!(check_page(1, 10, 0).is_ok());
        assert!(check_page(3, 10, 21).is_ok());
        assert_eq!(
            check_page(4, 10, 21),
            Err(PageError::OutOfRange {
                requested: 4,
                total_pages: 3
            })
        );
        assert!(check_page(0, 10, 21).is_err());
        assert_eq!(check_page(1, 0, 5), Err(PageError::ZeroLimit));
    }

    #[test]
    fn test_page_info() {
        let info = PageInfo::new(2, 20, 45);
        assert_eq!(info.total_pages(), 3);
        assert!(info.contains(3));
        assert!(!info.contains(4));
    }
}
