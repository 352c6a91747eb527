//! Pagination helper types for repository queries

use serde::{Deserialize, Serialize};

/// Pagination request parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Current page number (1-indexed)
    pub page: u32,
    /// Number of items per page
    pub page_size: u32,
}

impl PageRequest {
    /// Create a new page request
    ///
    /// # Examples
    ///
    /// ```
    /// use core_library::repositories::PageRequest;
    ///
    /// let request = PageRequest::new(1, 20);
    /// assert_eq!(request.page, 1);
    /// assert_eq!(request.page_size, 20);
    /// ```
    pub fn new(page: u32, page_size: u32) -> Self {
        Self { page, page_size }
    }

    /// False for page 0 or page size 0; such requests always yield no items.
    pub fn is_valid(&self) -> bool {
        self.page >= 1 && self.page_size >= 1
    }

    /// Number of items to skip, `(page - 1) * page_size`
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.page_size)
    }

    /// Get the LIMIT value (same as page_size)
    pub fn limit(&self) -> u64 {
        u64::from(self.page_size)
    }

    /// Clamp the page size to `max`.
    pub fn clamped(self, max: u32) -> Self {
        Self {
            page: self.page,
            page_size: self.page_size.min(max),
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 25,
        }
    }
}

/// One page of an ordered result set plus count metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagedResult<T> {
    /// Items in the current page, at most `page_size`
    pub items: Vec<T>,
    /// Current page number (1-indexed)
    pub page: u32,
    /// Requested number of items per page
    pub page_size: u32,
    /// Total number of items across all pages
    pub total_count: u64,
}

impl<T> PagedResult<T> {
    /// Create a new paginated response
    ///
    /// # Examples
    ///
    /// ```
    /// use core_library::repositories::{PagedResult, PageRequest};
    ///
    /// let page = PagedResult::new(vec![1, 2, 3], 25, PageRequest::new(1, 10));
    ///
    /// assert_eq!(page.items.len(), 3);
    /// assert_eq!(page.total_count, 25);
    /// assert_eq!(page.total_pages(), 3);
    /// assert!(page.has_next_page());
    /// assert!(!page.has_previous_page());
    /// ```
    pub fn new(items: Vec<T>, total_count: u64, request: PageRequest) -> Self {
        Self {
            items,
            page: request.page,
            page_size: request.page_size,
            total_count,
        }
    }

    /// True when a non-empty page follows this one
    pub fn has_next_page(&self) -> bool {
        u64::from(self.page) * u64::from(self.page_size) < self.total_count
    }

    /// True for every page after the first
    pub fn has_previous_page(&self) -> bool {
        self.page > 1
    }

    /// Total number of pages
    pub fn total_pages(&self) -> u64 {
        if self.page_size == 0 {
            return 0;
        }
        self.total_count.div_ceil(u64::from(self.page_size))
    }

    /// Map the items to a different type
    pub fn map<U, F>(self, f: F) -> PagedResult<U>
    where
        F: FnMut(T) -> U,
    {
        PagedResult {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            page_size: self.page_size,
            total_count: self.total_count,
        }
    }
}
