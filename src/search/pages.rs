use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_PAGE_SIZE;

/// Page size and 1-based current page. Derived values are computed on
/// every call and never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSpec {
    page_size: usize,
    current_page: usize,
}

impl Default for PageSpec {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl PageSpec {
    /// A zero page size is bumped to 1.
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            current_page: 1,
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn offset(&self) -> usize {
        (self.current_page - 1) * self.page_size
    }

    pub fn total_pages(&self, estimated_total: usize) -> usize {
        estimated_total.div_ceil(self.page_size)
    }

    /// Move to `page` if it lies within `[1, total_pages]`.
    pub fn go_to(&mut self, page: usize, estimated_total: usize) -> bool {
        if page < 1 || page > self.total_pages(estimated_total) {
            return false;
        }
        self.current_page = page;
        true
    }

    /// Change the page size and go back to the first page.
    pub fn resize(&mut self, page_size: usize) -> bool {
        if page_size == 0 {
            return false;
        }
        self.page_size = page_size;
        self.current_page = 1;
        true
    }

    pub fn rewind(&mut self) {
        self.current_page = 1;
    }
}
