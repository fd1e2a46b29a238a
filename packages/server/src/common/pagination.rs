//! Offset pagination for listing and search endpoints
//!
//! Query parameters are parsed leniently: a missing or unparsable `page` or
//! `pageSize` falls back to the default instead of rejecting the request.
//!
//! # Usage
//!
//! ```rust,ignore
//! let page = PageRequest::from_params(params.page.as_deref(), params.page_size.as_deref());
//! let total = matches.len();
//! let data = page.slice(matches);
//! ```

use serde::Serialize;

/// Default number of items per page.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Upper bound on the page size a caller may request.
pub const MAX_PAGE_SIZE: u32 = 100;

/// A validated page request (1-based page number).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    /// Create a page request, clamping page to ≥ 1 and size to 1-100.
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Build from raw query-string values, defaulting anything unusable.
    pub fn from_params(page: Option<&str>, page_size: Option<&str>) -> Self {
        let defaults = Self::default();
        let page = page
            .and_then(|p| p.trim().parse::<u32>().ok())
            .unwrap_or(defaults.page);
        let page_size = page_size
            .and_then(|p| p.trim().parse::<u32>().ok())
            .unwrap_or(defaults.page_size);
        Self::new(page, page_size)
    }

    /// Like [`from_params`](Self::from_params), but `None` when the caller
    /// sent neither parameter, for endpoints where paging is opt-in.
    pub fn from_optional_params(page: Option<&str>, page_size: Option<&str>) -> Option<Self> {
        if page.is_none() && page_size.is_none() {
            return None;
        }
        Some(Self::from_params(page, page_size))
    }

    /// Number of items skipped before this page.
    pub fn offset(&self) -> usize {
        self.page.saturating_sub(1) as usize * self.page_size as usize
    }

    /// Maximum number of items on this page.
    pub fn limit(&self) -> usize {
        self.page_size as usize
    }

    /// Keep only the items belonging to this page.
    pub fn slice<T>(&self, items: Vec<T>) -> Vec<T> {
        items
            .into_iter()
            .skip(self.offset())
            .take(self.limit())
            .collect()
    }
}

/// One page of results plus the total match count before pagination.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub data: Vec<T>,
    pub page: u32,
    pub page_size: u32,
    pub total_count: u64,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, request: PageRequest, total_count: u64) -> Self {
        Self {
            data,
            page: request.page,
            page_size: request.page_size,
            total_count,
        }
    }

    /// Paginate an already filtered, ordered result set.
    pub fn from_matches(matches: Vec<T>, request: PageRequest) -> Self {
        let total_count = matches.len() as u64;
        Self::new(request.slice(matches), request, total_count)
    }
}
