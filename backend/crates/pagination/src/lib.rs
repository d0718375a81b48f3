//! Offset pagination primitives shared by CKS backend endpoints.
//!
//! Listing endpoints accept an optional `limit` and `offset`, normalise them
//! into a [`PageRequest`], and answer with a [`Page`] envelope shaped as
//! `{ items, total, page, pageSize }`. The 1-based page number is derived as
//! `offset / limit + 1`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Page size applied when the caller omits `limit`.
pub const DEFAULT_LIMIT: u32 = 50;

/// Largest page size a caller may request; larger values are clamped.
pub const MAX_LIMIT: u32 = 200;

/// Validation failures raised while building a [`PageRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PageRequestError {
    /// A limit of zero would never return rows.
    #[error("limit must be greater than zero")]
    ZeroLimit,
}

/// Normalised offset pagination parameters.
///
/// # Examples
/// ```
/// use pagination::PageRequest;
///
/// let request = PageRequest::new(Some(25), Some(50)).expect("valid request");
/// assert_eq!(request.limit(), 25);
/// assert_eq!(request.page(), 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    limit: u32,
    offset: u32,
}

impl PageRequest {
    /// Build a request, applying defaults and clamping `limit` to
    /// [`MAX_LIMIT`].
    ///
    /// # Errors
    ///
    /// Returns [`PageRequestError::ZeroLimit`] when `limit` is `Some(0)`.
    pub fn new(limit: Option<u32>, offset: Option<u32>) -> Result<Self, PageRequestError> {
        let limit = limit.unwrap_or(DEFAULT_LIMIT);
        if limit == 0 {
            return Err(PageRequestError::ZeroLimit);
        }
        Ok(Self {
            limit: limit.min(MAX_LIMIT),
            offset: offset.unwrap_or(0),
        })
    }

    /// Maximum number of rows in the page.
    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.limit
    }

    /// Number of rows skipped before the page starts.
    #[must_use]
    pub const fn offset(&self) -> u32 {
        self.offset
    }

    /// 1-based page number derived from the offset.
    #[must_use]
    pub fn page(&self) -> u32 {
        self.offset
            .checked_div(self.limit)
            .unwrap_or(0)
            .saturating_add(1)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

/// Page envelope returned by listing endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Rows in this page.
    pub items: Vec<T>,
    /// Total rows matching the query across all pages.
    pub total: u64,
    /// 1-based page number.
    pub page: u32,
    /// Requested page size.
    pub page_size: u32,
}

impl<T> Page<T> {
    /// Wrap a slice of results with the counters derived from `request`.
    ///
    /// # Examples
    /// ```
    /// use pagination::{Page, PageRequest};
    ///
    /// let page = Page::new(vec!["a", "b"], 12, PageRequest::default());
    /// assert_eq!(page.page, 1);
    /// assert_eq!(page.page_size, 50);
    /// ```
    #[must_use]
    pub fn new(items: Vec<T>, total: u64, request: PageRequest) -> Self {
        Self {
            items,
            total,
            page: request.page(),
            page_size: request.limit(),
        }
    }

    /// Transform every item while keeping the counters.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            page_size: self.page_size,
        }
    }
}
