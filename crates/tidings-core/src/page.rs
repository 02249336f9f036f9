use snafu::{OptionExt as _, Snafu};

/// Page parameters as the caller sent them
///
/// Not validated. Signed, so that `page=0` and negative values arrive here
/// and get rejected by [`PageRequest::validate`] instead of failing to
/// parse somewhere upstream.
#[cfg_attr(
    feature = "serde",
    derive(::serde::Serialize, ::serde::Deserialize),
    serde(rename_all = "camelCase")
)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, bon::Builder)]
pub struct PageRequest {
    #[builder(default = PageRequest::DEFAULT_PAGE)]
    pub page: i64,
    #[builder(default = PageRequest::DEFAULT_PAGE_SIZE)]
    pub page_size: i64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: Self::DEFAULT_PAGE,
            page_size: Self::DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub max_page_size: u64,
}

impl PageLimits {
    pub const DEFAULT_MAX_PAGE_SIZE: u64 = 100;

    pub fn new(max_page_size: u64) -> Self {
        Self { max_page_size }
    }
}

impl Default for PageLimits {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_PAGE_SIZE)
    }
}

#[derive(Debug, Snafu, PartialEq, Eq)]
#[snafu(visibility(pub))]
pub enum PageRequestError {
    #[snafu(display("page must be at least 1, got {page}"))]
    PageTooLow { page: i64 },
    #[snafu(display("pageSize must be at least 1, got {page_size}"))]
    PageSizeTooLow { page_size: i64 },
    #[snafu(display("pageSize must be at most {max}, got {page_size}"))]
    PageSizeTooHigh { page_size: i64, max: u64 },
    #[snafu(display("page {page} with pageSize {page_size} is out of range"))]
    OffsetOverflow { page: u64, page_size: u64 },
}

/// A validated [`PageRequest`]
///
/// `page >= 1`, `1 <= page_size <= max_page_size` and the offset fits in a
/// `u64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    page: u64,
    page_size: u64,
    offset: u64,
}

impl PageRequest {
    pub const DEFAULT_PAGE: i64 = 1;
    pub const DEFAULT_PAGE_SIZE: i64 = 10;

    pub fn new(page: i64, page_size: i64) -> Self {
        Self { page, page_size }
    }

    /// Reject anything out of bounds
    pub fn validate(self, limits: PageLimits) -> Result<PageWindow, PageRequestError> {
        let page = u64::try_from(self.page)
            .ok()
            .filter(|page| 1 <= *page)
            .context(PageTooLowSnafu { page: self.page })?;
        let page_size = u64::try_from(self.page_size)
            .ok()
            .filter(|page_size| 1 <= *page_size)
            .context(PageSizeTooLowSnafu {
                page_size: self.page_size,
            })?;

        if limits.max_page_size < page_size {
            return PageSizeTooHighSnafu {
                page_size: self.page_size,
                max: limits.max_page_size,
            }
            .fail();
        }

        PageWindow::new(page, page_size)
    }

    /// Pull out of bounds values back into range
    ///
    /// Can still fail if the resulting offset doesn't fit.
    pub fn clamp(self, limits: PageLimits) -> Result<PageWindow, PageRequestError> {
        let max_page_size = limits.max_page_size.max(1);

        let page = u64::try_from(self.page).unwrap_or_default().max(1);
        let page_size = u64::try_from(self.page_size)
            .unwrap_or_default()
            .clamp(1, max_page_size);

        PageWindow::new(page, page_size)
    }
}

impl PageWindow {
    fn new(page: u64, page_size: u64) -> Result<Self, PageRequestError> {
        let offset = (page - 1)
            .checked_mul(page_size)
            .context(OffsetOverflowSnafu { page, page_size })?;

        Ok(Self {
            page,
            page_size,
            offset,
        })
    }

    pub fn page(self) -> u64 {
        self.page
    }

    pub fn page_size(self) -> u64 {
        self.page_size
    }

    /// Number of feed entries before this page: `(page - 1) * page_size`
    pub fn offset(self) -> u64 {
        self.offset
    }

    pub fn limit(self) -> u64 {
        self.page_size
    }
}
