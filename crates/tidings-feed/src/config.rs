use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use snafu::{Snafu, ensure};
use tidings_core::{PageLimits, PageRequest};

/// What to do with page parameters outside the allowed range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PagePolicy {
    /// Fail with `InvalidPageRequest`
    #[default]
    Reject,
    /// Silently pull them back into range
    Clamp,
}

impl fmt::Display for PagePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PagePolicy::Reject => "reject",
            PagePolicy::Clamp => "clamp",
        })
    }
}

impl FromStr for PagePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reject" => Ok(PagePolicy::Reject),
            "clamp" => Ok(PagePolicy::Clamp),
            other => Err(format!("Unknown page policy: {other}")),
        }
    }
}

/// A [`FeedConfig`] that would turn requests without page parameters away
#[derive(Debug, Snafu, PartialEq, Eq)]
#[snafu(visibility(pub))]
pub enum FeedConfigError {
    #[snafu(display("max page size must be at least 1"))]
    MaxPageSizeZero,
    #[snafu(display("default page size must be between 1 and {max_page_size}, got {default_page_size}"))]
    DefaultPageSizeOutOfRange {
        default_page_size: u64,
        max_page_size: u64,
    },
}

#[derive(Debug, Clone, bon::Builder)]
pub struct FeedConfig {
    /// `pageSize` used when the caller doesn't send one
    #[builder(default = FeedConfig::DEFAULT_PAGE_SIZE)]
    pub default_page_size: u64,
    #[builder(default = PageLimits::DEFAULT_MAX_PAGE_SIZE)]
    pub max_page_size: u64,
    #[builder(default)]
    pub page_policy: PagePolicy,
    /// Upper bound on a whole request, both store reads included
    pub request_timeout: Option<Duration>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl FeedConfig {
    pub const DEFAULT_PAGE_SIZE: u64 = 10;

    /// Check that the defaults fit within the limits
    pub fn validate(&self) -> Result<(), FeedConfigError> {
        ensure!(1 <= self.max_page_size, MaxPageSizeZeroSnafu);
        ensure!(
            1 <= self.default_page_size && self.default_page_size <= self.max_page_size,
            DefaultPageSizeOutOfRangeSnafu {
                default_page_size: self.default_page_size,
                max_page_size: self.max_page_size,
            }
        );
        Ok(())
    }

    pub fn page_limits(&self) -> PageLimits {
        PageLimits::new(self.max_page_size)
    }

    /// Fill in whatever the caller left out
    pub fn page_request(&self, page: Option<i64>, page_size: Option<i64>) -> PageRequest {
        PageRequest::builder()
            .maybe_page(page)
            .page_size(page_size.unwrap_or_else(|| self.default_page_size_i64()))
            .build()
    }

    pub(crate) fn default_page_request(&self) -> PageRequest {
        self.page_request(None, None)
    }

    fn default_page_size_i64(&self) -> i64 {
        i64::try_from(self.default_page_size).unwrap_or(i64::MAX)
    }
}
