use snafu::Snafu;
use tidings_core::PageRequestError;
use tidings_util_error::BoxedError;

use crate::Stage;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum FeedError {
    #[snafu(display("Invalid page request"))]
    InvalidPageRequest { source: PageRequestError },
    #[snafu(display("The {store} store is unavailable"))]
    StoreUnavailable { store: Stage, source: BoxedError },
    #[snafu(display("Deadline exceeded while reading the {stage}"))]
    DeadlineExceeded { stage: Stage },
    #[snafu(display("Cancelled while reading the {stage}"))]
    Cancelled { stage: Stage },
}

pub type FeedResult<T> = std::result::Result<T, FeedError>;

impl FeedError {
    /// Whether the caller can fix this by changing the request
    pub fn is_caller_error(&self) -> bool {
        matches!(self, FeedError::InvalidPageRequest { .. })
    }
}

/// A store answered with something it was not asked for
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum StoreContractError {
    #[snafu(display("Returned {returned} posts, asked for at most {limit}"))]
    TooManyPosts { returned: usize, limit: u64 },
    #[snafu(display("Returned post {post_id} that does not match the feed filter"))]
    IneligiblePost { post_id: tidings_core::PostId },
}
