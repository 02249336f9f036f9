//! Data model of the feed: accounts, follow edges, posts and pagination.
//!
//! Everything here is plain data. Storage (`tidings-db`) and feed resolution
//! (`tidings-feed`) build on these types.

mod feed;
mod follow;
pub mod id;
mod macros;
mod page;
mod post;
mod timestamp;

pub use self::feed::{FeedFilter, FeedPage, feed_order};
pub use self::follow::FollowEdge;
pub use self::id::{AccountId, IdParseError, PostId};
pub use self::page::{
    OffsetOverflowSnafu, PageLimits, PageRequest, PageRequestError, PageSizeTooHighSnafu,
    PageSizeTooLowSnafu, PageTooLowSnafu, PageWindow,
};
pub use self::post::{Post, Visibility, VisibilityParseError};
pub use self::timestamp::{Timestamp, TimestampParseError};
