//! Feed resolution: from a viewer to a page of posts by accounts it follows.
//!
//! [`FollowGraphReader`] reads the viewer's followed set, [`FeedResolver`]
//! turns it into a filtered, newest-first [`tidings_core::FeedPage`]. Both
//! talk to storage only through the traits in [`store`], so they can run on
//! top of `tidings-db` or any fake.

mod clock;
mod config;
mod ctx;
mod error;
mod graph;
mod resolver;
pub mod store;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::config::{FeedConfig, FeedConfigError, PagePolicy};
pub use self::ctx::{RequestCtx, Stage};
pub use self::error::{FeedError, FeedResult, StoreContractError};
pub use self::graph::FollowGraphReader;
pub use self::resolver::{DynFeedResolver, FeedResolver};
pub use self::store::{ContentQuery, ContentStore, FollowEdgeStore, StoreResult};

const LOG_TARGET: &str = "tidings::feed";

#[cfg(test)]
mod tests;
