//! What the feed needs from storage.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use tidings_core::{AccountId, FeedFilter, PageWindow, Post, Timestamp};
use tidings_util_error::BoxedError;

pub type StoreResult<T> = std::result::Result<T, BoxedError>;

/// Read access to follow edges
#[async_trait]
pub trait FollowEdgeStore: Send + Sync {
    /// `following_id` of every edge whose `follower_id` is `follower`
    ///
    /// No particular order.
    async fn followed_by(&self, follower: AccountId) -> StoreResult<Vec<AccountId>>;
}

/// Read access to posts
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Posts matching [`ContentQuery::filter`], in
    /// [`tidings_core::feed_order`], skipping `offset` and returning at most
    /// `limit` of them
    async fn query_feed(&self, query: &ContentQuery) -> StoreResult<Vec<Post>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentQuery {
    pub authors: BTreeSet<AccountId>,
    /// Publication cutoff; posts scheduled after it are not visible yet
    pub now: Timestamp,
    pub offset: u64,
    pub limit: u64,
}

impl ContentQuery {
    pub fn new(authors: BTreeSet<AccountId>, now: Timestamp, window: PageWindow) -> Self {
        Self {
            authors,
            now,
            offset: window.offset(),
            limit: window.limit(),
        }
    }

    pub fn filter(&self) -> FeedFilter<'_> {
        FeedFilter::new(&self.authors, self.now)
    }
}

#[async_trait]
impl<T> FollowEdgeStore for Arc<T>
where
    T: FollowEdgeStore + ?Sized,
{
    async fn followed_by(&self, follower: AccountId) -> StoreResult<Vec<AccountId>> {
        (**self).followed_by(follower).await
    }
}

#[async_trait]
impl<T> ContentStore for Arc<T>
where
    T: ContentStore + ?Sized,
{
    async fn query_feed(&self, query: &ContentQuery) -> StoreResult<Vec<Post>> {
        (**self).query_feed(query).await
    }
}
