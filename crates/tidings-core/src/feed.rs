use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::{AccountId, PageWindow, Post, Timestamp};

/// One page of a viewer's feed
///
/// `page`/`page_size` echo the values the page was produced with, after
/// defaults were applied. There's deliberately no total count.
#[cfg_attr(
    feature = "serde",
    derive(::serde::Serialize, ::serde::Deserialize),
    serde(rename_all = "camelCase")
)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedPage {
    pub posts: Vec<Post>,
    pub page: u64,
    pub page_size: u64,
}

impl FeedPage {
    pub fn new(posts: Vec<Post>, window: PageWindow) -> Self {
        Self {
            posts,
            page: window.page(),
            page_size: window.page_size(),
        }
    }

    pub fn empty(window: PageWindow) -> Self {
        Self::new(vec![], window)
    }
}

/// Newest first; equal publication times are broken by `id`, also
/// descending
///
/// Drafts (no `published_at`) sort last, though they never make it into a
/// feed anyway.
pub fn feed_order(a: &Post, b: &Post) -> Ordering {
    b.published_at
        .cmp(&a.published_at)
        .then_with(|| b.id.cmp(&a.id))
}

/// Which posts belong in a feed
#[derive(Debug, Clone, Copy)]
pub struct FeedFilter<'a> {
    pub authors: &'a BTreeSet<AccountId>,
    pub now: Timestamp,
}

impl<'a> FeedFilter<'a> {
    pub fn new(authors: &'a BTreeSet<AccountId>, now: Timestamp) -> Self {
        Self { authors, now }
    }

    pub fn matches(&self, post: &Post) -> bool {
        self.authors.contains(&post.author_id)
            && !post.is_deleted()
            && post.is_published_at(self.now)
            && post.visibility.is_feed_eligible()
    }
}
