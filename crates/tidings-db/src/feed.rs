use async_trait::async_trait;
use itertools::Itertools as _;
use snafu::ResultExt as _;
use tidings_core::{AccountId, Post, PostId, Timestamp};
use tidings_feed::{ContentQuery, ContentStore, FollowEdgeStore, StoreResult};
use tracing::trace;

use crate::{Database, DbResult, LOG_TARGET, posts, posts_by_author};

impl Database {
    /// One page of posts for a feed over `query.authors`
    ///
    /// Walks every author's slice of [`posts_by_author`] backwards from
    /// `query.now` and merges them, so only the posts up to the end of the
    /// requested page are ever read.
    pub async fn query_feed(&self, query: &ContentQuery) -> DbResult<Vec<Post>> {
        self.read_with(|tx| {
            let posts_table = tx.open_table(&posts::TABLE)?;
            let by_author = tx.open_table(&posts_by_author::TABLE)?;
            Self::query_feed_tx(query, &posts_table, &by_author)
        })
        .await
    }

    pub fn query_feed_tx(
        query: &ContentQuery,
        posts_table: &impl posts::ReadableTable,
        by_author: &impl posts_by_author::ReadableTable,
    ) -> DbResult<Vec<Post>> {
        let filter = query.filter();

        let per_author = query
            .authors
            .iter()
            .map(|&author| {
                Ok(by_author
                    .range(
                        (author, Timestamp::ZERO, PostId::ZERO)..=(author, query.now, PostId::MAX),
                    )?
                    .rev()
                    .map_ok(|(k, _)| {
                        let (_, published_at, post_id) = k.value();
                        (published_at, post_id)
                    }))
            })
            .collect::<DbResult<Vec<_>>>()?;

        // Newest first, ties by id descending; errors surface immediately
        let merged = per_author.into_iter().kmerge_by(|a, b| match (a, b) {
            (Ok(a), Ok(b)) => b < a,
            (Err(_), _) => true,
            (Ok(_), Err(_)) => false,
        });

        let mut skip = query.offset;
        let mut ret = vec![];
        for entry in merged {
            if u64::try_from(ret.len()).unwrap_or(u64::MAX) >= query.limit {
                break;
            }
            let (_, post_id) = entry?;

            let Some(record) = posts_table.get(&post_id)?.map(|g| g.value()) else {
                trace!(target: LOG_TARGET, %post_id, "Dangling author index entry");
                continue;
            };
            let post = record.into_post(post_id);
            if !filter.matches(&post) {
                continue;
            }

            if 0 < skip {
                skip -= 1;
                continue;
            }
            ret.push(post);
        }

        Ok(ret)
    }
}

#[async_trait]
impl FollowEdgeStore for Database {
    async fn followed_by(&self, follower: AccountId) -> StoreResult<Vec<AccountId>> {
        self.followees(follower).await.boxed()
    }
}

#[async_trait]
impl ContentStore for Database {
    async fn query_feed(&self, query: &ContentQuery) -> StoreResult<Vec<Post>> {
        Database::query_feed(self, query).await.boxed()
    }
}
