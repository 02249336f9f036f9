use redb_bincode::ReadableTable as _;
use tidings_core::{AccountId, Post, PostId, Timestamp, feed_order};

use crate::{
    Database, DbResult, FollowRecord, PostRecord, follows_by_follower, follows_by_following,
    posts, posts_by_author,
};

impl Database {
    pub fn read_followees_tx(
        id: AccountId,
        follows_table: &impl follows_by_follower::ReadableTable,
    ) -> DbResult<Vec<(AccountId, FollowRecord)>> {
        Ok(follows_table
            .range((id, AccountId::ZERO)..=(id, AccountId::MAX))?
            .map(|res| res.map(|(k, v)| (k.value().1, v.value())))
            .collect::<Result<Vec<_>, _>>()?)
    }

    pub fn read_followers_tx(
        id: AccountId,
        followers_table: &impl follows_by_following::ReadableTable,
    ) -> DbResult<Vec<AccountId>> {
        Ok(followers_table
            .range((id, AccountId::ZERO)..=(id, AccountId::MAX))?
            .map(|res| res.map(|(k, _)| k.value().1))
            .collect::<Result<Vec<_>, _>>()?)
    }

    pub(crate) fn insert_follow_tx(
        follower: AccountId,
        following: AccountId,
        ts: Timestamp,
        by_follower: &mut follows_by_follower::Table,
        by_following: &mut follows_by_following::Table,
    ) -> DbResult<bool> {
        if by_follower.get(&(follower, following))?.is_some() {
            return Ok(false);
        }
        by_follower.insert(&(follower, following), &FollowRecord { ts })?;
        by_following.insert(&(following, follower), &())?;
        Ok(true)
    }

    pub(crate) fn remove_follow_tx(
        follower: AccountId,
        following: AccountId,
        by_follower: &mut follows_by_follower::Table,
        by_following: &mut follows_by_following::Table,
    ) -> DbResult<bool> {
        let existed = by_follower.remove(&(follower, following))?.is_some();
        by_following.remove(&(following, follower))?;
        Ok(existed)
    }

    pub(crate) fn insert_post_tx(
        post: &Post,
        posts_table: &mut posts::Table,
        by_author: &mut posts_by_author::Table,
    ) -> DbResult<()> {
        let record = PostRecord::from(post);

        if let Some(prev) = posts_table.insert(&post.id, &record)?.map(|g| g.value()) {
            if let Some(prev_key) = prev.by_author_key(post.id) {
                by_author.remove(&prev_key)?;
            }
        }
        if let Some(key) = record.by_author_key(post.id) {
            by_author.insert(&key, &())?;
        }
        Ok(())
    }

    pub fn get_post_tx(
        id: PostId,
        posts_table: &impl posts::ReadableTable,
    ) -> DbResult<Option<Post>> {
        Ok(posts_table
            .get(&id)?
            .map(|record| record.value().into_post(id)))
    }

    /// Full scan; meant for inspection, not for serving feeds
    pub fn read_posts_of_tx(
        author: AccountId,
        posts_table: &impl posts::ReadableTable,
    ) -> DbResult<Vec<Post>> {
        let mut ret = vec![];
        for entry in posts_table.range(..)? {
            let (k, v) = entry?;
            let record = v.value();
            if record.author_id == author {
                ret.push(record.into_post(k.value()));
            }
        }
        ret.sort_by(feed_order);
        Ok(ret)
    }
}
