//! Embedded `redb` storage for follow edges and posts.
//!
//! [`Database`] implements both [`tidings_feed::FollowEdgeStore`] and
//! [`tidings_feed::ContentStore`], so a single file backs the whole feed.

mod feed;
mod fixture;
mod migration_ops;
mod tables;
mod tx_ops;

use std::path::{Path, PathBuf};
use std::{io, result};

use redb_bincode::{ReadTransaction, WriteTransaction};
use snafu::{Location, ResultExt as _, Snafu};
use tidings_core::{AccountId, FollowEdge, Post, PostId, Timestamp};
use tidings_util_error::BoxedError;
use tokio::task::JoinError;
use tracing::{debug, info, instrument};

pub use self::fixture::{Fixture, ImportSummary};
pub use self::tables::*;

const LOG_TARGET: &str = "tidings::db";

#[derive(Debug, Snafu)]
pub enum DbError {
    Database {
        source: redb::DatabaseError,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(transparent)]
    Table {
        source: redb::TableError,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(transparent)]
    Storage {
        source: redb::StorageError,
        #[snafu(implicit)]
        location: Location,
    },
    Transaction {
        source: redb::TransactionError,
        #[snafu(implicit)]
        location: Location,
    },
    Commit {
        source: redb::CommitError,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("Database version {db_ver} is newer than supported {code_ver}"))]
    DbVersionTooHigh {
        db_ver: u64,
        code_ver: u64,
        #[snafu(implicit)]
        location: Location,
    },
    Join {
        source: JoinError,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(transparent)]
    DbTxLogic {
        source: BoxedError,
        #[snafu(implicit)]
        location: Location,
    },
}
pub type DbResult<T> = std::result::Result<T, DbError>;

#[derive(Debug)]
pub struct Database {
    inner: redb_bincode::Database,
}

impl Database {
    pub const FILE_NAME: &str = "tidings.redb";

    pub async fn mk_db_path(data_dir: &Path) -> result::Result<PathBuf, io::Error> {
        tokio::fs::create_dir_all(&data_dir).await?;
        Ok(data_dir.join(Self::FILE_NAME))
    }

    #[instrument(skip_all)]
    pub async fn open(path: impl Into<PathBuf>) -> DbResult<Database> {
        let path = path.into();
        debug!(target: LOG_TARGET, path = %path.display(), "Opening database");
        let inner = tokio::task::spawn_blocking(move || redb_bincode::Database::create(path))
            .await
            .context(JoinSnafu)?
            .context(DatabaseSnafu)?;

        Self::write_with_inner(&inner, |tx| {
            Self::init_tables_tx(tx)?;
            Self::handle_db_ver_migrations(tx)?;
            Ok(())
        })
        .await?;

        Ok(Self { inner })
    }

    pub async fn write_with_inner<T>(
        inner: &redb_bincode::Database,
        f: impl FnOnce(&'_ WriteTransaction) -> DbResult<T>,
    ) -> DbResult<T> {
        tokio::task::block_in_place(|| {
            let dbtx = inner.begin_write().context(TransactionSnafu)?;
            let res = f(&dbtx)?;

            dbtx.commit().context(CommitSnafu)?;

            Ok(res)
        })
    }

    pub async fn write_with<T>(
        &self,
        f: impl FnOnce(&'_ WriteTransaction) -> DbResult<T>,
    ) -> DbResult<T> {
        Self::write_with_inner(&self.inner, f).await
    }

    pub async fn read_with_inner<T>(
        inner: &redb_bincode::Database,
        f: impl FnOnce(&'_ ReadTransaction) -> DbResult<T>,
    ) -> DbResult<T> {
        tokio::task::block_in_place(|| {
            let dbtx = inner.begin_read().context(TransactionSnafu)?;

            f(&dbtx)
        })
    }

    pub async fn read_with<T>(
        &self,
        f: impl FnOnce(&'_ ReadTransaction) -> DbResult<T>,
    ) -> DbResult<T> {
        Self::read_with_inner(&self.inner, f).await
    }

    /// Accounts `id` follows
    pub async fn followees(&self, id: AccountId) -> DbResult<Vec<AccountId>> {
        self.read_with(|tx| {
            let follows_table = tx.open_table(&follows_by_follower::TABLE)?;
            Ok(Self::read_followees_tx(id, &follows_table)?
                .into_iter()
                .map(|(id, _)| id)
                .collect())
        })
        .await
    }

    /// Accounts following `id`
    pub async fn followers(&self, id: AccountId) -> DbResult<Vec<AccountId>> {
        self.read_with(|tx| {
            let followers_table = tx.open_table(&follows_by_following::TABLE)?;
            Self::read_followers_tx(id, &followers_table)
        })
        .await
    }

    /// Returns `false` if the edge already existed
    pub async fn insert_follow(&self, edge: FollowEdge, ts: Timestamp) -> DbResult<bool> {
        let FollowEdge {
            follower_id: follower,
            following_id: following,
        } = edge;
        let inserted = self
            .write_with(|tx| {
                let mut by_follower = tx.open_table(&follows_by_follower::TABLE)?;
                let mut by_following = tx.open_table(&follows_by_following::TABLE)?;
                Self::insert_follow_tx(
                    follower,
                    following,
                    ts,
                    &mut by_follower,
                    &mut by_following,
                )
            })
            .await?;
        debug!(target: LOG_TARGET, %follower, %following, inserted, "Insert follow");
        Ok(inserted)
    }

    /// Returns `false` if there was no such edge
    pub async fn remove_follow(&self, edge: FollowEdge) -> DbResult<bool> {
        let FollowEdge {
            follower_id: follower,
            following_id: following,
        } = edge;
        let removed = self
            .write_with(|tx| {
                let mut by_follower = tx.open_table(&follows_by_follower::TABLE)?;
                let mut by_following = tx.open_table(&follows_by_following::TABLE)?;
                Self::remove_follow_tx(follower, following, &mut by_follower, &mut by_following)
            })
            .await?;
        debug!(target: LOG_TARGET, %follower, %following, removed, "Remove follow");
        Ok(removed)
    }

    /// Insert or replace a post
    ///
    /// Replacing keeps the author index in sync, so re-publishing or
    /// unpublishing moves the post accordingly.
    pub async fn insert_post(&self, post: &Post) -> DbResult<()> {
        self.write_with(|tx| {
            let mut posts_table = tx.open_table(&posts::TABLE)?;
            let mut by_author = tx.open_table(&posts_by_author::TABLE)?;
            Self::insert_post_tx(post, &mut posts_table, &mut by_author)
        })
        .await?;
        debug!(target: LOG_TARGET, post_id = %post.id, author_id = %post.author_id, "Insert post");
        Ok(())
    }

    pub async fn get_post(&self, id: PostId) -> DbResult<Option<Post>> {
        self.read_with(|tx| {
            let posts_table = tx.open_table(&posts::TABLE)?;
            Self::get_post_tx(id, &posts_table)
        })
        .await
    }

    /// All posts of `author`, drafts included, newest first
    pub async fn posts_of(&self, author: AccountId) -> DbResult<Vec<Post>> {
        self.read_with(|tx| {
            let posts_table = tx.open_table(&posts::TABLE)?;
            Self::read_posts_of_tx(author, &posts_table)
        })
        .await
    }

    /// Load a [`Fixture`] in a single transaction
    #[instrument(skip_all)]
    pub async fn import(&self, fixture: &Fixture, ts: Timestamp) -> DbResult<ImportSummary> {
        let summary = self
            .write_with(|tx| {
                let mut by_follower = tx.open_table(&follows_by_follower::TABLE)?;
                let mut by_following = tx.open_table(&follows_by_following::TABLE)?;
                let mut posts_table = tx.open_table(&posts::TABLE)?;
                let mut by_author = tx.open_table(&posts_by_author::TABLE)?;

                let mut summary = ImportSummary::default();
                for edge in &fixture.follows {
                    if Self::insert_follow_tx(
                        edge.follower_id,
                        edge.following_id,
                        ts,
                        &mut by_follower,
                        &mut by_following,
                    )? {
                        summary.follows += 1;
                    }
                }
                for post in &fixture.posts {
                    Self::insert_post_tx(post, &mut posts_table, &mut by_author)?;
                    summary.posts += 1;
                }
                Ok(summary)
            })
            .await?;
        info!(
            target: LOG_TARGET,
            follows = summary.follows,
            posts = summary.posts,
            "Imported fixture"
        );
        Ok(summary)
    }
}
