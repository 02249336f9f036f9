use bincode::{Decode, Encode};
use tidings_core::{AccountId, Post, PostId, Timestamp, Visibility};

#[macro_export]
macro_rules! def_table {
    ($(#[$outer:meta])*
        $name:ident : $k:ty => $v:ty) => {
        #[allow(unused)]
        $(#[$outer])*
        pub mod $name {
            use super::*;
            pub type Key = $k;
            pub type Value = $v;
            pub type Definition<'a> = redb_bincode::TableDefinition<'a, Key, Value>;
            pub trait ReadableTable: redb_bincode::ReadableTable<Key, Value> {}
            impl<RT> ReadableTable for RT where RT: redb_bincode::ReadableTable<Key, Value> {}
            pub type Table<'a> = redb_bincode::Table<'a, Key, Value>;
            pub const TABLE: Definition = redb_bincode::TableDefinition::new(stringify!($name));
        }
    };
}

def_table! {
    /// Tracks database/schema version
    db_version: () => u64
}

// FOLLOWS
def_table! {
    /// `(follower, following)`; the table feeds are resolved from
    follows_by_follower: (AccountId, AccountId) => FollowRecord
}
def_table! {
    /// `(following, follower)`; reverse index of [`follows_by_follower`]
    follows_by_following: (AccountId, AccountId) => ()
}

// POSTS
def_table!(posts: PostId => PostRecord);
def_table! {
    /// Published posts only, so a range scan per author yields them in
    /// publication order
    posts_by_author: (AccountId, Timestamp, PostId) => ()
}

#[derive(Debug, Encode, Decode, Clone, Copy, PartialEq, Eq)]
pub struct FollowRecord {
    /// When the edge was stored
    pub ts: Timestamp,
}

#[derive(Debug, Encode, Decode, Clone, PartialEq, Eq)]
pub struct PostRecord {
    pub author_id: AccountId,
    pub published_at: Option<Timestamp>,
    pub deleted_at: Option<Timestamp>,
    pub visibility: Visibility,
    pub body: String,
}

impl PostRecord {
    pub fn into_post(self, id: PostId) -> Post {
        Post {
            id,
            author_id: self.author_id,
            published_at: self.published_at,
            deleted_at: self.deleted_at,
            visibility: self.visibility,
            body: self.body,
        }
    }

    /// Key in [`posts_by_author`], if the post is published at all
    pub fn by_author_key(&self, id: PostId) -> Option<(AccountId, Timestamp, PostId)> {
        self.published_at
            .map(|published_at| (self.author_id, published_at, id))
    }
}

impl From<&Post> for PostRecord {
    fn from(post: &Post) -> Self {
        Self {
            author_id: post.author_id,
            published_at: post.published_at,
            deleted_at: post.deleted_at,
            visibility: post.visibility,
            body: post.body.clone(),
        }
    }
}
