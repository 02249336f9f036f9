use std::fmt;
use std::str::FromStr;

use crate::{AccountId, PostId, Timestamp};

/// Who may see a post
///
/// Only [`Visibility::Private`] keeps a post out of followers' feeds.
#[cfg_attr(feature = "bincode", derive(::bincode::Encode, ::bincode::Decode))]
#[cfg_attr(
    feature = "serde",
    derive(::serde::Serialize, ::serde::Deserialize),
    serde(rename_all = "lowercase")
)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Visibility {
    #[default]
    Public,
    Unlisted,
    Private,
}

impl Visibility {
    pub fn is_feed_eligible(self) -> bool {
        match self {
            Visibility::Public | Visibility::Unlisted => true,
            Visibility::Private => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Unlisted => "unlisted",
            Visibility::Private => "private",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, snafu::Snafu)]
#[snafu(display("Unknown visibility: {input}"))]
pub struct VisibilityParseError {
    input: String,
}

impl FromStr for Visibility {
    type Err = VisibilityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "public" => Visibility::Public,
            "unlisted" => Visibility::Unlisted,
            "private" => Visibility::Private,
            _ => {
                return Err(VisibilityParseError {
                    input: s.to_owned(),
                });
            }
        })
    }
}

/// A post as the feed sees it
///
/// Authored and mutated elsewhere. `published_at == None` is a draft,
/// `deleted_at != None` is a soft-deleted post.
#[cfg_attr(
    feature = "serde",
    derive(::serde::Serialize, ::serde::Deserialize),
    serde(rename_all = "camelCase")
)]
#[derive(Debug, Clone, PartialEq, Eq, bon::Builder)]
pub struct Post {
    pub id: PostId,
    pub author_id: AccountId,
    pub published_at: Option<Timestamp>,
    pub deleted_at: Option<Timestamp>,
    #[builder(default)]
    pub visibility: Visibility,
    #[builder(default, into)]
    #[cfg_attr(feature = "serde", serde(default))]
    pub body: String,
}

impl Post {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Published at or before `now`
    pub fn is_published_at(&self, now: Timestamp) -> bool {
        self.published_at.is_some_and(|published_at| published_at <= now)
    }
}
