use serde::{Deserialize, Serialize};
use tidings_core::{FollowEdge, Post};

/// Bulk data to seed a database with
///
/// ```json
/// { "follows": [{ "followerId": "...", "followingId": "..." }],
///   "posts": [{ "id": "...", "authorId": "...", "publishedAt": "2024-01-01T00:00:00Z",
///               "deletedAt": null, "visibility": "public" }] }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fixture {
    #[serde(default)]
    pub follows: Vec<FollowEdge>,
    #[serde(default)]
    pub posts: Vec<Post>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    /// New edges only; already existing ones are not counted
    pub follows: u64,
    pub posts: u64,
}
