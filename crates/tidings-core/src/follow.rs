use crate::AccountId;

/// `follower_id` receives posts authored by `following_id` in its feed
///
/// Directed; uniqueness per pair and any "no self-follow" rule belong to
/// whatever maintains the graph.
#[cfg_attr(feature = "bincode", derive(::bincode::Encode, ::bincode::Decode))]
#[cfg_attr(
    feature = "serde",
    derive(::serde::Serialize, ::serde::Deserialize),
    serde(rename_all = "camelCase")
)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FollowEdge {
    pub follower_id: AccountId,
    pub following_id: AccountId,
}

impl FollowEdge {
    pub fn new(follower_id: AccountId, following_id: AccountId) -> Self {
        Self {
            follower_id,
            following_id,
        }
    }
}
