use std::collections::BTreeSet;

use snafu::ResultExt as _;
use tidings_core::AccountId;
use tracing::{debug, instrument};

use crate::error::StoreUnavailableSnafu;
use crate::{FeedResult, FollowEdgeStore, LOG_TARGET, RequestCtx, Stage};

/// Resolves who a viewer follows
#[derive(Debug, Clone)]
pub struct FollowGraphReader<S> {
    store: S,
}

impl<S> FollowGraphReader<S>
where
    S: FollowEdgeStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Accounts `viewer` follows
    ///
    /// Following nobody is an empty set, not an error. Store failures are
    /// reported as-is, without retrying.
    #[instrument(target = "tidings::feed", skip_all)]
    pub async fn followed_ids(
        &self,
        ctx: &RequestCtx,
        viewer: AccountId,
    ) -> FeedResult<BTreeSet<AccountId>> {
        let followed = ctx
            .run(Stage::FollowGraph, async {
                self.store
                    .followed_by(viewer)
                    .await
                    .context(StoreUnavailableSnafu {
                        store: Stage::FollowGraph,
                    })
            })
            .await?;

        let followed: BTreeSet<_> = followed.into_iter().collect();
        debug!(target: LOG_TARGET, %viewer, followed = followed.len(), "Resolved followed set");

        Ok(followed)
    }
}
