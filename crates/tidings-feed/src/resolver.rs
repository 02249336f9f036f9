use std::sync::Arc;

use snafu::ResultExt as _;
use tidings_core::{AccountId, FeedPage, PageRequest, PageWindow, Post, feed_order};
use tracing::{debug, instrument, warn};

use crate::error::{
    IneligiblePostSnafu, InvalidPageRequestSnafu, StoreUnavailableSnafu, TooManyPostsSnafu,
};
use crate::{
    Clock, ContentQuery, ContentStore, FeedConfig, FeedResult, FollowEdgeStore,
    FollowGraphReader, LOG_TARGET, PagePolicy, RequestCtx, Stage, StoreContractError,
    SystemClock,
};

/// Resolver over type-erased stores, for callers that don't want to carry
/// the store types around
pub type DynFeedResolver =
    FeedResolver<Arc<dyn FollowEdgeStore>, Arc<dyn ContentStore>, Arc<dyn Clock>>;

/// Turns a viewer and a page request into a [`FeedPage`]
///
/// Stateless between calls: every call reads the follow graph and then the
/// content store, nothing is cached.
#[derive(Debug, Clone)]
pub struct FeedResolver<G, C, K = SystemClock> {
    graph: FollowGraphReader<G>,
    content: C,
    clock: K,
    config: FeedConfig,
}

impl<G, C, K> FeedResolver<G, C, K>
where
    G: FollowEdgeStore,
    C: ContentStore,
    K: Clock,
{
    pub fn new(graph: FollowGraphReader<G>, content: C, clock: K, config: FeedConfig) -> Self {
        Self {
            graph,
            content,
            clock,
            config,
        }
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    /// Resolve one page of `viewer`'s feed
    ///
    /// `None` means "first page, default size". All-or-nothing: any failure
    /// fails the whole call.
    #[instrument(target = "tidings::feed", skip_all)]
    pub async fn resolve_page(
        &self,
        ctx: &RequestCtx,
        viewer: AccountId,
        request: Option<PageRequest>,
    ) -> FeedResult<FeedPage> {
        let window = self.page_window(request)?;

        let followed = self.graph.followed_ids(ctx, viewer).await?;
        if followed.is_empty() {
            debug!(target: LOG_TARGET, %viewer, "Viewer follows nobody, empty feed");
            return Ok(FeedPage::empty(window));
        }

        let query = ContentQuery::new(followed, self.clock.now(), window);

        let mut posts = ctx
            .run(Stage::Content, async {
                self.content
                    .query_feed(&query)
                    .await
                    .context(StoreUnavailableSnafu {
                        store: Stage::Content,
                    })
            })
            .await?;

        Self::check_store_answer(&query, &mut posts)
            .inspect_err(|err| {
                warn!(target: LOG_TARGET, %viewer, %err, "Content store broke its contract");
            })
            .boxed()
            .context(StoreUnavailableSnafu {
                store: Stage::Content,
            })?;

        debug!(
            target: LOG_TARGET,
            %viewer,
            page = window.page(),
            page_size = window.page_size(),
            posts = posts.len(),
            "Resolved feed page"
        );

        Ok(FeedPage::new(posts, window))
    }

    fn page_window(&self, request: Option<PageRequest>) -> FeedResult<PageWindow> {
        let request = request.unwrap_or_else(|| self.config.default_page_request());
        let limits = self.config.page_limits();

        match self.config.page_policy {
            PagePolicy::Reject => request.validate(limits),
            PagePolicy::Clamp => request.clamp(limits),
        }
        .context(InvalidPageRequestSnafu)
    }

    /// The store does the heavy lifting; we still make sure what comes back
    /// is a valid feed page
    fn check_store_answer(
        query: &ContentQuery,
        posts: &mut [Post],
    ) -> Result<(), StoreContractError> {
        if u64::try_from(posts.len()).unwrap_or(u64::MAX) > query.limit {
            return TooManyPostsSnafu {
                returned: posts.len(),
                limit: query.limit,
            }
            .fail();
        }

        let filter = query.filter();
        if let Some(post) = posts.iter().find(|post| !filter.matches(post)) {
            return IneligiblePostSnafu { post_id: post.id }.fail();
        }

        posts.sort_by(feed_order);

        Ok(())
    }
}
