use axum::extract::{FromRequestParts, State};
use axum::http::request::Parts;
use serde::Deserialize;
use snafu::ResultExt as _;
use tidings_core::{AccountId, FeedPage};
use tidings_feed::RequestCtx;
use tracing::{debug, instrument};

use super::{AppJson, AppQuery};
use crate::error::{ApiResult, FeedSnafu, InvalidViewerSnafu, MissingViewerSnafu};
use crate::{ApiError, LOG_TARGET, SharedState};

/// Set by the authenticating proxy in front of us
pub const VIEWER_HEADER: &str = "x-tidings-viewer";

/// The authenticated account making the request
pub struct Viewer(pub AccountId);

impl FromRequestParts<SharedState> for Viewer {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(VIEWER_HEADER)
            .ok_or_else(|| MissingViewerSnafu.build())?;
        let id = value
            .to_str()
            .ok()
            .and_then(|s| s.trim().parse::<AccountId>().ok())
            .ok_or_else(|| InvalidViewerSnafu.build())?;
        Ok(Viewer(id))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

#[instrument(target = "tidings::web", skip_all)]
pub async fn get_feed(
    State(state): State<SharedState>,
    Viewer(viewer): Viewer,
    AppQuery(query): AppQuery<FeedQuery>,
) -> ApiResult<AppJson<FeedPage>> {
    let config = state.resolver.config();
    let request = config.page_request(query.page, query.page_size);

    let mut ctx = RequestCtx::new().with_cancel(state.shutdown.clone());
    if let Some(timeout) = config.request_timeout {
        ctx = ctx.with_timeout(timeout);
    }

    let page = state
        .resolver
        .resolve_page(&ctx, viewer, Some(request))
        .await
        .context(FeedSnafu)?;

    debug!(
        target: LOG_TARGET,
        %viewer,
        page = page.page,
        posts = page.posts.len(),
        "Served feed page"
    );
    Ok(AppJson(page))
}
