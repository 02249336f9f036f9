use axum::extract::rejection::QueryRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use snafu::Snafu;
use tidings_feed::FeedError;
use tidings_util_error::FmtCompact as _;
use tracing::{debug, warn};

use crate::LOG_TARGET;
use crate::routes::{AppJson, VIEWER_HEADER};

/// Returned for every failure that isn't the caller's fault
pub const FEED_ERROR_MESSAGE: &str = "An error occurred while fetching the feed.";

// How error responses are serialized
#[derive(Serialize)]
pub struct ApiErrorResponse {
    pub error: String,
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ApiError {
    #[snafu(display("Missing required header: {VIEWER_HEADER}"))]
    MissingViewer,
    #[snafu(display("Invalid account id in {VIEWER_HEADER} header"))]
    InvalidViewer,
    #[snafu(transparent)]
    InvalidQuery { source: QueryRejection },
    Feed { source: FeedError },
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

impl ApiError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            ApiError::MissingViewer => (StatusCode::UNAUTHORIZED, self.to_string()),
            ApiError::InvalidViewer => (StatusCode::BAD_REQUEST, self.to_string()),
            ApiError::InvalidQuery { source } => (StatusCode::BAD_REQUEST, source.body_text()),
            ApiError::Feed { source } => match source {
                FeedError::InvalidPageRequest { source } => {
                    (StatusCode::BAD_REQUEST, source.to_string())
                }
                FeedError::DeadlineExceeded { .. } => (
                    StatusCode::GATEWAY_TIMEOUT,
                    "Timed out while fetching the feed.".to_owned(),
                ),
                FeedError::StoreUnavailable { .. } | FeedError::Cancelled { .. } => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    FEED_ERROR_MESSAGE.to_owned(),
                ),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status_code, error) = self.status_and_message();

        if status_code.is_server_error() {
            warn!(
                target: LOG_TARGET,
                err = %self.fmt_compact(),
                status = %status_code,
                "Feed request failed"
            );
        } else {
            debug!(
                target: LOG_TARGET,
                err = %self.fmt_compact(),
                status = %status_code,
                "Rejected request"
            );
        }

        (status_code, AppJson(ApiErrorResponse { error })).into_response()
    }
}
