mod feed;

use axum::Router;
use axum::extract::FromRequestParts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;

pub use self::feed::VIEWER_HEADER;
use crate::SharedState;
use crate::error::{ApiError, ApiErrorResponse};

pub struct AppJson<T>(pub T);

impl<T> IntoResponse for AppJson<T>
where
    axum::Json<T>: IntoResponse,
{
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

/// Query string extractor that rejects with a JSON body
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct AppQuery<T>(pub T);

pub async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        AppJson(ApiErrorResponse {
            error: "Not Found".to_owned(),
        }),
    )
}

pub fn route_handler(state: SharedState) -> Router {
    Router::new()
        .route("/api/v1/posts/feed", get(feed::get_feed))
        .fallback(not_found)
        .with_state(state)
}
