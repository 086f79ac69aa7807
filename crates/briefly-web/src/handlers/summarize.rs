use axum::Json;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use std::sync::Arc;

use briefly_core::SummarizeError;

use crate::models::SummarizeResponse;
use crate::state::AppState;
use crate::upload;

/// `POST /summarize`: run one request through the worker pool.
///
/// Every pipeline outcome (including warnings and extraction errors) is a
/// 200 with the rendered message; only an unreadable form (400) or a full
/// queue (503) change the status code.
pub async fn summarize(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> (StatusCode, Json<SummarizeResponse>) {
    let input = match upload::parse_multipart(multipart).await {
        Ok(input) => input,
        Err(e) => {
            tracing::debug!(error = %e, "rejected malformed form");
            return (
                StatusCode::BAD_REQUEST,
                Json(SummarizeResponse::bad_request(&e)),
            );
        }
    };

    let result = state.pool.run(input).await;
    let status = match &result {
        Err(SummarizeError::Busy) => {
            tracing::warn!(queued = state.pool.queued(), "summary queue full, rejecting request");
            StatusCode::SERVICE_UNAVAILABLE
        }
        _ => StatusCode::OK,
    };

    (status, Json(SummarizeResponse::from_result(result)))
}
