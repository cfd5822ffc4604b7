//! Hub status and operational announcement endpoints.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::AnnounceRequest;
use crate::app_state::AppState;
use crate::error::{ApiError, ErrorResponse};
use crate::hub::HubStats;

/// `GET /hub/stats` — Live connection statistics.
#[utoipa::path(
    get,
    path = "/api/v1/hub/stats",
    tag = "Hub",
    summary = "Connection statistics",
    description = "Returns total connections, distinct users and per-user connection counts.",
    responses(
        (status = 200, description = "Registry snapshot", body = HubStats),
    )
)]
pub async fn hub_stats(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.hub.stats().await))
}

/// `POST /system/announce` — Broadcast a system envelope.
///
/// # Errors
///
/// Returns [`ApiError`] on an empty message or during shutdown.
#[utoipa::path(
    post,
    path = "/api/v1/system/announce",
    tag = "Hub",
    summary = "Broadcast a system announcement",
    request_body = AnnounceRequest,
    responses(
        (status = 202, description = "Announcement accepted"),
        (status = 400, description = "Invalid announcement", body = ErrorResponse),
        (status = 503, description = "Hub is shutting down", body = ErrorResponse),
    )
)]
pub async fn announce(
    State(state): State<AppState>,
    Json(req): Json<AnnounceRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .notifications
        .announce(req.code, req.message, req.data)
        .await?;
    Ok(StatusCode::ACCEPTED)
}

/// Hub routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/hub/stats", get(hub_stats))
        .route("/system/announce", post(announce))
}
