//! Axum WebSocket upgrade handler.

use axum::extract::State;
use axum::extract::ws::WebSocketUpgrade;
use axum::http::HeaderMap;
use axum::response::IntoResponse;

use super::connection::serve;
use crate::app_state::AppState;
use crate::domain::UserId;
use crate::error::ApiError;

/// Header carrying the identity verified by the upstream auth layer.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Extracts the user identity from request headers. Missing, blank or
/// non-UTF-8 values yield the anonymous identity.
#[must_use]
pub fn user_from_headers(headers: &HeaderMap) -> UserId {
    headers
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map_or_else(UserId::anonymous, UserId::from)
}

/// `GET /ws` — Upgrade HTTP connection to WebSocket and attach it to the hub.
///
/// # Errors
///
/// Returns [`ApiError::ShuttingDown`] once the hub no longer accepts
/// connections.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    if state.hub.is_shut_down().await {
        return Err(ApiError::ShuttingDown);
    }
    let user_id = user_from_headers(&headers);
    let config = state.connection_config;
    let hub = state.hub.clone();
    let connections = state.connections.clone();

    Ok(ws
        .max_message_size(config.max_message_size)
        .on_upgrade(move |socket| async move {
            connections
                .spawn(serve(hub, user_id, socket, config))
                .await;
        }))
}
