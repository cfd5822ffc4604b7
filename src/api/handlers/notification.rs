//! Producer endpoints: broadcast and targeted notifications.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;

use crate::api::dto::{CreateNotificationRequest, NotificationAcceptedResponse};
use crate::app_state::AppState;
use crate::domain::UserId;
use crate::error::{ApiError, ErrorResponse};
use crate::service::Audience;

/// `POST /notifications/broadcast` — Notify every connected client.
///
/// # Errors
///
/// Returns [`ApiError`] on invalid input or during shutdown.
#[utoipa::path(
    post,
    path = "/api/v1/notifications/broadcast",
    tag = "Notifications",
    summary = "Broadcast a notification",
    description = "Delivers a notification to every live connection. Fire-and-forget: slow clients may be evicted and nothing is queued for offline users.",
    request_body = CreateNotificationRequest,
    responses(
        (status = 202, description = "Notification accepted", body = NotificationAcceptedResponse),
        (status = 400, description = "Invalid notification", body = ErrorResponse),
        (status = 503, description = "Hub is shutting down", body = ErrorResponse),
    )
)]
pub async fn broadcast_notification(
    State(state): State<AppState>,
    Json(req): Json<CreateNotificationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let sent = state
        .notifications
        .notify(Audience::Everyone, req.into())
        .await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(NotificationAcceptedResponse {
            notification_id: sent.id,
            user_id: None,
            accepted_at: Utc::now(),
        }),
    ))
}

/// `POST /notifications/users/{user_id}` — Notify one user's sessions.
///
/// # Errors
///
/// Returns [`ApiError`] on invalid input or during shutdown.
#[utoipa::path(
    post,
    path = "/api/v1/notifications/users/{user_id}",
    tag = "Notifications",
    summary = "Notify a user",
    description = "Delivers a notification to every live connection of the user, in connection order. Accepted even if the user is offline; the notification is then dropped.",
    params(("user_id" = String, Path, description = "Target user identity")),
    request_body = CreateNotificationRequest,
    responses(
        (status = 202, description = "Notification accepted", body = NotificationAcceptedResponse),
        (status = 400, description = "Invalid notification", body = ErrorResponse),
        (status = 503, description = "Hub is shutting down", body = ErrorResponse),
    )
)]
pub async fn notify_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(req): Json<CreateNotificationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = UserId::new(user_id);
    if user_id.is_anonymous() {
        return Err(ApiError::InvalidRequest("user_id must not be empty".to_string()));
    }

    let sent = state
        .notifications
        .notify(Audience::User(user_id.clone()), req.into())
        .await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(NotificationAcceptedResponse {
            notification_id: sent.id,
            user_id: Some(user_id.to_string()),
            accepted_at: Utc::now(),
        }),
    ))
}

/// Notification routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/notifications/broadcast", post(broadcast_notification))
        .route("/notifications/users/{user_id}", post(notify_user))
}
