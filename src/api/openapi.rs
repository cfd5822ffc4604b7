//! OpenAPI document for the REST surface.

use utoipa::OpenApi;

use super::dto::{AnnounceRequest, CreateNotificationRequest, NotificationAcceptedResponse};
use super::handlers;
use crate::domain::Priority;
use crate::error::{ErrorBody, ErrorResponse};
use crate::hub::HubStats;

/// Generated OpenAPI specification.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "notify-hub",
        description = "Real-time notification hub: producer endpoints, hub statistics and health."
    ),
    paths(
        handlers::notification::broadcast_notification,
        handlers::notification::notify_user,
        handlers::hub::hub_stats,
        handlers::hub::announce,
        handlers::system::health_handler,
    ),
    components(schemas(
        CreateNotificationRequest,
        NotificationAcceptedResponse,
        AnnounceRequest,
        Priority,
        HubStats,
        ErrorResponse,
        ErrorBody,
        handlers::system::HealthResponse,
    )),
    tags(
        (name = "Notifications", description = "Fire-and-forget notification delivery"),
        (name = "Hub", description = "Hub statistics and announcements"),
        (name = "System", description = "Service health"),
    )
)]
pub struct ApiDoc;
