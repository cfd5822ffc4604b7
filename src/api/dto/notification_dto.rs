//! Request and response bodies for the notification endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::Priority;
use crate::service::NotificationDraft;

/// Body of `POST /api/v1/notifications/...`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateNotificationRequest {
    /// Free-form category (e.g. `"deployment"`).
    pub category: String,
    /// Priority. Defaults to `normal`.
    #[serde(default)]
    pub priority: Priority,
    /// Short title.
    pub title: String,
    /// Message body.
    #[serde(default)]
    pub message: String,
    /// Optional structured data forwarded verbatim.
    #[serde(default)]
    pub data: Option<serde_json::Value>,
    /// Optional action URL.
    #[serde(default)]
    pub action_url: Option<String>,
    /// Optional action label.
    #[serde(default)]
    pub action_label: Option<String>,
    /// Optional icon.
    #[serde(default)]
    pub icon: Option<String>,
}

impl From<CreateNotificationRequest> for NotificationDraft {
    fn from(req: CreateNotificationRequest) -> Self {
        Self {
            category: req.category,
            priority: req.priority,
            title: req.title,
            message: req.message,
            data: req.data,
            action_url: req.action_url,
            action_label: req.action_label,
            icon: req.icon,
        }
    }
}

/// Response of the notification endpoints.
///
/// Acceptance only: delivery is fire-and-forget.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct NotificationAcceptedResponse {
    /// Assigned notification id.
    pub notification_id: uuid::Uuid,
    /// Target user, absent for broadcasts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// When the notification was handed to the hub.
    pub accepted_at: DateTime<Utc>,
}

/// Body of `POST /api/v1/system/announce`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AnnounceRequest {
    /// Status code of the announcement. Defaults to 200.
    #[serde(default = "default_code")]
    pub code: u16,
    /// Announcement text.
    pub message: String,
    /// Optional structured data.
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

fn default_code() -> u16 {
    200
}
