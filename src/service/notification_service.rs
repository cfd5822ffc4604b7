//! Notification service: validates producer input and routes it.

use chrono::Utc;

use crate::domain::{Envelope, NotificationPayload, Priority, UserId};
use crate::error::ApiError;
use crate::hub::Hub;

/// Who a notification is addressed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Audience {
    /// Every live connection.
    Everyone,
    /// All live connections of one user.
    User(UserId),
}

/// Producer-supplied notification content, before id and timestamps are
/// assigned.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotificationDraft {
    /// Free-form category.
    pub category: String,
    /// Priority, defaults to [`Priority::Normal`].
    pub priority: Priority,
    /// Short title.
    pub title: String,
    /// Message body.
    pub message: String,
    /// Optional structured data.
    pub data: Option<serde_json::Value>,
    /// Optional action URL.
    pub action_url: Option<String>,
    /// Optional action label.
    pub action_label: Option<String>,
    /// Optional icon.
    pub icon: Option<String>,
}

impl NotificationDraft {
    /// Checks required fields.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidRequest`] if the category or title is
    /// blank, or an action label is given without an action URL.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.category.trim().is_empty() {
            return Err(ApiError::InvalidRequest(
                "category must not be empty".to_string(),
            ));
        }
        if self.title.trim().is_empty() {
            return Err(ApiError::InvalidRequest("title must not be empty".to_string()));
        }
        if self.action_label.is_some() && self.action_url.is_none() {
            return Err(ApiError::InvalidRequest(
                "action_label requires action_url".to_string(),
            ));
        }
        Ok(())
    }

    fn into_payload(self) -> NotificationPayload {
        NotificationPayload {
            id: uuid::Uuid::new_v4(),
            category: self.category,
            priority: self.priority,
            title: self.title,
            message: self.message,
            data: self.data,
            action_url: self.action_url,
            action_label: self.action_label,
            icon: self.icon,
            created_at: Utc::now(),
        }
    }
}

/// Entry point for business-logic producers.
///
/// Stateless apart from its [`Hub`] handle; delivery is fire-and-forget.
#[derive(Debug, Clone)]
pub struct NotificationService {
    hub: Hub,
}

impl NotificationService {
    /// Creates a service delivering through `hub`.
    #[must_use]
    pub const fn new(hub: Hub) -> Self {
        Self { hub }
    }

    /// Validates a draft, assigns it an id and creation time, and delivers
    /// it to the audience.
    ///
    /// Returns the notification as sent. A user with no live connections is
    /// not an error; the notification is simply not delivered.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidRequest`] for invalid drafts and
    /// [`ApiError::ShuttingDown`] once the hub has been shut down.
    pub async fn notify(
        &self,
        audience: Audience,
        draft: NotificationDraft,
    ) -> Result<NotificationPayload, ApiError> {
        draft.validate()?;
        if self.hub.is_shut_down().await {
            return Err(ApiError::ShuttingDown);
        }
        let payload = draft.into_payload();
        let envelope = Envelope::notification(payload.clone());
        match &audience {
            Audience::Everyone => self.hub.broadcast(envelope).await,
            Audience::User(user_id) => self.hub.send_to_user(user_id, envelope).await,
        }
        tracing::info!(
            notification_id = %payload.id,
            category = %payload.category,
            audience = ?audience,
            "notification dispatched"
        );
        Ok(payload)
    }

    /// Broadcasts an operational announcement.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidRequest`] for an empty message and
    /// [`ApiError::ShuttingDown`] once the hub has been shut down.
    pub async fn announce(
        &self,
        code: u16,
        message: String,
        data: Option<serde_json::Value>,
    ) -> Result<(), ApiError> {
        if message.trim().is_empty() {
            return Err(ApiError::InvalidRequest("message must not be empty".to_string()));
        }
        if self.hub.is_shut_down().await {
            return Err(ApiError::ShuttingDown);
        }
        self.hub.broadcast(Envelope::system(code, message, data)).await;
        tracing::info!(code, "system announcement dispatched");
        Ok(())
    }
}
