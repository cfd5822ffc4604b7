//! Message envelope exchanged between the hub and its clients.
//!
//! Every frame on the wire is a JSON object of the form
//!
//! ```json
//! { "type": "notification", "data": { ... }, "timestamp": "2026-01-01T00:00:00Z" }
//! ```
//!
//! The `type` discriminator selects one of the payload shapes in
//! [`Payload`]; `ping` and `pong` carry no `data`. The timestamp is assigned
//! by the hub at delivery time.

use axum::extract::ws::Utf8Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Urgency of a notification, used by clients for presentation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Informational, may be batched by the client.
    Low,
    /// Default priority.
    #[default]
    Normal,
    /// Should be surfaced promptly.
    High,
    /// Requires immediate attention.
    Urgent,
}

/// A user-facing notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct NotificationPayload {
    /// Server-assigned notification identifier.
    pub id: uuid::Uuid,
    /// Free-form category (e.g. `"deployment"`, `"alert"`).
    pub category: String,
    /// Notification priority.
    #[serde(default)]
    pub priority: Priority,
    /// Short title.
    pub title: String,
    /// Message body.
    pub message: String,
    /// Optional structured data attached by the producer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    /// Optional URL the client should open when the action is triggered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_url: Option<String>,
    /// Optional label for the action button.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_label: Option<String>,
    /// Optional icon name or URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// When the notification was created by the producer.
    pub created_at: DateTime<Utc>,
}

/// Operational announcement (maintenance windows, restarts, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SystemPayload {
    /// Status code chosen by the announcing component.
    pub code: u16,
    /// Human-readable announcement.
    pub message: String,
    /// Optional structured data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// Delivery or processing failure notice addressed to one connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorPayload {
    /// Numeric error code.
    pub code: u16,
    /// Human-readable description.
    pub message: String,
}

/// Type-specific envelope payload, tagged by `type` with content in `data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Payload {
    /// User notification.
    Notification(NotificationPayload),
    /// System announcement.
    System(SystemPayload),
    /// Application-level keepalive request.
    Ping,
    /// Reply to [`Payload::Ping`].
    Pong,
    /// Error notice.
    Error(ErrorPayload),
}

impl Payload {
    /// Returns the wire discriminator as a static string slice.
    #[must_use]
    pub const fn type_str(&self) -> &'static str {
        match self {
            Self::Notification(_) => "notification",
            Self::System(_) => "system",
            Self::Ping => "ping",
            Self::Pong => "pong",
            Self::Error(_) => "error",
        }
    }
}

/// Top-level message envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Tagged payload, flattened into `type` and `data`.
    #[serde(flatten)]
    pub payload: Payload,
    /// Server-assigned timestamp. Clients may omit it.
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl Envelope {
    /// Wraps a payload with the current time as timestamp.
    #[must_use]
    pub fn new(payload: Payload) -> Self {
        Self {
            payload,
            timestamp: Utc::now(),
        }
    }

    /// Notification envelope.
    #[must_use]
    pub fn notification(payload: NotificationPayload) -> Self {
        Self::new(Payload::Notification(payload))
    }

    /// System announcement envelope.
    #[must_use]
    pub fn system(code: u16, message: impl Into<String>, data: Option<serde_json::Value>) -> Self {
        Self::new(Payload::System(SystemPayload {
            code,
            message: message.into(),
            data,
        }))
    }

    /// Error envelope.
    #[must_use]
    pub fn error(code: u16, message: impl Into<String>) -> Self {
        Self::new(Payload::Error(ErrorPayload {
            code,
            message: message.into(),
        }))
    }

    /// Keepalive request.
    #[must_use]
    pub fn ping() -> Self {
        Self::new(Payload::Ping)
    }

    /// Keepalive reply.
    #[must_use]
    pub fn pong() -> Self {
        Self::new(Payload::Pong)
    }

    /// Overwrites the timestamp with the current time.
    pub fn stamp(&mut self) {
        self.timestamp = Utc::now();
    }

    /// Encodes the envelope into a self-contained text frame.
    ///
    /// The returned buffer is reference counted, so one encoding can be
    /// enqueued on any number of connections.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`serde_json::Error`] if the payload cannot be
    /// serialized (e.g. non-string map keys inside attached data).
    pub fn encode(&self) -> Result<Utf8Bytes, serde_json::Error> {
        serde_json::to_string(self).map(Utf8Bytes::from)
    }

    /// Decodes a text frame received from a client.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] on malformed JSON, an unknown `type`
    /// or a payload that does not match its type.
    pub fn decode(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}
