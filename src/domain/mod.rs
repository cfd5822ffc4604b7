//! Domain layer: identifiers and the message envelope.
//!
//! This module contains the hub's wire-facing model: connection and user
//! identities plus the tagged [`Envelope`] every message travels in.

pub mod connection_id;
pub mod envelope;
pub mod user_id;

pub use connection_id::ConnectionId;
pub use envelope::{
    Envelope, ErrorPayload, NotificationPayload, Payload, Priority, SystemPayload,
};
pub use user_id::UserId;
