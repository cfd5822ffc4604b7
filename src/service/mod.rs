//! Service layer: notification assembly and hand-off to the hub.
//!
//! [`NotificationService`] turns producer input into envelopes, assigns
//! identifiers and creation times, and delivers them through the
//! [`crate::hub::Hub`].

pub mod notification_service;

pub use notification_service::{Audience, NotificationDraft, NotificationService};
