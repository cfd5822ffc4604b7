//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::config::ConnectionConfig;
use crate::hub::Hub;
use crate::service::NotificationService;
use crate::ws::ConnectionTracker;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Connection hub.
    pub hub: Hub,
    /// Notification service for producer endpoints.
    pub notifications: Arc<NotificationService>,
    /// Parameters applied to every new WebSocket connection.
    pub connection_config: ConnectionConfig,
    /// Supervisors of upgraded WebSocket connections.
    pub connections: ConnectionTracker,
}

impl AppState {
    /// Wires the service layer on top of `hub`.
    #[must_use]
    pub fn new(hub: Hub, connection_config: ConnectionConfig) -> Self {
        let notifications = Arc::new(NotificationService::new(hub.clone()));
        Self {
            hub,
            notifications,
            connection_config,
            connections: ConnectionTracker::new(),
        }
    }
}
