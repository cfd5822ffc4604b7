//! Point-in-time registry statistics.

use std::collections::BTreeMap;

use serde::Serialize;
use utoipa::ToSchema;

/// Snapshot of the hub registry, as exposed on the admin surface.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct HubStats {
    /// Number of live connections, anonymous ones included.
    pub total_connections: usize,
    /// Number of distinct non-anonymous users with at least one connection.
    pub total_users: usize,
    /// Live connection count per user identity.
    pub per_user_connections: BTreeMap<String, usize>,
}
