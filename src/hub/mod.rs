//! Connection hub: registry, routing and lifecycle of live connections.
//!
//! [`Hub`] is the single authority over which connections exist and which
//! user owns them. Producers call [`Hub::broadcast`] and
//! [`Hub::send_to_user`]; connections only ever request registration and
//! unregistration.

pub mod coordinator;
pub(crate) mod registry;
pub mod stats;

pub use coordinator::Hub;
pub use stats::HubStats;
