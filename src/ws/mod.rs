//! WebSocket layer: connection lifecycle, pump tasks and the upgrade route.
//!
//! Each client connection at `/ws` runs two tasks: an inbound reader that
//! watches for idle clients and answers pings, and an outbound writer that
//! drains the connection's queue and emits keepalive probes.

pub mod connection;
pub mod handler;
pub mod pump;
pub mod tracker;

#[cfg(test)]
pub(crate) mod testing;

pub use connection::{Connection, ConnectionState, Frame, Session, serve};
pub use pump::PumpError;
pub use tracker::ConnectionTracker;
