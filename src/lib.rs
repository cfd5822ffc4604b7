//! # notify-hub
//!
//! Real-time notification hub delivering server-initiated messages to
//! authenticated clients over WebSocket.
//!
//! The core is the connection [`hub::Hub`]: it tracks live connections,
//! routes envelopes to one user's sessions or to everyone, evicts slow
//! consumers instead of blocking producers, and shuts down cleanly.
//! Authentication happens upstream; the hub trusts the identity it is
//! handed.
//!
//! ## Architecture
//!
//! ```text
//! Producers (HTTP)          Clients (WebSocket)
//!     │                         │
//!     ├── REST Handlers (api/)  ├── WS Handler (ws/)
//!     │                         │
//!     ├── NotificationService   ├── Connection pump pair (ws/)
//!     │       (service/)        │
//!     └──────────┬──────────────┘
//!                │
//!               Hub (hub/)  ── Registry: connections + per-user index
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod hub;
pub mod service;
pub mod ws;
