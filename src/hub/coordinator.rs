//! The hub: sole owner of the registry and router of all deliveries.

use std::sync::Arc;

use tokio::sync::RwLock;
use tokio::sync::mpsc::error::TrySendError;

use super::HubStats;
use super::registry::Registry;
use crate::domain::{ConnectionId, Envelope, UserId};
use crate::error::HubError;
use crate::ws::{Connection, Frame};

/// In-memory pub/sub coordinator for live connections.
///
/// Cheap to clone; all clones share one registry.
///
/// # Concurrency
///
/// Every operation goes through a single [`RwLock`] around the registry:
/// delivery and stats take the read side, register, unregister, eviction
/// and shutdown take the write side. Enqueueing never blocks, so the read
/// lock is held only for the duration of one fan-out pass.
#[derive(Debug, Clone, Default)]
pub struct Hub {
    registry: Arc<RwLock<Registry>>,
}

impl Hub {
    /// Creates an empty hub.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a connection to the global set and, for a named user, to the
    /// end of that user's connection list.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::ShuttingDown`] after [`Hub::shutdown`]. The
    /// rejected connection is dropped, which closes its queue.
    pub async fn register(&self, connection: Connection) -> Result<ConnectionId, HubError> {
        let user_id = connection.user_id().clone();
        let id = self.registry.write().await.insert(connection)?;
        tracing::debug!(connection_id = %id, user_id = %user_id, "registered");
        Ok(id)
    }

    /// Removes a connection and closes its outbound queue.
    ///
    /// Idempotent: returns `false` and does nothing if the connection is not
    /// (or no longer) registered.
    pub async fn unregister(&self, id: ConnectionId) -> bool {
        let removed = self.registry.write().await.remove(id);
        match removed {
            Some(connection) => {
                tracing::debug!(connection_id = %id, user_id = %connection.user_id(), "unregistered");
                true
            }
            None => false,
        }
    }

    /// Delivers an envelope to every registered connection.
    ///
    /// The envelope is stamped with the current time and encoded once.
    /// Connections whose queue is full are evicted instead of blocking the
    /// caller. A no-op after shutdown.
    pub async fn broadcast(&self, envelope: Envelope) {
        let Some(frame) = Self::prepare(envelope) else {
            return;
        };
        let evicted = {
            let registry = self.registry.read().await;
            if registry.is_shut_down() {
                return;
            }
            fan_out(registry.all(), &frame, "broadcast")
        };
        self.evict(evicted).await;
    }

    /// Delivers an envelope to every connection of one user, in
    /// registration order.
    ///
    /// Same stamping, encoding and eviction rules as [`Hub::broadcast`]. A
    /// silent no-op if the user has no live connections: nothing is kept
    /// for later delivery.
    pub async fn send_to_user(&self, user_id: &UserId, envelope: Envelope) {
        if user_id.is_anonymous() {
            return;
        }
        let Some(frame) = Self::prepare(envelope) else {
            return;
        };
        let evicted = {
            let registry = self.registry.read().await;
            if registry.is_shut_down() {
                return;
            }
            fan_out(registry.for_user(user_id), &frame, "targeted")
        };
        self.evict(evicted).await;
    }

    /// Returns connection and user counts.
    pub async fn stats(&self) -> HubStats {
        self.registry.read().await.stats()
    }

    /// Returns the number of live connections.
    pub async fn connection_count(&self) -> usize {
        self.registry.read().await.len()
    }

    /// Returns `true` once [`Hub::shutdown`] has run.
    pub async fn is_shut_down(&self) -> bool {
        self.registry.read().await.is_shut_down()
    }

    /// Closes every connection's outbound queue, empties the registry and
    /// stops accepting registrations.
    ///
    /// Each connection's outbound task reacts to its closed queue by closing
    /// the transport. Returns the number of connections closed.
    pub async fn shutdown(&self) -> usize {
        let drained = self.registry.write().await.close();
        let count = drained.len();
        drop(drained);
        tracing::info!(connections = count, "hub shut down");
        count
    }

    fn prepare(mut envelope: Envelope) -> Option<Frame> {
        envelope.stamp();
        match envelope.encode() {
            Ok(frame) => Some(frame),
            Err(err) => {
                tracing::error!(
                    kind = envelope.payload.type_str(),
                    error = %HubError::from(err),
                    "dropping undeliverable envelope"
                );
                None
            }
        }
    }

    async fn evict(&self, ids: Vec<ConnectionId>) {
        if ids.is_empty() {
            return;
        }
        let mut registry = self.registry.write().await;
        for id in ids {
            if registry.remove(id).is_some() {
                tracing::warn!(connection_id = %id, "evicted slow consumer");
            }
        }
    }
}

/// Enqueues `frame` on each connection without blocking and returns the ids
/// whose queue was full or already closed.
fn fan_out<'a>(
    targets: impl Iterator<Item = &'a Connection>,
    frame: &Frame,
    route: &'static str,
) -> Vec<ConnectionId> {
    let mut delivered = 0usize;
    let mut evicted = Vec::new();
    for connection in targets {
        match connection.try_enqueue(frame.clone()) {
            Ok(()) => delivered += 1,
            Err(TrySendError::Full(_) | TrySendError::Closed(_)) => evicted.push(connection.id()),
        }
    }
    tracing::trace!(route, delivered, evicted = evicted.len(), "fan-out");
    evicted
}
