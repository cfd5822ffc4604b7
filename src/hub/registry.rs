//! Connection registry: global set plus per-user index.
//!
//! [`Registry`] is plain data with no synchronization of its own; the
//! [`super::Hub`] wraps it in a single lock and is the only caller.

use std::collections::HashMap;

use super::HubStats;
use crate::domain::{ConnectionId, UserId};
use crate::error::HubError;
use crate::ws::{Connection, ConnectionState};

/// All live connections and the user → connections index.
#[derive(Debug, Default)]
pub(crate) struct Registry {
    connections: HashMap<ConnectionId, Connection>,
    /// Connection ids per user, in registration order.
    by_user: HashMap<UserId, Vec<ConnectionId>>,
    shut_down: bool,
}

impl Registry {
    pub(crate) fn insert(&mut self, connection: Connection) -> Result<ConnectionId, HubError> {
        if self.shut_down {
            return Err(HubError::ShuttingDown);
        }
        let id = connection.id();
        if !connection.user_id().is_anonymous() {
            self.by_user
                .entry(connection.user_id().clone())
                .or_default()
                .push(id);
        }
        connection.advance(ConnectionState::Registered);
        self.connections.insert(id, connection);
        Ok(id)
    }

    /// Removes a connection from both indexes. The returned entry owns the
    /// last strong sender of the outbound queue; dropping it closes the queue.
    pub(crate) fn remove(&mut self, id: ConnectionId) -> Option<Connection> {
        let connection = self.connections.remove(&id)?;
        let user_id = connection.user_id();
        if !user_id.is_anonymous()
            && let Some(ids) = self.by_user.get_mut(user_id)
        {
            ids.retain(|other| *other != id);
            if ids.is_empty() {
                self.by_user.remove(user_id);
            }
        }
        connection.advance(ConnectionState::Closing);
        Some(connection)
    }

    /// Empties the registry and refuses further inserts.
    pub(crate) fn close(&mut self) -> Vec<Connection> {
        self.shut_down = true;
        self.by_user.clear();
        self.connections
            .drain()
            .map(|(_, connection)| {
                connection.advance(ConnectionState::Closing);
                connection
            })
            .collect()
    }

    pub(crate) const fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    pub(crate) fn len(&self) -> usize {
        self.connections.len()
    }

    pub(crate) fn all(&self) -> impl Iterator<Item = &Connection> {
        self.connections.values()
    }

    /// The user's connections in registration order.
    pub(crate) fn for_user<'a>(&'a self, user_id: &UserId) -> impl Iterator<Item = &'a Connection> {
        self.by_user
            .get(user_id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.connections.get(id))
    }

    pub(crate) fn stats(&self) -> HubStats {
        HubStats {
            total_connections: self.connections.len(),
            total_users: self.by_user.len(),
            per_user_connections: self
                .by_user
                .iter()
                .map(|(user, ids)| (user.as_str().to_string(), ids.len()))
                .collect(),
        }
    }
}
