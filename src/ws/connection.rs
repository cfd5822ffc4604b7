//! Connection handle, lifecycle state machine and per-connection supervisor.
//!
//! A connection is split in two halves at creation:
//!
//! - [`Connection`] is the hub-side entry. It owns the only strong sender of
//!   the outbound queue, so removing it from the registry closes the queue
//!   exactly once.
//! - [`Session`] is the transport-side half. It holds the queue receiver for
//!   the outbound task and a weak sender the inbound task uses for replies.
//!
//! [`serve`] ties both halves to a duplex transport and runs the pump pair
//! until either side stops.

use std::fmt::Display;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use axum::extract::ws::{Message, Utf8Bytes};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use super::pump::{run_inbound, run_outbound};
use crate::config::ConnectionConfig;
use crate::domain::{ConnectionId, UserId};
use crate::hub::Hub;

/// Pre-encoded text frame as stored in an outbound queue.
pub type Frame = Utf8Bytes;

/// Lifecycle of a connection. Transitions are strictly forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum ConnectionState {
    /// Transport ready, not yet registered with the hub.
    Connecting = 0,
    /// Present in the hub registry, both tasks running.
    Registered = 1,
    /// Unregistration initiated, queue closed, tasks draining.
    Closing = 2,
    /// Transport closed, tasks joined.
    Closed = 3,
}

impl ConnectionState {
    const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Connecting,
            1 => Self::Registered,
            2 => Self::Closing,
            _ => Self::Closed,
        }
    }
}

/// Shared, forward-only lifecycle cell.
#[derive(Debug)]
pub(crate) struct Lifecycle(AtomicU8);

impl Lifecycle {
    fn new() -> Self {
        Self(AtomicU8::new(ConnectionState::Connecting as u8))
    }

    pub(crate) fn get(&self) -> ConnectionState {
        ConnectionState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Moves to `next` if it is ahead of the current state. Returns whether
    /// the state changed.
    pub(crate) fn advance(&self, next: ConnectionState) -> bool {
        let next = next as u8;
        self.0
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                (current < next).then_some(next)
            })
            .is_ok()
    }
}

/// Hub-side registry entry for one transport session.
#[derive(Debug)]
pub struct Connection {
    id: ConnectionId,
    user_id: UserId,
    sender: mpsc::Sender<Frame>,
    lifecycle: Arc<Lifecycle>,
}

/// Transport-side half of a connection, consumed by the pump pair.
#[derive(Debug)]
pub struct Session {
    /// Identifier shared with the matching [`Connection`].
    pub id: ConnectionId,
    /// Identity of the owning user (may be anonymous).
    pub user_id: UserId,
    /// Receiving end of the outbound queue.
    pub queue: mpsc::Receiver<Frame>,
    /// Weak handle for best-effort replies (pong, error) to this connection.
    pub reply: mpsc::WeakSender<Frame>,
    lifecycle: Arc<Lifecycle>,
}

impl Connection {
    /// Creates a connection in [`ConnectionState::Connecting`] with an
    /// outbound queue of the given capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero, as [`tokio::sync::mpsc::channel`] does.
    /// [`ConnectionConfig::validate`] rejects such configurations up front.
    #[must_use]
    pub fn new(user_id: UserId, capacity: usize) -> (Self, Session) {
        let id = ConnectionId::new();
        let (sender, queue) = mpsc::channel(capacity);
        let reply = sender.downgrade();
        let lifecycle = Arc::new(Lifecycle::new());
        let connection = Self {
            id,
            user_id: user_id.clone(),
            sender,
            lifecycle: Arc::clone(&lifecycle),
        };
        let session = Session {
            id,
            user_id,
            queue,
            reply,
            lifecycle,
        };
        (connection, session)
    }

    /// Returns the connection id.
    #[must_use]
    pub const fn id(&self) -> ConnectionId {
        self.id
    }

    /// Returns the owning user's identity.
    #[must_use]
    pub const fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.lifecycle.get()
    }

    pub(crate) fn advance(&self, next: ConnectionState) -> bool {
        self.lifecycle.advance(next)
    }

    /// Non-blocking enqueue onto the outbound queue.
    pub(crate) fn try_enqueue(&self, frame: Frame) -> Result<(), TrySendError<Frame>> {
        self.sender.try_send(frame)
    }
}

impl Session {
    /// Returns the current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.lifecycle.get()
    }
}

/// Registers a transport with the hub and runs its pump pair to completion.
///
/// The transport is any duplex WebSocket-like object: a [`Stream`] of
/// incoming [`Message`]s and a [`Sink`] for outgoing ones. Returns once both
/// tasks have stopped and the connection is [`ConnectionState::Closed`].
pub async fn serve<S, E>(hub: Hub, user_id: UserId, socket: S, config: ConnectionConfig)
where
    S: Stream<Item = Result<Message, E>> + Sink<Message> + Send + 'static,
    <S as Sink<Message>>::Error: Display + Send,
    E: Display + Send + 'static,
{
    let (mut sink, stream) = socket.split();
    let (connection, session) = Connection::new(user_id, config.send_queue_capacity);

    let id = match hub.register(connection).await {
        Ok(id) => id,
        Err(err) => {
            tracing::warn!(error = %err, "connection rejected");
            let _ = sink.send(Message::Close(None)).await;
            let _ = sink.close().await;
            session.lifecycle.advance(ConnectionState::Closed);
            return;
        }
    };

    let Session {
        user_id,
        queue,
        reply,
        lifecycle,
        ..
    } = session;
    tracing::info!(connection_id = %id, user_id = %user_id, "connection registered");

    let mut outbound = tokio::spawn(run_outbound(sink, queue, config, id));
    let mut inbound = tokio::spawn(run_inbound(stream, hub.clone(), id, reply, config));

    tokio::select! {
        result = &mut outbound => {
            if let Ok(Err(err)) = result {
                tracing::debug!(connection_id = %id, error = %err, "outbound task failed");
            }
            hub.unregister(id).await;
            inbound.abort();
            let _ = inbound.await;
        }
        result = &mut inbound => {
            if let Ok(Err(err)) = result {
                tracing::debug!(connection_id = %id, error = %err, "inbound task failed");
            }
            hub.unregister(id).await;
            let _ = outbound.await;
        }
    }

    lifecycle.advance(ConnectionState::Closed);
    tracing::info!(connection_id = %id, user_id = %user_id, "connection closed");
}
