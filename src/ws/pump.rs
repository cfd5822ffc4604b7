//! The two per-connection tasks: inbound reader and outbound writer.
//!
//! Both are generic over the transport so they run unchanged against
//! axum's WebSocket halves and against in-memory test transports.

use std::fmt::Display;
use std::pin::pin;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::ws::Message;
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};

use super::connection::Frame;
use crate::config::ConnectionConfig;
use crate::domain::{ConnectionId, Envelope, Payload};
use crate::hub::Hub;

/// Reasons a pump task stops abnormally.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PumpError {
    /// No frame arrived within the idle read timeout.
    #[error("no inbound activity for {0:?}")]
    Idle(Duration),

    /// A frame write did not complete within the write deadline.
    #[error("write deadline of {0:?} exceeded")]
    WriteTimeout(Duration),

    /// The transport reported an error.
    #[error("transport error: {0}")]
    Transport(String),
}

/// Drains the outbound queue into the transport and emits keepalive probes.
///
/// Ends cleanly, after sending a close frame, once the queue is closed by
/// the hub. Any write failure ends the task with an error; the transport is
/// closed in both cases.
///
/// # Errors
///
/// Returns [`PumpError::WriteTimeout`] or [`PumpError::Transport`] when a
/// write fails.
pub async fn run_outbound<S>(
    sink: S,
    mut queue: mpsc::Receiver<Frame>,
    config: ConnectionConfig,
    id: ConnectionId,
) -> Result<(), PumpError>
where
    S: Sink<Message>,
    S::Error: Display,
{
    let mut sink = pin!(sink);
    let mut keepalive = tokio::time::interval_at(
        Instant::now() + config.ping_interval,
        config.ping_interval,
    );
    keepalive.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let result = loop {
        tokio::select! {
            frame = queue.recv() => match frame {
                Some(frame) => {
                    if let Err(err) = write(&mut sink, Message::Text(frame), config.write_timeout).await {
                        break Err(err);
                    }
                }
                None => {
                    let _ = write(&mut sink, Message::Close(None), config.write_timeout).await;
                    break Ok(());
                }
            },
            _ = keepalive.tick() => {
                if let Err(err) = write(&mut sink, Message::Ping(Bytes::new()), config.write_timeout).await {
                    break Err(err);
                }
            }
        }
    };

    let _ = tokio::time::timeout(config.write_timeout, sink.close()).await;
    match &result {
        Ok(()) => tracing::debug!(connection_id = %id, "outbound queue closed"),
        Err(err) => tracing::warn!(connection_id = %id, error = %err, "outbound write failed"),
    }
    result
}

async fn write<S>(sink: &mut S, message: Message, deadline: Duration) -> Result<(), PumpError>
where
    S: Sink<Message> + Unpin,
    S::Error: Display,
{
    match tokio::time::timeout(deadline, sink.send(message)).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => Err(PumpError::Transport(err.to_string())),
        Err(_) => Err(PumpError::WriteTimeout(deadline)),
    }
}

/// Reads frames from the transport until it fails, closes or goes idle,
/// then unregisters the connection.
///
/// Every successful read resets the idle deadline. Client `ping` envelopes
/// are answered with a `pong` on the connection's own queue; undecodable
/// text frames get an `error` envelope. Both replies are best-effort.
///
/// # Errors
///
/// Returns [`PumpError::Idle`] on read timeout and [`PumpError::Transport`]
/// on read errors. A close frame or end of stream is a clean exit.
pub async fn run_inbound<R, E>(
    stream: R,
    hub: Hub,
    id: ConnectionId,
    reply: mpsc::WeakSender<Frame>,
    config: ConnectionConfig,
) -> Result<(), PumpError>
where
    R: Stream<Item = Result<Message, E>>,
    E: Display,
{
    let mut stream = pin!(stream);

    let result = loop {
        let next = match tokio::time::timeout(config.read_timeout, stream.next()).await {
            Ok(next) => next,
            Err(_) => break Err(PumpError::Idle(config.read_timeout)),
        };
        match next {
            Some(Ok(Message::Text(text))) => handle_text(text.as_str(), id, &reply),
            Some(Ok(Message::Close(_))) | None => break Ok(()),
            Some(Ok(_)) => {}
            Some(Err(err)) => break Err(PumpError::Transport(err.to_string())),
        }
    };

    if let Err(err) = &result {
        tracing::info!(connection_id = %id, error = %err, "closing connection");
    }
    hub.unregister(id).await;
    result
}

fn handle_text(text: &str, id: ConnectionId, reply: &mpsc::WeakSender<Frame>) {
    match Envelope::decode(text) {
        Ok(envelope) => match envelope.payload {
            Payload::Ping => enqueue_reply(reply, &Envelope::pong(), id),
            other => {
                tracing::debug!(connection_id = %id, kind = other.type_str(), "inbound envelope");
            }
        },
        Err(err) => {
            tracing::debug!(connection_id = %id, error = %err, "malformed inbound envelope");
            enqueue_reply(reply, &Envelope::error(400, "malformed envelope"), id);
        }
    }
}

/// Best-effort enqueue on the connection's own queue. Dropped silently if
/// the queue is full or already closed.
fn enqueue_reply(reply: &mpsc::WeakSender<Frame>, envelope: &Envelope, id: ConnectionId) {
    let Some(sender) = reply.upgrade() else {
        return;
    };
    match envelope.encode() {
        Ok(frame) => {
            if sender.try_send(frame).is_err() {
                tracing::trace!(connection_id = %id, "reply dropped, queue unavailable");
            }
        }
        Err(err) => tracing::error!(connection_id = %id, error = %err, "failed to encode reply"),
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::UserId;
    use crate::ws::connection::Connection;
    use crate::ws::testing::memory_transport;

    fn config() -> ConnectionConfig {
        ConnectionConfig {
            send_queue_capacity: 4,
            read_timeout: Duration::from_millis(150),
            write_timeout: Duration::from_millis(100),
            ping_interval: Duration::from_millis(60),
            ..ConnectionConfig::default()
        }
    }

    #[tokio::test]
    async fn outbound_writes_in_order_then_closes() {
        let (socket, mut peer) = memory_transport();
        let (conn, session) = Connection::new(UserId::anonymous(), 4);
        let task = tokio::spawn(run_outbound(socket, session.queue, config(), conn.id()));

        for text in ["m1", "m2", "m3"] {
            assert!(conn.try_enqueue(Frame::from(text)).is_ok());
        }
        drop(conn);

        let mut seen = Vec::new();
        while let Some(text) = peer.next_text().await {
            seen.push(text);
        }
        assert_eq!(seen, vec!["m1", "m2", "m3"]);
        let Ok(result) = task.await else {
            panic!("outbound task panicked");
        };
        tokio_test::assert_ok!(result);
        assert!(peer.is_closed());
    }

    #[tokio::test]
    async fn outbound_emits_keepalive_probe() {
        let (socket, mut peer) = memory_transport();
        let (conn, session) = Connection::new(UserId::anonymous(), 4);
        let _task = tokio::spawn(run_outbound(socket, session.queue, config(), conn.id()));

        let first = tokio::time::timeout(Duration::from_secs(1), peer.recv()).await;
        assert!(matches!(first, Ok(Some(Message::Ping(_)))));
        drop(conn);
    }

    #[tokio::test]
    async fn outbound_fails_when_peer_is_gone() {
        let (socket, peer) = memory_transport();
        let (conn, session) = Connection::new(UserId::anonymous(), 4);
        drop(peer);
        let task = tokio::spawn(run_outbound(socket, session.queue, config(), conn.id()));
        assert!(conn.try_enqueue(Frame::from("lost")).is_ok());

        let Ok(Ok(result)) = tokio::time::timeout(Duration::from_secs(1), task).await else {
            panic!("outbound task did not finish");
        };
        assert!(matches!(result, Err(PumpError::Transport(_))));
    }

    #[tokio::test]
    async fn inbound_answers_ping_with_pong() {
        let hub = Hub::new();
        let (socket, peer) = memory_transport();
        let (conn, mut session) = Connection::new(UserId::from("u1"), 4);
        let id = conn.id();
        let Ok(_) = hub.register(conn).await else {
            panic!("register failed");
        };
        let _task = tokio::spawn(run_inbound(socket, hub.clone(), id, session.reply.clone(), config()));

        assert!(peer.send(Message::text(r#"{"type":"ping"}"#)));
        let Some(frame) = session.queue.recv().await else {
            panic!("expected pong");
        };
        assert!(frame.as_str().contains("\"type\":\"pong\""));
    }

    #[tokio::test]
    async fn inbound_reports_malformed_frames() {
        let hub = Hub::new();
        let (socket, peer) = memory_transport();
        let (conn, mut session) = Connection::new(UserId::from("u1"), 4);
        let id = conn.id();
        let Ok(_) = hub.register(conn).await else {
            panic!("register failed");
        };
        let _task = tokio::spawn(run_inbound(socket, hub.clone(), id, session.reply.clone(), config()));

        assert!(peer.send(Message::text("{not json")));
        let Some(frame) = session.queue.recv().await else {
            panic!("expected error envelope");
        };
        assert!(frame.as_str().contains("\"type\":\"error\""));
        assert!(frame.as_str().contains("malformed envelope"));
    }

    #[tokio::test]
    async fn inbound_idle_timeout_unregisters() {
        let hub = Hub::new();
        let (socket, _peer) = memory_transport();
        let (conn, session) = Connection::new(UserId::from("u1"), 4);
        let id = conn.id();
        let Ok(_) = hub.register(conn).await else {
            panic!("register failed");
        };

        let result = run_inbound(socket, hub.clone(), id, session.reply, config()).await;
        assert_eq!(result, Err(PumpError::Idle(Duration::from_millis(150))));
        assert_eq!(hub.stats().await.total_connections, 0);
    }

    #[tokio::test]
    async fn inbound_activity_resets_idle_deadline() {
        let hub = Hub::new();
        let (socket, peer) = memory_transport();
        let (conn, session) = Connection::new(UserId::from("u1"), 4);
        let id = conn.id();
        let Ok(_) = hub.register(conn).await else {
            panic!("register failed");
        };
        let task = tokio::spawn(run_inbound(socket, hub.clone(), id, session.reply, config()));

        for _ in 0..4 {
            tokio::time::sleep(Duration::from_millis(80)).await;
            assert!(peer.send(Message::Pong(Bytes::new())));
        }
        assert_eq!(hub.stats().await.total_connections, 1);

        assert!(peer.send(Message::Close(None)));
        let Ok(Ok(result)) = tokio::time::timeout(Duration::from_secs(1), task).await else {
            panic!("inbound task did not finish");
        };
        assert_eq!(result, Ok(()));
        assert_eq!(hub.stats().await.total_connections, 0);
    }

    #[tokio::test]
    async fn inbound_read_error_unregisters() {
        let hub = Hub::new();
        let (socket, peer) = memory_transport();
        let (conn, session) = Connection::new(UserId::from("u1"), 4);
        let id = conn.id();
        let Ok(_) = hub.register(conn).await else {
            panic!("register failed");
        };
        assert!(peer.fail("connection reset"));

        let result = run_inbound(socket, hub.clone(), id, session.reply, config()).await;
        assert!(matches!(result, Err(PumpError::Transport(_))));
        assert_eq!(hub.stats().await.total_connections, 0);
    }
}
