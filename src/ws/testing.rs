//! In-memory duplex transport used by unit tests in place of a WebSocket.

use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context, Poll};

use axum::extract::ws::Message;
use futures_util::{Sink, Stream};
use tokio::sync::mpsc;

/// Server side of the in-memory transport.
#[derive(Debug)]
pub(crate) struct MemorySocket {
    incoming: mpsc::UnboundedReceiver<Result<Message, String>>,
    outgoing: mpsc::UnboundedSender<Message>,
    closed: Arc<AtomicBool>,
}

/// Client side of the in-memory transport.
#[derive(Debug)]
pub(crate) struct MemoryPeer {
    to_server: mpsc::UnboundedSender<Result<Message, String>>,
    from_server: mpsc::UnboundedReceiver<Message>,
    closed: Arc<AtomicBool>,
}

pub(crate) fn memory_transport() -> (MemorySocket, MemoryPeer) {
    let (to_server, incoming) = mpsc::unbounded_channel();
    let (outgoing, from_server) = mpsc::unbounded_channel();
    let closed = Arc::new(AtomicBool::new(false));
    (
        MemorySocket {
            incoming,
            outgoing,
            closed: Arc::clone(&closed),
        },
        MemoryPeer {
            to_server,
            from_server,
            closed,
        },
    )
}

impl MemoryPeer {
    /// Sends a frame to the server.
    pub(crate) fn send(&self, message: Message) -> bool {
        self.to_server.send(Ok(message)).is_ok()
    }

    /// Injects a transport-level read error.
    pub(crate) fn fail(&self, reason: &str) -> bool {
        self.to_server.send(Err(reason.to_string())).is_ok()
    }

    /// Receives the next frame written by the server.
    pub(crate) async fn recv(&mut self) -> Option<Message> {
        self.from_server.recv().await
    }

    /// Receives frames until a text frame arrives, skipping keepalive probes.
    pub(crate) async fn next_text(&mut self) -> Option<String> {
        while let Some(message) = self.from_server.recv().await {
            match message {
                Message::Text(text) => return Some(text.to_string()),
                Message::Close(_) => return None,
                _ => {}
            }
        }
        None
    }

    /// Returns `true` once the server closed its sink.
    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl Stream for MemorySocket {
    type Item = Result<Message, String>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().incoming.poll_recv(cx)
    }
}

impl Sink<Message> for MemorySocket {
    type Error = String;

    fn poll_ready(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        if self.closed.load(Ordering::Acquire) {
            return Poll::Ready(Err("sink closed".to_string()));
        }
        Poll::Ready(Ok(()))
    }

    fn start_send(self: Pin<&mut Self>, item: Message) -> Result<(), Self::Error> {
        self.outgoing
            .send(item)
            .map_err(|_| "peer disconnected".to_string())
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.closed.store(true, Ordering::Release);
        Poll::Ready(Ok(()))
    }
}
