//! Connection handles shared between the registry and the relay.
//!
//! The transport owns each connection and closes it when its reader ends.
//! The relay is the only other party allowed to close a handle, and only
//! after a failed write. `close` is idempotent.

use async_trait::async_trait;
use axum::extract::ws::{CloseFrame, Message, WebSocket};
use futures::{stream::SplitSink, SinkExt};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::types::{new_id, ConnectionId, Document};

/// Close code sent when a client asks to join a room that does not exist
pub const ROOM_NOT_FOUND_CLOSE_CODE: u16 = 4404;

/// Errors that can occur while writing to a connection
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("connection already closed")]
    Closed,

    #[error("failed to encode payload: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("websocket send failed: {0}")]
    Send(#[from] axum::Error),
}

/// A bidirectional message channel to one participant
#[async_trait]
pub trait Connection: Send + Sync {
    /// Identity used to exclude the sender during fan-out
    fn id(&self) -> &ConnectionId;

    /// Write one payload to the peer
    async fn send(&self, payload: &Document) -> Result<(), ConnectionError>;

    /// Close the connection. Calling this more than once is harmless.
    async fn close(&self);
}

pub type ConnectionHandle = Arc<dyn Connection>;

/// Write half of an upgraded websocket
pub struct WsConnection {
    id: ConnectionId,
    sink: Mutex<SplitSink<WebSocket, Message>>,
    closed: AtomicBool,
}

impl WsConnection {
    pub fn new(sink: SplitSink<WebSocket, Message>) -> Self {
        Self {
            id: new_id(),
            sink: Mutex::new(sink),
            closed: AtomicBool::new(false),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Close with an explicit status so the client can tell why
    pub async fn close_with(&self, code: u16, reason: &str) {
        self.shutdown(Some(CloseFrame {
            code,
            reason: reason.to_string().into(),
        }))
        .await;
    }

    async fn shutdown(&self, frame: Option<CloseFrame>) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }

        let mut sink = self.sink.lock().await;
        if let Err(e) = sink.send(Message::Close(frame)).await {
            tracing::debug!(conn_id = %self.id, "Close frame not delivered: {}", e);
        }
        let _ = sink.close().await;
    }
}

#[async_trait]
impl Connection for WsConnection {
    fn id(&self) -> &ConnectionId {
        &self.id
    }

    async fn send(&self, payload: &Document) -> Result<(), ConnectionError> {
        if self.is_closed() {
            return Err(ConnectionError::Closed);
        }

        let json = serde_json::to_string(payload)?;
        self.sink
            .lock()
            .await
            .send(Message::Text(json.into()))
            .await?;
        Ok(())
    }

    async fn close(&self) {
        self.shutdown(None).await;
    }
}

impl fmt::Debug for WsConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WsConnection")
            .field("id", &self.id)
            .field("closed", &self.is_closed())
            .finish()
    }
}
