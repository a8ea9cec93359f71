//! Broadcast relay.
//!
//! A single worker drains the shared queue and fans each message out to
//! every other member of its room. Members are written one after another in
//! join order; a failed write closes that member's connection and the
//! fan-out carries on with the rest.

use tokio::sync::mpsc;

use crate::connection::Connection;
use crate::registry::Registry;
use crate::types::{ConnectionId, Document, SessionId};

/// A message waiting to be fanned out
#[derive(Debug, Clone)]
pub struct BroadcastMessage {
    pub room_id: SessionId,
    pub sender: ConnectionId,
    pub payload: Document,
}

/// What `submit` does when a bounded queue is full
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverflowPolicy {
    /// Wait until the worker frees a slot
    #[default]
    Block,
    /// Fail immediately with `RelayError::QueueFull`
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueueBound {
    /// Producers never wait. Memory grows with the backlog.
    #[default]
    Unbounded,
    Bounded {
        capacity: usize,
        overflow: OverflowPolicy,
    },
}

#[derive(Debug, Clone, Default)]
pub struct RelayConfig {
    pub queue: QueueBound,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RelayError {
    #[error("relay queue is full")]
    QueueFull,

    #[error("relay worker has stopped")]
    Closed,
}

#[derive(Clone)]
enum QueueSender {
    Unbounded(mpsc::UnboundedSender<BroadcastMessage>),
    Bounded(mpsc::Sender<BroadcastMessage>, OverflowPolicy),
}

enum QueueReceiver {
    Unbounded(mpsc::UnboundedReceiver<BroadcastMessage>),
    Bounded(mpsc::Receiver<BroadcastMessage>),
}

impl QueueReceiver {
    async fn recv(&mut self) -> Option<BroadcastMessage> {
        match self {
            QueueReceiver::Unbounded(rx) => rx.recv().await,
            QueueReceiver::Bounded(rx) => rx.recv().await,
        }
    }
}

fn queue(bound: QueueBound) -> (QueueSender, QueueReceiver) {
    match bound {
        QueueBound::Unbounded => {
            let (tx, rx) = mpsc::unbounded_channel();
            (QueueSender::Unbounded(tx), QueueReceiver::Unbounded(rx))
        }
        QueueBound::Bounded { capacity, overflow } => {
            // mpsc::channel panics on zero capacity
            let (tx, rx) = mpsc::channel(capacity.max(1));
            (
                QueueSender::Bounded(tx, overflow),
                QueueReceiver::Bounded(rx),
            )
        }
    }
}

/// Producer side of the relay queue. Cheap to clone.
#[derive(Clone)]
pub struct RelayHandle {
    tx: QueueSender,
}

impl RelayHandle {
    /// Hand a message to the relay worker
    pub async fn submit(&self, message: BroadcastMessage) -> Result<(), RelayError> {
        match &self.tx {
            QueueSender::Unbounded(tx) => tx.send(message).map_err(|_| RelayError::Closed),
            QueueSender::Bounded(tx, OverflowPolicy::Block) => {
                tx.send(message).await.map_err(|_| RelayError::Closed)
            }
            QueueSender::Bounded(tx, OverflowPolicy::Reject) => {
                tx.try_send(message).map_err(|e| match e {
                    mpsc::error::TrySendError::Full(_) => RelayError::QueueFull,
                    mpsc::error::TrySendError::Closed(_) => RelayError::Closed,
                })
            }
        }
    }
}

/// Spawn the relay worker. Call once at startup.
pub fn spawn_relay(registry: Registry, config: RelayConfig) -> RelayHandle {
    let (tx, mut rx) = queue(config.queue);

    tokio::spawn(async move {
        tracing::info!(queue = ?config.queue, "Relay worker started");

        while let Some(message) = rx.recv().await {
            fan_out(&registry, message).await;
        }

        tracing::info!("Relay queue closed, worker exiting");
    });

    RelayHandle { tx }
}

/// Deliver one message to everyone in its room except the sender.
/// Returns how many members received it.
async fn fan_out(registry: &Registry, message: BroadcastMessage) -> usize {
    let members = registry.get_members(&message.room_id).await;

    if members.is_empty() {
        // Room is gone or empty; the message is dropped
        tracing::debug!(room_id = %message.room_id, "No members to relay to");
        return 0;
    }

    tracing::debug!(
        room_id = %message.room_id,
        sender = %message.sender,
        "Relaying message"
    );

    let mut delivered = 0;
    for member in members.iter().filter(|m| *m.conn.id() != message.sender) {
        match member.conn.send(&message.payload).await {
            Ok(()) => delivered += 1,
            Err(e) => {
                tracing::warn!(
                    room_id = %message.room_id,
                    conn_id = %member.conn.id(),
                    "Failed to write message, closing connection: {}",
                    e
                );
                member.conn.close().await;
            }
        }
    }

    delivered
}
