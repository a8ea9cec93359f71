//! Session membership registry.
//!
//! Maps each session id to the ordered list of connections that joined it.
//! One `RwLock` guards the whole map and every operation takes it exactly
//! once, so no two operations ever interleave partially.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::connection::{Connection, ConnectionHandle};
use crate::types::{new_id, SessionId};

pub type RegistryResult<T> = Result<T, RegistryError>;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum RegistryError {
    #[error("room {0} does not exist")]
    SessionNotFound(SessionId),
}

/// One participant's connection within a session
#[derive(Clone)]
pub struct Member {
    pub is_initiator: bool,
    pub conn: ConnectionHandle,
}

impl fmt::Debug for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Member")
            .field("is_initiator", &self.is_initiator)
            .field("conn_id", self.conn.id())
            .finish()
    }
}

/// Shared handle to the session map. Cloning shares the same map.
#[derive(Clone, Default)]
pub struct Registry {
    sessions: Arc<RwLock<HashMap<SessionId, Vec<Member>>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty session under a fresh ULID and return its id
    pub async fn create_session(&self) -> SessionId {
        let mut sessions = self.sessions.write().await;

        let room_id = new_id();
        tracing::info!(room_id = %room_id, "Creating new room");
        sessions.insert(room_id.clone(), Vec::new());

        room_id
    }

    /// Snapshot of a session's members. Unknown sessions yield an empty list.
    pub async fn get_members(&self, room_id: &str) -> Vec<Member> {
        self.sessions
            .read()
            .await
            .get(room_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Append a member to an existing session
    pub async fn insert_member(
        &self,
        room_id: &str,
        is_initiator: bool,
        conn: ConnectionHandle,
    ) -> RegistryResult<()> {
        let mut sessions = self.sessions.write().await;

        let Some(members) = sessions.get_mut(room_id) else {
            return Err(RegistryError::SessionNotFound(room_id.to_string()));
        };

        tracing::info!(
            room_id,
            conn_id = %conn.id(),
            is_initiator,
            "Inserting member into room"
        );
        members.push(Member { is_initiator, conn });
        Ok(())
    }

    /// Drop the member owning `conn_id`. Missing session or member is a no-op.
    pub async fn remove_member(&self, room_id: &str, conn_id: &str) {
        let mut sessions = self.sessions.write().await;

        if let Some(members) = sessions.get_mut(room_id) {
            let before = members.len();
            members.retain(|m| m.conn.id() != conn_id);
            if members.len() != before {
                tracing::debug!(room_id, conn_id, "Removed member from room");
            }
        }
    }

    /// Remove a session. Absence is not an error.
    pub async fn delete_session(&self, room_id: &str) {
        if self.sessions.write().await.remove(room_id).is_some() {
            tracing::info!(room_id, "Deleted room");
        }
    }

    pub async fn contains(&self, room_id: &str) -> bool {
        self.sessions.read().await.contains_key(room_id)
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}
