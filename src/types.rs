use serde::{Deserialize, Serialize};

/// Opaque ID types
pub type SessionId = String;
pub type ConnectionId = String;

/// A signaling payload. Relayed verbatim, never inspected.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// Body returned by `GET /create`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateRoomResponse {
    pub room_id: SessionId,
}

pub fn new_id() -> String {
    ulid::Ulid::new().to_string()
}
