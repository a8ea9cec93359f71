use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures::stream::StreamExt;
use serde::Deserialize;
use std::sync::Arc;

use crate::connection::{Connection, WsConnection, ROOM_NOT_FOUND_CLOSE_CODE};
use crate::relay::BroadcastMessage;
use crate::state::AppState;
use crate::types::{Document, SessionId};

#[derive(Debug, Deserialize)]
pub struct JoinQuery {
    #[serde(rename = "roomID")]
    pub room_id: Option<String>,
}

/// WebSocket upgrade handler for `GET /join?roomID=...`
pub async fn join_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<JoinQuery>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let Some(room_id) = params.room_id.filter(|id| !id.is_empty()) else {
        tracing::warn!("roomID is missing in URL parameters");
        return (StatusCode::BAD_REQUEST, "roomID is required").into_response();
    };

    tracing::info!(room_id = %room_id, "WebSocket join request");

    ws.on_upgrade(move |socket| handle_socket(socket, room_id, state))
}

/// Register the connection in its room, then pump inbound frames into the relay
async fn handle_socket(socket: WebSocket, room_id: SessionId, state: Arc<AppState>) {
    let (sender, mut receiver) = socket.split();
    let conn = Arc::new(WsConnection::new(sender));
    let conn_id = conn.id().clone();

    if let Err(e) = state
        .registry
        .insert_member(&room_id, false, conn.clone())
        .await
    {
        tracing::warn!(room_id = %room_id, conn_id = %conn_id, "Join rejected: {}", e);
        conn.close_with(ROOM_NOT_FOUND_CLOSE_CODE, "room not found")
            .await;
        return;
    }

    tracing::info!(room_id = %room_id, conn_id = %conn_id, "WebSocket joined room");

    while let Some(msg) = receiver.next().await {
        let decoded = match msg {
            Ok(Message::Text(text)) => serde_json::from_str::<Document>(&text),
            Ok(Message::Binary(data)) => serde_json::from_slice::<Document>(&data),
            Ok(Message::Close(_)) => {
                tracing::info!(conn_id = %conn_id, "WebSocket closed by peer");
                break;
            }
            Ok(_) => continue,
            Err(e) => {
                tracing::error!(conn_id = %conn_id, "WebSocket error: {}", e);
                break;
            }
        };

        let payload = match decoded {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(conn_id = %conn_id, "Failed to decode message: {}", e);
                break;
            }
        };

        let message = BroadcastMessage {
            room_id: room_id.clone(),
            sender: conn_id.clone(),
            payload,
        };
        if let Err(e) = state.relay.submit(message).await {
            tracing::warn!(room_id = %room_id, conn_id = %conn_id, "Message dropped: {}", e);
        }
    }

    state.registry.remove_member(&room_id, &conn_id).await;
    conn.close().await;

    tracing::info!(room_id = %room_id, conn_id = %conn_id, "WebSocket connection closed");
}
