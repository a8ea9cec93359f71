//! HTTP API endpoints for room management.

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::state::AppState;
use crate::types::CreateRoomResponse;

/// Create a new room.
///
/// GET /create
///
/// Returns `{"room_id": "<ulid>"}`. The id is what clients pass to
/// `/join?roomID=` afterwards.
pub async fn create_room(State(state): State<Arc<AppState>>) -> Json<CreateRoomResponse> {
    let room_id = state.registry.create_session().await;
    tracing::info!(room_id = %room_id, "Created new room");
    Json(CreateRoomResponse { room_id })
}
