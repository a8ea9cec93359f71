use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{api, state::AppState, ws};

/// Routes for room creation and the signaling websocket
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/create", get(api::create_room))
        .route("/join", get(ws::join_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
