//! Status endpoints.
//!
//! - `GET /api/status` - Every adapter's state plus the connected consumer count
//! - `GET /health` - Liveness feed

use std::sync::Arc;

use axum::extract::{Json, State};
use axum::routing::get;
use axum::Router;
use serde::Serialize;

use crate::adapters::websocket::EventHub;
use crate::application::StatusBoard;
use crate::domain::adapter::AdapterState;

/// State needed by the status handlers.
#[derive(Clone)]
pub struct StatusAppState {
    pub hub: Arc<EventHub>,
    pub board: Arc<StatusBoard>,
}

/// Response body for `GET /api/status`.
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    /// Adapter states, ordered by adapter id.
    pub adapters: Vec<AdapterState>,
    /// Consumers currently registered with the hub.
    pub consumers: usize,
}

pub async fn get_status(State(state): State<StatusAppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        adapters: state.board.snapshot(),
        consumers: state.hub.session_count(),
    })
}

pub async fn health() -> &'static str {
    "ok"
}

pub fn status_routes() -> Router<StatusAppState> {
    Router::new()
        .route("/api/status", get(get_status))
        .route("/health", get(health))
}
