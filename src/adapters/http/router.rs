//! Application router: viewer websocket, status routes and HTTP layers.

use std::sync::Arc;

use axum::extract::FromRef;
use axum::http::{HeaderValue, Method};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::adapters::websocket::{websocket_router, EventHub, WebSocketState};
use crate::application::StatusBoard;

use super::status::{status_routes, StatusAppState};

/// Shared state for every route.
#[derive(Clone)]
pub struct AppState {
    pub hub: Arc<EventHub>,
    pub board: Arc<StatusBoard>,
}

impl AppState {
    pub fn new(hub: Arc<EventHub>, board: Arc<StatusBoard>) -> Self {
        Self { hub, board }
    }
}

impl FromRef<AppState> for WebSocketState {
    fn from_ref(state: &AppState) -> Self {
        WebSocketState::new(Arc::clone(&state.hub))
    }
}

impl FromRef<AppState> for StatusAppState {
    fn from_ref(state: &AppState) -> Self {
        StatusAppState {
            hub: Arc::clone(&state.hub),
            board: Arc::clone(&state.board),
        }
    }
}

/// Builds the complete router.
///
/// # Routes
/// - `GET /ws` - Viewer websocket
/// - `GET /api/status` - Adapter states and consumer count
/// - `GET /health` - Liveness probe
pub fn build_router(state: AppState, cors_origins: &[String]) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::DEBUG));

    let websocket: Router<AppState> = websocket_router().with_state(WebSocketState::from_ref(&state));
    let status: Router<AppState> = status_routes().with_state(StatusAppState::from_ref(&state));

    Router::new()
        .merge(websocket)
        .merge(status)
        .layer(cors_layer(cors_origins))
        .layer(trace_layer)
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers(Any);

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if allowed.is_empty() {
        base.allow_origin(Any)
    } else {
        tracing::info!("CORS: Allowing {} origin(s)", allowed.len());
        base.allow_origin(allowed)
    }
}
