//! Axum router construction for the gateway.
//!
//! Assembles all routes (REST + `WebSocket`) into a single [`Router`]
//! with CORS middleware enabled for the browser tracking client.

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the complete Axum router for the gateway.
///
/// The router includes:
/// - `GET /` -- minimal HTML status page
/// - `GET /ws/orders/{order_id}/` -- order status stream
/// - `GET /ws/tracking/{partner_id}/` -- rider location stream
/// - `GET /api/status` -- room and connection counts
/// - `GET /api/rooms` -- live rooms
/// - `GET /api/rooms/{room}` -- single room
///
/// `WebSocket` paths are served with and without the trailing slash.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Status page
        .route("/", get(handlers::index))
        // WebSocket
        .route("/ws/orders/{order_id}", get(ws::ws_order))
        .route("/ws/orders/{order_id}/", get(ws::ws_order))
        .route("/ws/tracking/{partner_id}", get(ws::ws_tracking))
        .route("/ws/tracking/{partner_id}/", get(ws::ws_tracking))
        // REST API
        .route("/api/status", get(handlers::status))
        .route("/api/rooms", get(handlers::list_rooms))
        .route("/api/rooms/{room}", get(handlers::get_room))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
