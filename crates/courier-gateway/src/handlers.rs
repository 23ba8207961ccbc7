//! Read-only REST endpoints for inspecting live rooms.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Minimal HTML status page |
//! | `GET` | `/api/status` | Room and connection counts |
//! | `GET` | `/api/rooms` | Every live room with its member count |
//! | `GET` | `/api/rooms/{room}` | Members of one room |

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::{Html, IntoResponse};
use axum::Json;
use courier_types::RoomId;

use crate::error::GatewayError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// GET / -- minimal HTML status page
// ---------------------------------------------------------------------------

/// Serve a minimal HTML page showing gateway status and endpoints.
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let rooms = state.registry.room_count();
    let connections = state.registry.connection_count();

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Courier Gateway</title>
    <style>
        body {{
            background: #0d1117;
            color: #c9d1d9;
            font-family: 'Cascadia Code', 'Fira Code', 'Consolas', monospace;
            padding: 2rem;
            max-width: 800px;
            margin: 0 auto;
        }}
        h1 {{ color: #58a6ff; margin-bottom: 0.25rem; }}
        .metric {{
            display: inline-block;
            background: #161b22;
            border: 1px solid #30363d;
            border-radius: 6px;
            padding: 1rem 1.5rem;
            margin: 0.5rem 0.5rem 0.5rem 0;
            min-width: 120px;
        }}
        .metric .label {{ color: #8b949e; font-size: 0.85rem; }}
        .metric .value {{ color: #58a6ff; font-size: 1.5rem; font-weight: bold; }}
        a {{ color: #58a6ff; text-decoration: none; }}
        ul {{ list-style: none; padding: 0; }}
        li {{ padding: 0.3rem 0; }}
    </style>
</head>
<body>
    <h1>Courier Gateway</h1>
    <div>
        <div class="metric">
            <div class="label">Rooms</div>
            <div class="value">{rooms}</div>
        </div>
        <div class="metric">
            <div class="label">Connections</div>
            <div class="value">{connections}</div>
        </div>
    </div>

    <h2>API Endpoints</h2>
    <ul>
        <li><a href="/api/status">/api/status</a> -- Room and connection counts</li>
        <li><a href="/api/rooms">/api/rooms</a> -- Live rooms</li>
        <li><code>/api/rooms/{{room}}</code> -- Members of one room</li>
    </ul>

    <h2>WebSocket</h2>
    <ul>
        <li><code>ws://host:port/ws/orders/{{order_id}}/</code> -- Order status stream</li>
        <li><code>ws://host:port/ws/tracking/{{partner_id}}/</code> -- Rider location stream</li>
    </ul>
</body>
</html>"#
    ))
}

// ---------------------------------------------------------------------------
// GET /api/status -- counts
// ---------------------------------------------------------------------------

/// Return the number of live rooms and connections.
pub async fn status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "service": "courier-gateway",
        "rooms": state.registry.room_count(),
        "connections": state.registry.connection_count(),
        "shutting_down": state.is_shutting_down(),
    }))
}

// ---------------------------------------------------------------------------
// GET /api/rooms -- list rooms
// ---------------------------------------------------------------------------

/// List every live room with its member count.
pub async fn list_rooms(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let rooms = state.registry.rooms();
    Json(serde_json::json!({
        "count": rooms.len(),
        "rooms": rooms,
    }))
}

// ---------------------------------------------------------------------------
// GET /api/rooms/{room} -- single room
// ---------------------------------------------------------------------------

/// Return the members of one room, e.g. `/api/rooms/order:o1`.
pub async fn get_room(
    State(state): State<Arc<AppState>>,
    Path(room): Path<String>,
) -> Result<impl IntoResponse, GatewayError> {
    let room: RoomId = room.parse()?;
    let members = state
        .registry
        .describe(&room)
        .ok_or_else(|| GatewayError::NotFound(format!("room {room} has no subscribers")))?;

    Ok(Json(serde_json::json!({
        "room": room,
        "members": members.len(),
        "connections": members,
    })))
}
