//! Error types for the gateway's HTTP surface.
//!
//! [`GatewayError`] unifies all failure modes into a single enum that
//! can be converted into an Axum HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation.

use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use courier_types::RoomIdError;

/// Errors that can occur in the gateway's HTTP layer.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The requested room identifier could not be resolved.
    #[error("invalid room: {0}")]
    Admission(#[from] RoomIdError),

    /// The requested room has no members.
    #[error("not found: {0}")]
    NotFound(String),

    /// The request was not a valid `WebSocket` upgrade.
    #[error("websocket upgrade rejected: {0}")]
    Upgrade(#[from] WebSocketUpgradeRejection),
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::Admission(e) => (
                StatusCode::BAD_REQUEST,
                format!("invalid room identifier: {e}"),
            ),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::Upgrade(rejection) => (rejection.status(), rejection.body_text()),
        };

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
