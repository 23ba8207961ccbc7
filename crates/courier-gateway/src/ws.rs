//! `WebSocket` handlers for order and rider tracking rooms.
//!
//! Clients connect to one room per connection:
//!
//! - `GET /ws/orders/{order_id}/` receives `order_status` events.
//! - `GET /ws/tracking/{partner_id}/` receives `location_update` events.
//!   The rider's own connection sends `{latitude, longitude}` frames on
//!   the same socket; each valid sample is broadcast to the whole room,
//!   the rider included.
//!
//! The room id is resolved before the upgrade, so a malformed id is
//! answered with `400 Bad Request` and never reaches the registry.

use std::sync::Arc;

use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::{close_code, CloseFrame, Message, WebSocket};
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::response::Response;
use courier_core::{CloseReason, Connecting, OutboundRx, Subscription, SubscriptionError};
use courier_types::{Event, LocationSample, RoomKind};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::error::GatewayError;
use crate::state::AppState;

/// Subscribe to status updates for one order.
///
/// # Route
///
/// `GET /ws/orders/{order_id}/`
pub async fn ws_order(
    Path(order_id): Path<String>,
    State(state): State<Arc<AppState>>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Result<Response, GatewayError> {
    upgrade(RoomKind::Order, &order_id, state, ws)
}

/// Subscribe to (and, as the rider, publish) positions for one partner.
///
/// # Route
///
/// `GET /ws/tracking/{partner_id}/`
pub async fn ws_tracking(
    Path(partner_id): Path<String>,
    State(state): State<Arc<AppState>>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Result<Response, GatewayError> {
    upgrade(RoomKind::Tracking, &partner_id, state, ws)
}

/// Resolve the room, then accept the upgrade.
fn upgrade(
    kind: RoomKind,
    raw_id: &str,
    state: Arc<AppState>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Result<Response, GatewayError> {
    let connecting = Connecting::handshake(kind, raw_id).inspect_err(|e| {
        debug!(kind = kind.prefix(), raw_id, error = %e, "subscription refused");
    })?;
    let ws = ws?;
    Ok(ws.on_upgrade(move |socket| handle_ws(socket, state, connecting)))
}

/// Handle the `WebSocket` lifecycle: register, pump events until the
/// connection ends, deregister.
async fn handle_ws(socket: WebSocket, state: Arc<AppState>, connecting: Connecting) {
    let (subscription, outbound) =
        connecting.subscribe(&state.registry, state.delivery.outbound_capacity);
    info!(
        room = %subscription.room(),
        connection = %subscription.id(),
        "WebSocket client subscribed"
    );

    let reason = pump(socket, &state, &subscription, outbound).await;
    subscription.close(reason);
    info!(
        room = %subscription.room(),
        connection = %subscription.id(),
        reason = reason.as_str(),
        "WebSocket client disconnected"
    );
}

/// Forward queued events to the socket and react to inbound frames.
///
/// Returns why the connection ended.
async fn pump(
    mut socket: WebSocket,
    state: &AppState,
    subscription: &Subscription,
    mut outbound: OutboundRx,
) -> CloseReason {
    let mut shutdown = state.shutdown_signal();
    if *shutdown.borrow_and_update() {
        send_close(&mut socket, state).await;
        return CloseReason::Shutdown;
    }

    loop {
        tokio::select! {
            // An event queued by the dispatcher.
            queued = outbound.recv() => {
                let Some(event) = queued else {
                    // The dispatcher closed this handle after a failed delivery.
                    return CloseReason::SendFailed;
                };
                if !send_event(&mut socket, state, &event).await {
                    return CloseReason::SendFailed;
                }
            }
            // A frame from the client, or the end of the connection.
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => {
                        return CloseReason::PeerClosed;
                    }
                    Some(Ok(Message::Text(text))) => {
                        handle_text(state, subscription, text.as_str());
                    }
                    Some(Ok(Message::Ping(data))) => {
                        let pong = timeout(state.send_timeout(), socket.send(Message::Pong(data)));
                        if !matches!(pong.await, Ok(Ok(()))) {
                            return CloseReason::SendFailed;
                        }
                    }
                    Some(Err(e)) => {
                        debug!(connection = %subscription.id(), "WebSocket error: {e}");
                        return CloseReason::PeerClosed;
                    }
                    _ => {
                        // Ignore binary and pong frames.
                    }
                }
            }
            _ = shutdown.changed() => {
                send_close(&mut socket, state).await;
                return CloseReason::Shutdown;
            }
        }
    }
}

/// Serialize and write one event, bounded by the send timeout.
///
/// Returns `false` if the write failed or timed out.
async fn send_event(socket: &mut WebSocket, state: &AppState, event: &Event) -> bool {
    let json = match serde_json::to_string(event) {
        Ok(j) => j,
        Err(e) => {
            // Not the peer's fault; keep the connection.
            warn!("Failed to serialize event: {e}");
            return true;
        }
    };
    let msg = Message::Text(json.into());
    match timeout(state.send_timeout(), socket.send(msg)).await {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            debug!("WebSocket send failed: {e}");
            false
        }
        Err(_elapsed) => {
            warn!(
                timeout_ms = state.delivery.send_timeout_ms,
                "WebSocket send timed out"
            );
            false
        }
    }
}

/// Treat a text frame from a tracking connection as a position sample.
fn handle_text(state: &AppState, subscription: &Subscription, text: &str) {
    if !subscription.room().kind().accepts_member_events() {
        // Order rooms are subscribe-only.
        return;
    }
    let sample: LocationSample = match serde_json::from_str(text) {
        Ok(sample) => sample,
        Err(e) => {
            warn!(room = %subscription.room(), error = %e, "Malformed location sample dropped");
            return;
        }
    };
    match subscription.publish_sample(state.dispatcher.as_ref(), sample) {
        Ok(delivered) => {
            debug!(room = %subscription.room(), delivered, "Location sample broadcast");
        }
        Err(SubscriptionError::InvalidSample(e)) => {
            warn!(room = %subscription.room(), error = %e, "Invalid location sample dropped");
        }
        Err(e) => {
            debug!(room = %subscription.room(), error = %e, "Location sample not published");
        }
    }
}

/// Best-effort Close frame on shutdown, bounded by the send timeout.
async fn send_close(socket: &mut WebSocket, state: &AppState) {
    match timeout(state.send_timeout(), socket.send(shutdown_frame())).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => debug!("Close frame not sent: {e}"),
        Err(_elapsed) => debug!(
            timeout_ms = state.delivery.send_timeout_ms,
            "Close frame timed out"
        ),
    }
}

fn shutdown_frame() -> Message {
    Message::Close(Some(CloseFrame {
        code: close_code::AWAY,
        reason: "server shutting down".into(),
    }))
}
