//! Integration tests for the gateway's HTTP endpoints.
//!
//! Tests use Axum's `Router` directly via `tower::ServiceExt` without
//! starting a TCP server. This validates handler logic, routing and
//! admission checks without needing a live network connection.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use courier_core::{Connecting, OutboundRx, Subscription};
use courier_gateway::router::build_router;
use courier_gateway::state::AppState;
use courier_types::RoomKind;
use serde_json::Value;
use tower::ServiceExt;

fn make_test_state() -> Arc<AppState> {
    Arc::new(AppState::default())
}

fn join(state: &AppState, kind: RoomKind, key: &str) -> (Subscription, OutboundRx) {
    Connecting::handshake(kind, key)
        .unwrap()
        .subscribe(&state.registry, 4)
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_index_returns_html() {
    let state = make_test_state();
    let router = build_router(state);

    let response = router
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(content_type.contains("text/html"));
}

#[tokio::test]
async fn test_status_counts_rooms_and_connections() {
    let state = make_test_state();
    let _a = join(&state, RoomKind::Order, "o1");
    let _b = join(&state, RoomKind::Order, "o1");
    let _c = join(&state, RoomKind::Tracking, "p1");
    let router = build_router(state);

    let response = router
        .oneshot(Request::get("/api/status").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["rooms"], 2);
    assert_eq!(json["connections"], 3);
    assert_eq!(json["shutting_down"], false);
}

#[tokio::test]
async fn test_list_rooms() {
    let state = make_test_state();
    let _a = join(&state, RoomKind::Tracking, "p1");
    let _b = join(&state, RoomKind::Order, "o1");
    let _c = join(&state, RoomKind::Order, "o1");
    let router = build_router(state);

    let response = router
        .oneshot(Request::get("/api/rooms").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["count"], 2);
    assert_eq!(json["rooms"][0]["room"], "order:o1");
    assert_eq!(json["rooms"][0]["members"], 2);
    assert_eq!(json["rooms"][1]["room"], "tracking:p1");
    assert_eq!(json["rooms"][1]["members"], 1);
}

#[tokio::test]
async fn test_get_room() {
    let state = make_test_state();
    let (sub, _rx) = join(&state, RoomKind::Order, "o1");
    let router = build_router(state);

    let response = router
        .oneshot(
            Request::get("/api/rooms/order:o1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["room"], "order:o1");
    assert_eq!(json["members"], 1);
    assert_eq!(json["connections"][0]["id"], sub.id().to_string());
}

#[tokio::test]
async fn test_get_room_not_found_after_last_member_leaves() {
    let state = make_test_state();
    let (sub, _rx) = join(&state, RoomKind::Order, "o2");
    drop(sub);
    let router = build_router(state);

    let response = router
        .oneshot(
            Request::get("/api/rooms/order:o2")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], 404);
}

#[tokio::test]
async fn test_get_room_invalid_id() {
    let state = make_test_state();
    let router = build_router(state);

    let response = router
        .oneshot(
            Request::get("/api/rooms/lobby:o1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_ws_malformed_order_id_rejected_before_registration() {
    let state = make_test_state();
    let router = build_router(Arc::clone(&state));

    let response = router
        .oneshot(
            Request::get("/ws/orders/bad%20id/")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_to_json(response.into_body()).await;
    assert!(json["error"]
        .as_str()
        .unwrap()
        .contains("invalid room identifier"));
    assert_eq!(state.registry.room_count(), 0);
}

#[tokio::test]
async fn test_ws_malformed_partner_id_rejected() {
    let state = make_test_state();
    let router = build_router(Arc::clone(&state));

    let too_long = "p".repeat(courier_types::MAX_KEY_LEN + 1);
    let response = router
        .oneshot(
            Request::get(format!("/ws/tracking/{too_long}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(state.registry.room_count(), 0);
}

#[tokio::test]
async fn test_ws_plain_get_is_not_upgraded() {
    let state = make_test_state();
    let router = build_router(Arc::clone(&state));

    let response = router
        .oneshot(Request::get("/ws/orders/o1/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert!(response.status().is_client_error());
    assert_ne!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(state.registry.room_count(), 0);
}

#[tokio::test]
async fn test_unknown_route_returns_404() {
    let state = make_test_state();
    let router = build_router(state);

    let response = router
        .oneshot(Request::get("/ws/chat/o1/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
