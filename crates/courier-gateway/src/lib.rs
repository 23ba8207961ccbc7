//! `WebSocket` gateway for live order and rider tracking.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **Order rooms** (`/ws/orders/{order_id}/`) streaming `order_status`
//!   events whenever the marketplace saves the order
//! - **Tracking rooms** (`/ws/tracking/{partner_id}/`) streaming
//!   `location_update` events published by the rider's own connection
//! - **Read-only REST endpoints** for inspecting live rooms
//! - **Minimal HTML status page** (`GET /`)
//!
//! # Architecture
//!
//! Each `WebSocket` connection runs on its own task. The task registers a
//! subscription in the shared [`RoomRegistry`] and drains its bounded
//! outbound queue into the socket. Producers publish through the
//! [`Dispatcher`], which never waits on a subscriber: a stalled or broken
//! connection is dropped from its room without delaying the others.
//!
//! [`RoomRegistry`]: courier_core::RoomRegistry
//! [`Dispatcher`]: courier_core::Dispatcher

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod startup;
pub mod state;
pub mod ws;

// Re-export primary types for convenience.
pub use router::build_router;
pub use server::{serve, ServerError};
pub use startup::{spawn_gateway, RunningGateway, StartupError};
pub use state::AppState;
