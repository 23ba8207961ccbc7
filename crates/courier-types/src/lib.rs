//! Shared type definitions for the Courier live-tracking gateway.
//!
//! This crate is the single source of truth for the identifiers, room
//! addresses and wire payloads used across the workspace. Wire types flow
//! to `TypeScript` via `ts-rs` for the browser tracking client.
//!
//! # Modules
//!
//! - [`ids`] -- Validated domain keys and connection identifiers
//! - [`room`] -- Room kinds and `kind:key` room addresses
//! - [`status`] -- Order lifecycle status
//! - [`event`] -- Outbound event union and inbound rider samples

pub mod event;
pub mod ids;
pub mod room;
pub mod status;

// Re-export all public types at crate root for convenience.
pub use event::{Event, LocationSample, SampleError};
pub use ids::{ConnectionId, IdError, OrderId, PartnerId, MAX_KEY_LEN};
pub use room::{RoomId, RoomIdError, RoomKind};
pub use status::{OrderStatus, UnknownStatus};
