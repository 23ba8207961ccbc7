//! Real-time event distribution for the Courier live-tracking gateway.
//!
//! This crate owns the rooms that customers and riders subscribe to and
//! the fan-out of order status changes and rider positions into them.
//! It has no transport of its own; the gateway crate drives it from
//! `WebSocket` connections.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `courier-config.yaml` into
//!   strongly-typed structs.
//! - [`connection`] -- [`ConnectionHandle`], one live subscriber and its
//!   bounded outbound queue.
//! - [`registry`] -- [`RoomRegistry`], the room-to-members index.
//! - [`dispatcher`] -- [`Broadcaster`] trait and the in-process
//!   [`Dispatcher`].
//! - [`subscription`] -- The `CONNECTING -> SUBSCRIBED -> CLOSED`
//!   connection lifecycle.
//! - [`lifecycle`] -- Order save hooks and the [`OrderNotifier`].
//!
//! [`ConnectionHandle`]: connection::ConnectionHandle
//! [`RoomRegistry`]: registry::RoomRegistry
//! [`Broadcaster`]: dispatcher::Broadcaster
//! [`Dispatcher`]: dispatcher::Dispatcher
//! [`OrderNotifier`]: lifecycle::OrderNotifier

pub mod config;
pub mod connection;
pub mod dispatcher;
pub mod lifecycle;
pub mod registry;
pub mod subscription;

pub use config::CourierConfig;
pub use connection::{ConnectionHandle, DeliveryError, OutboundRx};
pub use dispatcher::{Broadcaster, Dispatcher};
pub use lifecycle::{OrderHooks, OrderNotifier, OrderSaveObserver, OrderSaved};
pub use registry::{MemberSummary, RoomRegistry, RoomSummary};
pub use subscription::{CloseReason, Connecting, Subscription, SubscriptionError, SubscriptionState};
