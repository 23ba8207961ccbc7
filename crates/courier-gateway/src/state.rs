//! Shared application state for the gateway.
//!
//! [`AppState`] holds the room registry, the dispatcher that fans events
//! into it, the order hooks the marketplace reports saves through, and a
//! shutdown signal every connection task listens on.

use std::sync::Arc;
use std::time::Duration;

use courier_core::config::DeliveryConfig;
use courier_core::{Dispatcher, OrderHooks, OrderNotifier, RoomRegistry};
use tokio::sync::watch;

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
pub struct AppState {
    /// Room-to-members index.
    pub registry: Arc<RoomRegistry>,
    /// Fan-out over [`Self::registry`].
    pub dispatcher: Arc<Dispatcher>,
    /// Publishes order status events; registered on [`Self::order_hooks`].
    pub notifier: OrderNotifier,
    /// Save hooks the marketplace's persistence layer calls into.
    pub order_hooks: Arc<OrderHooks>,
    /// Per-subscriber delivery limits.
    pub delivery: DeliveryConfig,
    shutdown: watch::Sender<bool>,
}

impl AppState {
    /// Create application state with empty rooms.
    ///
    /// The order notifier is registered on the order hooks, so every
    /// reported save is broadcast to the order's room.
    pub fn new(delivery: DeliveryConfig) -> Self {
        let registry = Arc::new(RoomRegistry::new());
        let dispatcher = Arc::new(Dispatcher::new(Arc::clone(&registry)));
        let broadcaster: Arc<Dispatcher> = Arc::clone(&dispatcher);
        let notifier = OrderNotifier::new(broadcaster);
        let order_hooks = Arc::new(OrderHooks::new());
        order_hooks.register(Arc::new(notifier.clone()));
        let (shutdown, _) = watch::channel(false);
        Self {
            registry,
            dispatcher,
            notifier,
            order_hooks,
            delivery,
            shutdown,
        }
    }

    /// Upper bound on one socket write.
    pub const fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.delivery.send_timeout_ms)
    }

    /// Receiver that flips to `true` once shutdown begins.
    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }

    /// Ask every connection task to close its subscription.
    pub fn begin_shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    /// Whether shutdown has begun.
    pub fn is_shutting_down(&self) -> bool {
        *self.shutdown.borrow()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(DeliveryConfig::default())
    }
}
