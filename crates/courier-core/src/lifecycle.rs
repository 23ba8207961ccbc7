//! Order lifecycle notifications.
//!
//! The marketplace's persistence layer owns order storage. It reports every
//! save of an order through [`OrderHooks::order_saved`]; registered
//! [`OrderSaveObserver`]s react to it. [`OrderNotifier`] is the observer
//! that turns saves into `order_status` events for the order's room.
//!
//! Every save is broadcast, including creation and saves that leave the
//! status unchanged.

use std::sync::Arc;

use courier_types::{Event, OrderId, OrderStatus, RoomId};
use parking_lot::RwLock;
use tracing::debug;

use crate::dispatcher::Broadcaster;

/// One persisted save of an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSaved {
    /// The saved order.
    pub order_id: OrderId,
    /// Status after the save.
    pub status: OrderStatus,
    /// Whether this save created the order.
    pub created: bool,
}

/// Reacts to order saves reported by the persistence layer.
pub trait OrderSaveObserver: Send + Sync {
    /// Called once for every save of an order.
    fn on_order_saved(&self, saved: &OrderSaved);
}

/// Registration point the persistence layer calls into on every save.
#[derive(Default)]
pub struct OrderHooks {
    observers: RwLock<Vec<Arc<dyn OrderSaveObserver>>>,
}

impl OrderHooks {
    /// Create hooks with no observers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer for all subsequent saves.
    pub fn register(&self, observer: Arc<dyn OrderSaveObserver>) {
        self.observers.write().push(observer);
    }

    /// Number of registered observers.
    pub fn len(&self) -> usize {
        self.observers.read().len()
    }

    /// Whether no observer is registered.
    pub fn is_empty(&self) -> bool {
        self.observers.read().is_empty()
    }

    /// Report a save to every registered observer.
    pub fn order_saved(&self, saved: &OrderSaved) {
        // Observers run without the lock so one may register another.
        let observers = self.observers.read().clone();
        for observer in &observers {
            observer.on_order_saved(saved);
        }
    }
}

impl core::fmt::Debug for OrderHooks {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("OrderHooks")
            .field("observers", &self.len())
            .finish()
    }
}

/// Publishes `order_status` events into order rooms.
#[derive(Clone)]
pub struct OrderNotifier {
    broadcaster: Arc<dyn Broadcaster>,
}

impl OrderNotifier {
    /// Create a notifier publishing through `broadcaster`.
    pub const fn new(broadcaster: Arc<dyn Broadcaster>) -> Self {
        Self { broadcaster }
    }

    /// Broadcast a status change to everyone watching `order_id`.
    ///
    /// Returns the number of subscribers reached; 0 when nobody is
    /// watching yet.
    pub fn notify_order_changed(
        &self,
        order_id: &OrderId,
        status: OrderStatus,
        message: impl Into<String>,
    ) -> usize {
        let room = RoomId::Order(order_id.clone());
        let delivered = self
            .broadcaster
            .publish(&room, Event::order_status(status, message));
        debug!(%room, %status, delivered, "order status notified");
        delivered
    }
}

impl OrderSaveObserver for OrderNotifier {
    fn on_order_saved(&self, saved: &OrderSaved) {
        self.notify_order_changed(&saved.order_id, saved.status, saved.status.status_message());
    }
}

impl core::fmt::Debug for OrderNotifier {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("OrderNotifier").finish_non_exhaustive()
    }
}
