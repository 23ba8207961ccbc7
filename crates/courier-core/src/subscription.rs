//! Per-connection subscription lifecycle.
//!
//! Each connection moves through `CONNECTING -> SUBSCRIBED -> CLOSED`:
//!
//! - [`Connecting::handshake`] resolves the requested room. Unresolvable
//!   ids are rejected here, before the registry is touched.
//! - [`Connecting::subscribe`] registers the connection and yields a
//!   [`Subscription`] plus the receiving half of its outbound queue.
//! - [`Subscription::close`] deregisters exactly once, however many of
//!   peer close, send failure and shutdown race to trigger it. Dropping a
//!   [`Subscription`] closes it.

use std::sync::Arc;

use courier_types::{
    ConnectionId, Event, LocationSample, RoomId, RoomIdError, RoomKind, SampleError,
};
use serde::Serialize;
use tracing::debug;

use crate::connection::{ConnectionHandle, OutboundRx};
use crate::dispatcher::Broadcaster;
use crate::registry::RoomRegistry;

/// Lifecycle state of one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionState {
    /// Handshake accepted, not yet registered.
    Connecting,
    /// Registered in its room and receiving events.
    Subscribed,
    /// Deregistered. Terminal.
    Closed,
}

/// What ended a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The remote peer closed the connection.
    PeerClosed,
    /// Writing to the peer failed or timed out.
    SendFailed,
    /// The server is shutting down.
    Shutdown,
    /// The owning task let go of the subscription without closing it.
    Dropped,
}

impl CloseReason {
    /// Short label for logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PeerClosed => "peer_closed",
            Self::SendFailed => "send_failed",
            Self::Shutdown => "shutdown",
            Self::Dropped => "dropped",
        }
    }
}

/// Errors raised when a member tries to publish into its own room.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SubscriptionError {
    /// The room kind does not accept events from its members.
    #[error("room {0} is subscribe-only")]
    SubscribeOnly(RoomId),

    /// The subscription has already closed.
    #[error("subscription is closed")]
    Closed,

    /// The position sample is unusable.
    #[error("invalid location sample: {0}")]
    InvalidSample(#[from] SampleError),
}

/// A connection whose room has been resolved but not yet registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connecting {
    room: RoomId,
}

impl Connecting {
    /// Resolve the room a new connection asked for.
    ///
    /// # Errors
    ///
    /// Returns [`RoomIdError`] if `raw` does not name a valid room of
    /// `kind`. No registry state is touched in that case.
    pub fn handshake(kind: RoomKind, raw: &str) -> Result<Self, RoomIdError> {
        Ok(Self {
            room: RoomId::resolve(kind, raw)?,
        })
    }

    /// The resolved room.
    pub const fn room(&self) -> &RoomId {
        &self.room
    }

    /// Always [`SubscriptionState::Connecting`].
    pub const fn state(&self) -> SubscriptionState {
        SubscriptionState::Connecting
    }

    /// Register a new connection in the resolved room.
    ///
    /// `capacity` bounds the connection's outbound queue.
    pub fn subscribe(
        self,
        registry: &Arc<RoomRegistry>,
        capacity: usize,
    ) -> (Subscription, OutboundRx) {
        let (handle, rx) = ConnectionHandle::new(self.room, capacity);
        registry.subscribe(handle.room(), &handle);
        let subscription = Subscription {
            handle,
            registry: Arc::clone(registry),
        };
        (subscription, rx)
    }
}

/// A registered connection.
#[derive(Debug)]
pub struct Subscription {
    handle: Arc<ConnectionHandle>,
    registry: Arc<RoomRegistry>,
}

impl Subscription {
    /// This connection's identifier.
    pub fn id(&self) -> ConnectionId {
        self.handle.id()
    }

    /// The room this connection is bound to.
    pub fn room(&self) -> &RoomId {
        self.handle.room()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SubscriptionState {
        if self.handle.is_alive() {
            SubscriptionState::Subscribed
        } else {
            SubscriptionState::Closed
        }
    }

    /// Transition to [`SubscriptionState::Closed`].
    ///
    /// Returns `true` if this call closed the handle. The registry entry
    /// is removed by whichever side closes the handle first; if the
    /// dispatcher already dropped it after a failed delivery this is a
    /// no-op.
    pub fn close(&self, reason: CloseReason) -> bool {
        if !self.handle.close() {
            return false;
        }
        self.registry.unsubscribe(self.handle.room(), self.handle.id());
        debug!(
            room = %self.handle.room(),
            connection = %self.handle.id(),
            reason = reason.as_str(),
            "subscription closed"
        );
        true
    }

    /// Publish a rider's own position sample back into their tracking room.
    ///
    /// Every member of the room receives the resulting
    /// [`Event::LocationUpdate`], including this connection.
    ///
    /// # Errors
    ///
    /// Returns [`SubscriptionError::SubscribeOnly`] for order rooms,
    /// [`SubscriptionError::Closed`] after close, and
    /// [`SubscriptionError::InvalidSample`] for out-of-range coordinates.
    pub fn publish_sample(
        &self,
        broadcaster: &dyn Broadcaster,
        sample: LocationSample,
    ) -> Result<usize, SubscriptionError> {
        let room = self.handle.room();
        if !room.kind().accepts_member_events() {
            return Err(SubscriptionError::SubscribeOnly(room.clone()));
        }
        if !self.handle.is_alive() {
            return Err(SubscriptionError::Closed);
        }
        sample.validate()?;
        Ok(broadcaster.publish(room, Event::from(sample)))
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.close(CloseReason::Dropped);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use courier_types::{IdError, OrderStatus};

    use super::*;
    use crate::dispatcher::Dispatcher;

    fn setup() -> (Arc<RoomRegistry>, Dispatcher) {
        let registry = Arc::new(RoomRegistry::new());
        let dispatcher = Dispatcher::new(Arc::clone(&registry));
        (registry, dispatcher)
    }

    #[test]
    fn handshake_rejects_unresolvable_room() {
        let result = Connecting::handshake(RoomKind::Order, "bad/id");
        assert_eq!(
            result,
            Err(RoomIdError::Key(IdError::InvalidCharacter { found: '/' }))
        );
    }

    #[test]
    fn lifecycle_walks_through_all_states() {
        let (registry, _) = setup();
        let connecting = Connecting::handshake(RoomKind::Order, "o1").unwrap();
        assert_eq!(connecting.state(), SubscriptionState::Connecting);
        assert_eq!(registry.room_count(), 0);

        let (sub, _rx) = connecting.subscribe(&registry, 4);
        assert_eq!(sub.state(), SubscriptionState::Subscribed);
        assert_eq!(sub.room().to_string(), "order:o1");
        assert_eq!(registry.members_of(sub.room()).len(), 1);

        assert!(sub.close(CloseReason::PeerClosed));
        assert_eq!(sub.state(), SubscriptionState::Closed);
        assert!(!registry.contains_room(sub.room()));
    }

    #[test]
    fn close_is_idempotent() {
        let (registry, _) = setup();
        let (sub, _rx) = Connecting::handshake(RoomKind::Order, "o2")
            .unwrap()
            .subscribe(&registry, 4);
        let (other, _orx) = Connecting::handshake(RoomKind::Order, "o2")
            .unwrap()
            .subscribe(&registry, 4);

        assert!(sub.close(CloseReason::PeerClosed));
        assert!(!sub.close(CloseReason::SendFailed));
        assert!(!sub.close(CloseReason::Shutdown));
        assert_eq!(registry.members_of(other.room()).len(), 1);
    }

    #[test]
    fn drop_deregisters() {
        let (registry, _) = setup();
        let (sub, _rx) = Connecting::handshake(RoomKind::Tracking, "p9")
            .unwrap()
            .subscribe(&registry, 4);
        let room = sub.room().clone();
        assert!(registry.contains_room(&room));

        drop(sub);
        assert!(!registry.contains_room(&room));
    }

    #[test]
    fn close_reasons_have_distinct_labels() {
        let labels = [
            CloseReason::PeerClosed,
            CloseReason::SendFailed,
            CloseReason::Shutdown,
            CloseReason::Dropped,
        ]
        .map(CloseReason::as_str);
        assert_eq!(labels, ["peer_closed", "send_failed", "shutdown", "dropped"]);
    }

    #[test]
    fn drop_after_explicit_close_is_noop() {
        let (registry, _) = setup();
        let (sub, _rx) = Connecting::handshake(RoomKind::Order, "o8")
            .unwrap()
            .subscribe(&registry, 4);
        let (other, _orx) = Connecting::handshake(RoomKind::Order, "o8")
            .unwrap()
            .subscribe(&registry, 4);

        assert!(sub.close(CloseReason::Shutdown));
        drop(sub);
        assert_eq!(registry.members_of(other.room()).len(), 1);
    }

    #[test]
    fn close_after_dispatcher_drop_is_noop() {
        let (registry, dispatcher) = setup();
        let (sub, rx) = Connecting::handshake(RoomKind::Order, "o3")
            .unwrap()
            .subscribe(&registry, 4);
        drop(rx);

        let event = Event::order_status(OrderStatus::Ready, "ready");
        assert_eq!(dispatcher.publish(sub.room(), event), 0);
        assert_eq!(sub.state(), SubscriptionState::Closed);
        assert!(!registry.contains_room(sub.room()));
        assert!(!sub.close(CloseReason::PeerClosed));
    }

    #[test]
    fn rider_sample_echoes_to_whole_room() {
        let (registry, dispatcher) = setup();
        let (rider, mut rider_rx) = Connecting::handshake(RoomKind::Tracking, "p1")
            .unwrap()
            .subscribe(&registry, 4);
        let (_customer, mut customer_rx) = Connecting::handshake(RoomKind::Tracking, "p1")
            .unwrap()
            .subscribe(&registry, 4);

        let sample = LocationSample {
            latitude: 12.9,
            longitude: 77.6,
        };
        assert_eq!(rider.publish_sample(&dispatcher, sample), Ok(2));

        let expected = Event::LocationUpdate {
            latitude: 12.9,
            longitude: 77.6,
        };
        assert_eq!(rider_rx.try_recv().map(|e| (*e).clone()).ok(), Some(expected.clone()));
        assert_eq!(customer_rx.try_recv().map(|e| (*e).clone()).ok(), Some(expected));
    }

    #[test]
    fn order_rooms_are_subscribe_only() {
        let (registry, dispatcher) = setup();
        let (sub, _rx) = Connecting::handshake(RoomKind::Order, "o4")
            .unwrap()
            .subscribe(&registry, 4);
        let sample = LocationSample {
            latitude: 1.0,
            longitude: 1.0,
        };
        assert!(matches!(
            sub.publish_sample(&dispatcher, sample),
            Err(SubscriptionError::SubscribeOnly(_))
        ));
    }

    #[test]
    fn invalid_or_closed_samples_are_rejected() {
        let (registry, dispatcher) = setup();
        let (sub, _rx) = Connecting::handshake(RoomKind::Tracking, "p2")
            .unwrap()
            .subscribe(&registry, 4);

        let bad = LocationSample {
            latitude: 120.0,
            longitude: 0.0,
        };
        assert!(matches!(
            sub.publish_sample(&dispatcher, bad),
            Err(SubscriptionError::InvalidSample(SampleError::Latitude(_)))
        ));

        sub.close(CloseReason::PeerClosed);
        let good = LocationSample {
            latitude: 1.0,
            longitude: 1.0,
        };
        assert_eq!(
            sub.publish_sample(&dispatcher, good),
            Err(SubscriptionError::Closed)
        );
    }
}
