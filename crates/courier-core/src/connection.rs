//! Server-side handle for one live subscriber.
//!
//! A [`ConnectionHandle`] owns the sending half of a bounded queue whose
//! receiving half is drained by the subscriber's transport task. Pushing
//! into the queue never waits: a full queue means the subscriber is not
//! keeping up, and the dispatcher treats that exactly like a broken peer.
//!
//! Closing a handle drops the sender. After [`ConnectionHandle::close`]
//! returns, no further event can enter the queue, and the transport task
//! observes end-of-stream once it has drained what was already queued.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use courier_types::{ConnectionId, Event, RoomId};
use parking_lot::Mutex;
use tokio::sync::mpsc::{self, error::TrySendError};

/// Receiving half of a subscriber's outbound queue.
pub type OutboundRx = mpsc::Receiver<Arc<Event>>;

/// Why an event could not be handed to one subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    /// The subscriber's outbound queue is full.
    #[error("outbound queue full")]
    Full,

    /// The handle is closed or its transport task has gone away.
    #[error("connection closed")]
    Closed,
}

/// One live subscriber bound to exactly one room.
#[derive(Debug)]
pub struct ConnectionHandle {
    id: ConnectionId,
    room: RoomId,
    connected_at: DateTime<Utc>,
    /// `Some` while alive. Taken exactly once on close.
    outbound: Mutex<Option<mpsc::Sender<Arc<Event>>>>,
}

impl ConnectionHandle {
    /// Create a handle for `room` with an outbound queue of `capacity`
    /// events (at least one).
    ///
    /// Returns the shared handle and the receiving half for the
    /// subscriber's transport task.
    pub fn new(room: RoomId, capacity: usize) -> (Arc<Self>, OutboundRx) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let handle = Arc::new(Self {
            id: ConnectionId::new(),
            room,
            connected_at: Utc::now(),
            outbound: Mutex::new(Some(tx)),
        });
        (handle, rx)
    }

    /// This connection's identifier.
    pub const fn id(&self) -> ConnectionId {
        self.id
    }

    /// The room this connection is bound to.
    pub const fn room(&self) -> &RoomId {
        &self.room
    }

    /// When the handle was created.
    pub const fn connected_at(&self) -> DateTime<Utc> {
        self.connected_at
    }

    /// Whether the handle has not been closed yet.
    pub fn is_alive(&self) -> bool {
        self.outbound.lock().is_some()
    }

    /// Queue `event` for this subscriber without waiting.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::Closed`] if the handle was closed or the
    /// transport task dropped its receiver, and [`DeliveryError::Full`]
    /// if the queue has no free slot.
    pub fn deliver(&self, event: &Arc<Event>) -> Result<(), DeliveryError> {
        let guard = self.outbound.lock();
        let tx = guard.as_ref().ok_or(DeliveryError::Closed)?;
        tx.try_send(Arc::clone(event)).map_err(|e| match e {
            TrySendError::Full(_) => DeliveryError::Full,
            TrySendError::Closed(_) => DeliveryError::Closed,
        })
    }

    /// Mark the handle dead and release its outbound path.
    ///
    /// Returns `true` only for the call that performed the transition;
    /// every later call is a no-op returning `false`.
    pub fn close(&self) -> bool {
        self.outbound.lock().take().is_some()
    }
}
