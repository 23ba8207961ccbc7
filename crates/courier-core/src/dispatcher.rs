//! Fan-out of one event to every member of a room.
//!
//! [`Dispatcher::publish`] snapshots the room's members, releases the
//! registry, then hands the event to each member's outbound queue without
//! waiting. A member whose queue is full or gone is closed and removed; the
//! rest of the room is unaffected. Nothing is buffered for rooms without
//! members: a late subscriber only sees events published after it joined.

use std::sync::Arc;

use courier_types::{Event, RoomId};
use tracing::{debug, trace, warn};

use crate::registry::RoomRegistry;

/// Entry point for producers that want an event delivered to a room.
///
/// This is the seam a multi-node backend would implement; the in-process
/// [`Dispatcher`] is the only implementation shipped.
pub trait Broadcaster: Send + Sync {
    /// Deliver `event` to every current member of `room`.
    ///
    /// Returns the number of members the event was handed to.
    fn publish(&self, room: &RoomId, event: Event) -> usize;
}

/// In-process broadcast dispatcher over a [`RoomRegistry`].
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<RoomRegistry>,
}

impl Dispatcher {
    /// Create a dispatcher delivering to members of `registry`.
    pub const fn new(registry: Arc<RoomRegistry>) -> Self {
        Self { registry }
    }

    /// The registry this dispatcher reads from.
    pub const fn registry(&self) -> &Arc<RoomRegistry> {
        &self.registry
    }

    /// Deliver `event` to every current member of `room`.
    ///
    /// Returns the number of members whose outbound queue accepted the
    /// event. A room with no members is a no-op returning 0.
    pub fn publish(&self, room: &RoomId, event: Event) -> usize {
        let members = self.registry.members_of(room);
        if members.is_empty() {
            trace!(%room, kind = event.type_name(), "no subscribers, event dropped");
            return 0;
        }

        let event = Arc::new(event);
        let mut delivered: usize = 0;
        let mut failed = Vec::new();

        for member in &members {
            match member.deliver(&event) {
                Ok(()) => delivered = delivered.saturating_add(1),
                Err(e) => {
                    warn!(
                        %room,
                        connection = %member.id(),
                        error = %e,
                        "delivery failed, dropping subscriber"
                    );
                    // Only the caller that flips the handle removes it, so
                    // a racing disconnect never unsubscribes twice.
                    if member.close() {
                        failed.push(member.id());
                    }
                }
            }
        }

        for id in failed {
            self.registry.unsubscribe(room, id);
        }

        debug!(
            %room,
            kind = event.type_name(),
            members = members.len(),
            delivered,
            "event published"
        );
        delivered
    }
}

impl Broadcaster for Dispatcher {
    fn publish(&self, room: &RoomId, event: Event) -> usize {
        Self::publish(self, room, event)
    }
}
