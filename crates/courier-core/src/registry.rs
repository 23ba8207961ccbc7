//! In-memory index from room to its current members.
//!
//! Rooms live in a sharded [`DashMap`], so membership changes in one
//! order's room do not contend with another's. Every operation is a short
//! synchronous critical section; callers never hold a shard guard across
//! an `.await`. Rooms are created by the first subscribe and removed, under
//! the same shard lock, by the unsubscribe that empties them.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use courier_types::{ConnectionId, RoomId};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;
use tracing::debug;

use crate::connection::ConnectionHandle;

/// Point-in-time size of one room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoomSummary {
    /// The room.
    pub room: RoomId,
    /// Number of members at snapshot time.
    pub members: usize,
}

/// Point-in-time view of one member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberSummary {
    /// The member's connection id.
    pub id: ConnectionId,
    /// When the member connected.
    pub connected_at: DateTime<Utc>,
}

/// Registry of rooms and their subscribed connections.
///
/// Owns the room-to-members mapping but not the handles themselves,
/// which are shared with the transport task that created them.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: DashMap<RoomId, HashMap<ConnectionId, Arc<ConnectionHandle>>>,
}

impl RoomRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `handle` to `room`, creating the room if absent.
    ///
    /// Returns `false` if the handle was already a member.
    pub fn subscribe(&self, room: &RoomId, handle: &Arc<ConnectionHandle>) -> bool {
        let mut members = self.rooms.entry(room.clone()).or_default();
        let added = members
            .insert(handle.id(), Arc::clone(handle))
            .is_none();
        debug!(%room, connection = %handle.id(), members = members.len(), "subscribed");
        added
    }

    /// Remove connection `id` from `room`, dropping the room once empty.
    ///
    /// Returns `false` if the connection was not a member.
    pub fn unsubscribe(&self, room: &RoomId, id: ConnectionId) -> bool {
        let Entry::Occupied(mut entry) = self.rooms.entry(room.clone()) else {
            return false;
        };
        let removed = entry.get_mut().remove(&id).is_some();
        let remaining = entry.get().len();
        if remaining == 0 {
            entry.remove();
        }
        if removed {
            debug!(%room, connection = %id, members = remaining, "unsubscribed");
        }
        removed
    }

    /// Snapshot of the current members of `room`.
    ///
    /// The returned vector is detached from the registry; concurrent
    /// subscribes and unsubscribes do not affect it.
    pub fn members_of(&self, room: &RoomId) -> Vec<Arc<ConnectionHandle>> {
        self.rooms
            .get(room)
            .map(|members| members.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Whether `room` currently has an entry.
    pub fn contains_room(&self, room: &RoomId) -> bool {
        self.rooms.contains_key(room)
    }

    /// Number of rooms with at least one member.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Total number of memberships across all rooms.
    pub fn connection_count(&self) -> usize {
        self.rooms.iter().map(|entry| entry.value().len()).sum()
    }

    /// Size of every live room, sorted by room id.
    pub fn rooms(&self) -> Vec<RoomSummary> {
        let mut rooms: Vec<RoomSummary> = self
            .rooms
            .iter()
            .map(|entry| RoomSummary {
                room: entry.key().clone(),
                members: entry.value().len(),
            })
            .collect();
        rooms.sort_by(|a, b| a.room.cmp(&b.room));
        rooms
    }

    /// Members of `room` ordered by connect time, or `None` if absent.
    pub fn describe(&self, room: &RoomId) -> Option<Vec<MemberSummary>> {
        let mut members: Vec<MemberSummary> = self.rooms.get(room).map(|members| {
            members
                .values()
                .map(|handle| MemberSummary {
                    id: handle.id(),
                    connected_at: handle.connected_at(),
                })
                .collect()
        })?;
        members.sort_by_key(|m| (m.connected_at, m.id));
        Some(members)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::thread;

    use courier_types::RoomKind;

    use super::*;
    use crate::connection::OutboundRx;

    fn room(key: &str) -> RoomId {
        RoomId::resolve(RoomKind::Order, key).unwrap()
    }

    fn handle(room: &RoomId) -> (Arc<ConnectionHandle>, OutboundRx) {
        ConnectionHandle::new(room.clone(), 4)
    }

    #[test]
    fn subscribe_creates_room_lazily() {
        let registry = RoomRegistry::new();
        let r = room("o1");
        assert!(!registry.contains_room(&r));

        let (h, _rx) = handle(&r);
        assert!(registry.subscribe(&r, &h));
        assert!(registry.contains_room(&r));
        assert_eq!(registry.members_of(&r).len(), 1);
    }

    #[test]
    fn subscribe_is_idempotent() {
        let registry = RoomRegistry::new();
        let r = room("o1");
        let (h, _rx) = handle(&r);
        assert!(registry.subscribe(&r, &h));
        assert!(!registry.subscribe(&r, &h));
        assert_eq!(registry.members_of(&r).len(), 1);
    }

    #[test]
    fn last_unsubscribe_prunes_room() {
        let registry = RoomRegistry::new();
        let r = room("o2");
        let (a, _ra) = handle(&r);
        let (b, _rb) = handle(&r);
        registry.subscribe(&r, &a);
        registry.subscribe(&r, &b);

        assert!(registry.unsubscribe(&r, a.id()));
        assert!(registry.contains_room(&r));
        assert!(registry.unsubscribe(&r, b.id()));
        assert!(!registry.contains_room(&r));
        assert_eq!(registry.room_count(), 0);
    }

    #[test]
    fn unsubscribe_is_idempotent() {
        let registry = RoomRegistry::new();
        let r = room("o3");
        let (h, _rx) = handle(&r);
        assert!(!registry.unsubscribe(&r, h.id()));

        registry.subscribe(&r, &h);
        assert!(registry.unsubscribe(&r, h.id()));
        assert!(!registry.unsubscribe(&r, h.id()));
        assert!(!registry.contains_room(&r));
    }

    #[test]
    fn members_of_is_a_detached_snapshot() {
        let registry = RoomRegistry::new();
        let r = room("o4");
        let (a, _ra) = handle(&r);
        registry.subscribe(&r, &a);

        let snapshot = registry.members_of(&r);
        let (b, _rb) = handle(&r);
        registry.subscribe(&r, &b);
        registry.unsubscribe(&r, a.id());

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.first().map(|h| h.id()), Some(a.id()));
        assert_eq!(registry.members_of(&r).len(), 1);
    }

    #[test]
    fn rooms_are_independent() {
        let registry = RoomRegistry::new();
        let o = room("o5");
        let t = RoomId::resolve(RoomKind::Tracking, "o5").unwrap();
        let (a, _ra) = handle(&o);
        let (b, _rb) = handle(&t);
        registry.subscribe(&o, &a);
        registry.subscribe(&t, &b);

        assert_eq!(registry.room_count(), 2);
        assert_eq!(registry.connection_count(), 2);
        registry.unsubscribe(&o, a.id());
        assert_eq!(registry.members_of(&t).len(), 1);
        assert_eq!(
            registry.rooms(),
            vec![RoomSummary {
                room: t.clone(),
                members: 1
            }]
        );
    }

    #[test]
    fn concurrent_subscribes_and_unsubscribes_balance() {
        const N: usize = 64;
        const M: usize = 40;

        let registry = &RoomRegistry::new();
        let r = &room("busy");
        let handles: Vec<_> = (0..N).map(|_| handle(r)).collect();

        thread::scope(|scope| {
            for (h, _) in &handles {
                scope.spawn(move || registry.subscribe(r, h));
            }
        });
        assert_eq!(registry.members_of(r).len(), N);

        thread::scope(|scope| {
            for (h, _) in handles.iter().take(M) {
                scope.spawn(move || registry.unsubscribe(r, h.id()));
            }
        });
        assert_eq!(registry.members_of(r).len(), N - M);
    }

    #[test]
    fn concurrent_churn_leaves_no_empty_room() {
        let registry = RoomRegistry::new();
        let r = room("churn");

        thread::scope(|scope| {
            for _ in 0..16 {
                scope.spawn(|| {
                    for _ in 0..50 {
                        let (h, _rx) = handle(&r);
                        registry.subscribe(&r, &h);
                        registry.unsubscribe(&r, h.id());
                    }
                });
            }
        });

        assert!(!registry.contains_room(&r));
        assert!(registry.describe(&r).is_none());
    }
}
