//! Room addressing.
//!
//! A room is keyed directly by the domain identifier it tracks, so
//! producers that already hold an order id or partner id never need an
//! extra lookup to reach the room.

use serde::{Deserialize, Serialize};

use crate::ids::{IdError, OrderId, PartnerId};

/// The two kinds of room the gateway serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomKind {
    /// Status updates for one order. Subscribe-only.
    Order,
    /// Position samples for one rider. Members may also publish.
    Tracking,
}

impl RoomKind {
    /// Prefix used in the rendered room id.
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Order => "order",
            Self::Tracking => "tracking",
        }
    }

    /// Whether members of this room kind may publish into it.
    pub const fn accepts_member_events(self) -> bool {
        matches!(self, Self::Tracking)
    }
}

/// Errors produced when a room identifier cannot be resolved.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomIdError {
    /// The prefix before `:` is not a known room kind.
    #[error("unknown room kind: {0:?}")]
    UnknownKind(String),

    /// The string had no `kind:` prefix.
    #[error("room id must have the form <kind>:<id>")]
    MissingSeparator,

    /// The domain key failed validation.
    #[error(transparent)]
    Key(#[from] IdError),
}

/// Identifier of one room: `order:<order_id>` or `tracking:<partner_id>`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RoomId {
    /// The room for one order.
    Order(OrderId),
    /// The room for one delivery partner.
    Tracking(PartnerId),
}

impl RoomId {
    /// Resolve a raw path segment into a room of the given kind.
    ///
    /// # Errors
    ///
    /// Returns [`RoomIdError::Key`] if `raw` is not a valid identifier.
    pub fn resolve(kind: RoomKind, raw: &str) -> Result<Self, RoomIdError> {
        Ok(match kind {
            RoomKind::Order => Self::Order(OrderId::parse(raw)?),
            RoomKind::Tracking => Self::Tracking(PartnerId::parse(raw)?),
        })
    }

    /// The kind of this room.
    pub const fn kind(&self) -> RoomKind {
        match self {
            Self::Order(_) => RoomKind::Order,
            Self::Tracking(_) => RoomKind::Tracking,
        }
    }

    /// The domain key without the kind prefix.
    pub fn key(&self) -> &str {
        match self {
            Self::Order(id) => id.as_str(),
            Self::Tracking(id) => id.as_str(),
        }
    }
}

impl From<OrderId> for RoomId {
    fn from(id: OrderId) -> Self {
        Self::Order(id)
    }
}

impl From<PartnerId> for RoomId {
    fn from(id: PartnerId) -> Self {
        Self::Tracking(id)
    }
}

impl core::fmt::Display for RoomId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}:{}", self.kind().prefix(), self.key())
    }
}

impl core::str::FromStr for RoomId {
    type Err = RoomIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (prefix, key) = s.split_once(':').ok_or(RoomIdError::MissingSeparator)?;
        let kind = match prefix {
            "order" => RoomKind::Order,
            "tracking" => RoomKind::Tracking,
            other => return Err(RoomIdError::UnknownKind(other.to_owned())),
        };
        Self::resolve(kind, key)
    }
}

impl Serialize for RoomId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RoomId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
