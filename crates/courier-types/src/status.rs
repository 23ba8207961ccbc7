//! Order lifecycle status as seen by live-tracking clients.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Lifecycle status of an order.
///
/// Serialized in `SCREAMING_SNAKE_CASE` (`"PLACED"`, `"PREPARING"`, ...),
/// which is the form the marketplace stores and the browser client
/// switches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "bindings/")]
pub enum OrderStatus {
    /// The customer placed the order.
    Placed,
    /// The restaurant accepted the order.
    Accepted,
    /// The kitchen is preparing the order.
    Preparing,
    /// The order is ready for pickup.
    Ready,
    /// A rider picked the order up.
    Picked,
    /// The order reached the customer.
    Delivered,
    /// The order was cancelled.
    Cancelled,
}

impl OrderStatus {
    /// All statuses in lifecycle order.
    pub const ALL: [Self; 7] = [
        Self::Placed,
        Self::Accepted,
        Self::Preparing,
        Self::Ready,
        Self::Picked,
        Self::Delivered,
        Self::Cancelled,
    ];

    /// Wire code, identical to the serialized form.
    pub const fn code(self) -> &'static str {
        match self {
            Self::Placed => "PLACED",
            Self::Accepted => "ACCEPTED",
            Self::Preparing => "PREPARING",
            Self::Ready => "READY",
            Self::Picked => "PICKED",
            Self::Delivered => "DELIVERED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Human-readable label shown to customers.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Placed => "Placed",
            Self::Accepted => "Accepted by Restaurant",
            Self::Preparing => "Preparing",
            Self::Ready => "Ready for Pickup",
            Self::Picked => "Picked Up by Rider",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
        }
    }

    /// Message broadcast when an order is saved in this status.
    pub fn status_message(self) -> String {
        format!("Order status updated to {}", self.label())
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

impl core::str::FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.code() == s)
            .ok_or_else(|| UnknownStatus(s.to_owned()))
    }
}

/// A status code that does not name any [`OrderStatus`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown order status: {0}")]
pub struct UnknownStatus(pub String);
