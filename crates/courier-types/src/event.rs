//! Wire payloads exchanged with live-tracking clients.
//!
//! Outbound frames are the JSON form of [`Event`], internally tagged by
//! `type`. Riders send bare [`LocationSample`] frames on their tracking
//! connection.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::status::OrderStatus;

/// An event fanned out to every member of one room.
///
/// Events carry no identity beyond their payload: no sequence numbers,
/// no dedup keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Event {
    /// The order's persisted state changed.
    OrderStatus {
        /// Status after the save.
        status: OrderStatus,
        /// Human-readable description of the change.
        message: String,
    },
    /// A rider reported a new position.
    LocationUpdate {
        /// Latitude in decimal degrees.
        latitude: f64,
        /// Longitude in decimal degrees.
        longitude: f64,
    },
}

impl Event {
    /// Build an order status event.
    pub fn order_status(status: OrderStatus, message: impl Into<String>) -> Self {
        Self::OrderStatus {
            status,
            message: message.into(),
        }
    }

    /// The `type` tag this event serializes with.
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::OrderStatus { .. } => "order_status",
            Self::LocationUpdate { .. } => "location_update",
        }
    }
}

impl From<LocationSample> for Event {
    fn from(sample: LocationSample) -> Self {
        Self::LocationUpdate {
            latitude: sample.latitude,
            longitude: sample.longitude,
        }
    }
}

/// Errors produced when a position sample is unusable.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum SampleError {
    /// Latitude is not finite or lies outside `[-90, 90]`.
    #[error("latitude {0} is out of range")]
    Latitude(f64),

    /// Longitude is not finite or lies outside `[-180, 180]`.
    #[error("longitude {0} is out of range")]
    Longitude(f64),
}

/// A position sample sent by a rider over their tracking connection.
///
/// Unknown fields in the inbound frame are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct LocationSample {
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
}

impl LocationSample {
    /// Check that both coordinates are finite and within range.
    ///
    /// # Errors
    ///
    /// Returns the first coordinate that is out of range.
    pub fn validate(&self) -> Result<(), SampleError> {
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(SampleError::Latitude(self.latitude));
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(SampleError::Longitude(self.longitude));
        }
        Ok(())
    }
}
