//! Geofence error types.

use thiserror::Error;

use crate::collector::CollectorError;
use crate::store::StoreError;

/// Errors from zone management.
#[derive(Debug, Error)]
pub enum GeofenceError {
    /// Latitude/longitude missing, zero, or out of range.
    #[error("Invalid zone coordinates: {latitude}, {longitude}")]
    InvalidCoordinates { latitude: f64, longitude: f64 },

    /// Radius not a positive finite number.
    #[error("Invalid zone radius: {0}")]
    InvalidRadius(f64),

    /// The operation needs a registered device.
    #[error("Device is not registered")]
    NoIdentity,

    /// Local persistence failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The collector call failed.
    #[error("Zone sync failed: {0}")]
    Collector(#[from] CollectorError),
}
