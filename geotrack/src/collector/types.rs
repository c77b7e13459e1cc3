//! Wire types and errors for the collector API.

use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geofence::{Zone, DEFAULT_RADIUS_M};
use crate::position::Sample;

/// Errors talking to the collector.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CollectorError {
    /// The request never produced a response (DNS, connect, timeout, TLS).
    #[error("Network error: {0}")]
    Network(String),

    /// The collector answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// The response body did not match the expected shape.
    #[error("Unexpected response from {url}: {reason}")]
    Decode { url: String, reason: String },
}

impl CollectorError {
    /// Whether the collector reported the resource as missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CollectorError::Status { status: 404, .. })
    }
}

/// Body of `POST /locations/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationUpload {
    pub latitude: f64,
    pub longitude: f64,
    /// RFC 3339 UTC with millisecond precision.
    pub timestamp: String,
    pub device_unique_id: String,
}

impl LocationUpload {
    pub fn new(sample: &Sample, device_id: &str) -> Self {
        Self {
            latitude: sample.latitude,
            longitude: sample.longitude,
            timestamp: sample
                .captured_at
                .to_rfc3339_opts(SecondsFormat::Millis, true),
            device_unique_id: device_id.to_string(),
        }
    }
}

/// One element of the `POST /zones/{device}` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneUpload {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub radius: f64,
    pub device_unique_id: String,
}

impl ZoneUpload {
    pub fn new(zone: &Zone, device_id: &str) -> Self {
        Self {
            name: zone.name.clone(),
            latitude: zone.latitude,
            longitude: zone.longitude,
            radius: zone.radius,
            device_unique_id: device_id.to_string(),
        }
    }
}

/// A zone as the collector returns it. Extra fields are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteZone {
    pub id: i64,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default = "default_radius")]
    pub radius: f64,
}

fn default_radius() -> f64 {
    DEFAULT_RADIUS_M
}

impl From<RemoteZone> for Zone {
    fn from(remote: RemoteZone) -> Self {
        Zone {
            id: remote.id.to_string(),
            name: remote.name,
            latitude: remote.latitude,
            longitude: remote.longitude,
            radius: remote.radius,
        }
    }
}

/// Body of `POST /devices/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceRegistration {
    pub device_id: String,
    pub name: String,
    pub mac_address: String,
    pub brand: String,
    pub model: String,
}

/// A device record as the collector returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteDevice {
    pub id: i64,
    pub device_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}
