//! Zone types.

use std::sync::atomic::{AtomicU32, Ordering};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::error::GeofenceError;
use crate::geo::is_valid_coordinate;

/// Radius given to zones created without one.
pub const DEFAULT_RADIUS_M: f64 = 100.0;

static LOCAL_ID_SEQ: AtomicU32 = AtomicU32::new(0);

/// A named circular safe area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    /// Server-assigned numeric id once synced, `local-...` before that.
    pub id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Radius in meters.
    pub radius: f64,
}

impl Zone {
    /// Center as a `(latitude, longitude)` pair.
    pub fn center(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }

    /// Whether the id was assigned by the collector.
    pub fn is_synced(&self) -> bool {
        self.id.parse::<u64>().is_ok()
    }
}

/// A zone that has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewZone {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Defaults to [`DEFAULT_RADIUS_M`].
    pub radius: Option<f64>,
}

impl NewZone {
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.into(),
            latitude,
            longitude,
            radius: None,
        }
    }

    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = Some(radius);
        self
    }

    /// Validate and assign a fresh local id.
    pub(super) fn into_zone(self) -> Result<Zone, GeofenceError> {
        if !is_valid_coordinate(self.latitude, self.longitude) {
            return Err(GeofenceError::InvalidCoordinates {
                latitude: self.latitude,
                longitude: self.longitude,
            });
        }

        let radius = self.radius.unwrap_or(DEFAULT_RADIUS_M);
        if !radius.is_finite() || radius <= 0.0 {
            return Err(GeofenceError::InvalidRadius(radius));
        }

        Ok(Zone {
            id: next_local_id(),
            name: self.name,
            latitude: self.latitude,
            longitude: self.longitude,
            radius,
        })
    }
}

/// `local-{unix_millis}-{seq}`; unique within a process and across restarts.
fn next_local_id() -> String {
    let seq = LOCAL_ID_SEQ.fetch_add(1, Ordering::Relaxed);
    format!("local-{}-{}", Utc::now().timestamp_millis(), seq)
}
