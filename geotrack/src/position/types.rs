//! Core position types and the source abstraction.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::BoxFuture;

/// One captured position fix.
///
/// Samples are immutable once captured. The queue assigns an id when a
/// sample is persisted (see [`crate::store::QueuedSample`]).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// When the fix was taken.
    pub captured_at: DateTime<Utc>,
}

impl Sample {
    /// Create a sample with an explicit capture time.
    pub fn new(latitude: f64, longitude: f64, captured_at: DateTime<Utc>) -> Self {
        Self {
            latitude,
            longitude,
            captured_at,
        }
    }

    /// Create a sample captured now.
    pub fn now(latitude: f64, longitude: f64) -> Self {
        Self::new(latitude, longitude, Utc::now())
    }

    /// Position as a `(latitude, longitude)` pair.
    pub fn position(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }

    /// Age of the fix relative to `now`. Fixes from the future count as zero.
    pub fn age_at(&self, now: DateTime<Utc>) -> Duration {
        (now - self.captured_at).to_std().unwrap_or(Duration::ZERO)
    }
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.6}, {:.6} @ {}",
            self.latitude,
            self.longitude,
            self.captured_at.to_rfc3339()
        )
    }
}

/// How a capture should be satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureMode {
    /// Always ask the source for a new fix; fall back to the cached fix on failure.
    Fresh,
    /// Return the cached fix if it is younger than the freshness threshold.
    PreferCached,
}

/// Errors from position acquisition.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PositionError {
    /// The platform refused location access.
    #[error("Location permission denied")]
    PermissionDenied,

    /// No fix could be obtained right now.
    #[error("Location unavailable: {0}")]
    Unavailable(String),

    /// The source did not produce a fix in time.
    #[error("Location request timed out after {0:?}")]
    Timeout(Duration),
}

impl PositionError {
    /// Whether the next tick may succeed without user intervention.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, PositionError::PermissionDenied)
    }
}

/// A platform location API.
///
/// Implementations only need to produce fresh fixes; caching, freshness and
/// fallback are handled by [`super::CachingPositionSource`].
pub trait PositionSource: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Ask the platform for location access.
    ///
    /// Sources without a permission model grant unconditionally.
    fn request_permission(&self) -> BoxFuture<'_, Result<(), PositionError>> {
        Box::pin(async { Ok(()) })
    }

    /// Acquire a new fix.
    fn current_position(&self) -> BoxFuture<'_, Result<Sample, PositionError>>;
}
