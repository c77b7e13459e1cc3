//! Last-known-fix cache in front of a position source.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::{debug, warn};

use super::types::{CaptureMode, PositionError, PositionSource, Sample};

/// Age below which a cached fix satisfies [`CaptureMode::PreferCached`].
pub const DEFAULT_FRESHNESS: Duration = Duration::from_secs(30);

/// Wraps a [`PositionSource`] with a last-known fix.
///
/// - `PreferCached` returns the cached fix while it is younger than the
///   freshness threshold, otherwise behaves like `Fresh`.
/// - `Fresh` always asks the source. When that fails with a recoverable
///   error and a cached fix exists, the cached fix is returned instead.
pub struct CachingPositionSource {
    inner: Arc<dyn PositionSource>,
    freshness: Duration,
    last_fix: Mutex<Option<Sample>>,
}

impl CachingPositionSource {
    /// Create a caching wrapper with the given freshness threshold.
    pub fn new(inner: Arc<dyn PositionSource>, freshness: Duration) -> Self {
        Self {
            inner,
            freshness,
            last_fix: Mutex::new(None),
        }
    }

    /// Name of the wrapped source.
    pub fn name(&self) -> &str {
        self.inner.name()
    }

    /// Forward a permission request to the wrapped source.
    pub async fn request_permission(&self) -> Result<(), PositionError> {
        self.inner.request_permission().await
    }

    /// The most recent fix, if any.
    pub fn last_fix(&self) -> Option<Sample> {
        *self.last_fix.lock()
    }

    /// Capture a sample.
    pub async fn capture(&self, mode: CaptureMode) -> Result<Sample, PositionError> {
        self.capture_at(mode, Utc::now()).await
    }

    /// Capture with an explicit notion of "now" for freshness checks.
    pub async fn capture_at(
        &self,
        mode: CaptureMode,
        now: DateTime<Utc>,
    ) -> Result<Sample, PositionError> {
        let cached = self.last_fix();

        if mode == CaptureMode::PreferCached {
            if let Some(fix) = cached {
                if fix.age_at(now) < self.freshness {
                    debug!(source = self.name(), age = ?fix.age_at(now), "Using cached fix");
                    return Ok(fix);
                }
            }
        }

        match self.inner.current_position().await {
            Ok(fix) => {
                *self.last_fix.lock() = Some(fix);
                Ok(fix)
            }
            Err(e) if e.is_recoverable() => match cached {
                Some(fix) => {
                    warn!(
                        source = self.name(),
                        error = %e,
                        "Fresh fix failed, falling back to last known position"
                    );
                    Ok(fix)
                }
                None => Err(e),
            },
            Err(e) => Err(e),
        }
    }
}
