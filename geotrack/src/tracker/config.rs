//! Tracker timing configuration.

use std::time::Duration;

use crate::throttle::DEFAULT_THROTTLE_WINDOW;

/// Time between capture ticks.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(30);

/// Shortest accepted capture interval.
pub const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Timing knobs for [`super::TrackingController`].
///
/// Fields are only reachable through the builder, so the interval is never
/// below [`MIN_INTERVAL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackerConfig {
    interval: Duration,
    throttle_window: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            throttle_window: DEFAULT_THROTTLE_WINDOW,
        }
    }
}

impl TrackerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the capture interval. Anything shorter than [`MIN_INTERVAL`] is raised to it.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval.max(MIN_INTERVAL);
        self
    }

    pub fn with_throttle_window(mut self, window: Duration) -> Self {
        self.throttle_window = window;
        self
    }

    /// Time between capture ticks.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Minimum time between sends while inside a zone.
    pub fn throttle_window(&self) -> Duration {
        self.throttle_window
    }
}
