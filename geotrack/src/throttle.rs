//! Geofence-aware upload throttling.
//!
//! The capture cadence never changes. Instead, each captured sample is run
//! through [`ThrottleDecider::decide`], which suppresses uploads while the
//! device sits inside a zone and has already reported within the window.
//!
//! # Decision Table
//!
//! ```text
//! outside all zones                      → Send     last_sent_at := None
//! inside, never sent / elapsed >= window → Send     last_sent_at := now
//! inside, elapsed <  window              → Suppress (unchanged)
//! ```
//!
//! Zones may overlap. The first zone in list order that contains the position
//! is the match, not the nearest one.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::geo::distance_m;
use crate::geofence::Zone;

/// Default minimum spacing of uploads while inside a zone.
pub const DEFAULT_THROTTLE_WINDOW: Duration = Duration::from_secs(10 * 60);

/// Persisted throttle state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ThrottleState {
    /// When a sample was last sent while inside a zone.
    pub last_sent_at: Option<DateTime<Utc>>,
}

impl ThrottleState {
    /// State after sending at `at`.
    pub fn sent_at(at: DateTime<Utc>) -> Self {
        Self {
            last_sent_at: Some(at),
        }
    }
}

/// Whether a sample should be uploaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Send,
    Suppress,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Send => "send",
            Decision::Suppress => "suppress",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of a throttle evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct ThrottleOutcome {
    pub decision: Decision,
    /// State to persist after this evaluation.
    pub next_state: ThrottleState,
    /// Id of the zone containing the position, if any.
    pub zone_id: Option<String>,
}

impl ThrottleOutcome {
    /// Whether the next state differs from `previous` and must be written.
    pub fn state_changed(&self, previous: &ThrottleState) -> bool {
        self.next_state != *previous
    }
}

/// Pure throttle policy.
#[derive(Debug, Clone, Copy)]
pub struct ThrottleDecider {
    window: Duration,
}

impl Default for ThrottleDecider {
    fn default() -> Self {
        Self::new(DEFAULT_THROTTLE_WINDOW)
    }
}

impl ThrottleDecider {
    pub fn new(window: Duration) -> Self {
        Self { window }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Decide whether a sample at `position` should be sent at `now`.
    pub fn decide(
        &self,
        position: (f64, f64),
        zones: &[Zone],
        state: &ThrottleState,
        now: DateTime<Utc>,
    ) -> ThrottleOutcome {
        let Some(zone) = containing_zone(position, zones) else {
            return ThrottleOutcome {
                decision: Decision::Send,
                next_state: ThrottleState::default(),
                zone_id: None,
            };
        };

        let due = match state.last_sent_at {
            None => true,
            Some(last) => match (now - last).to_std() {
                Ok(elapsed) => elapsed >= self.window,
                // Clock moved backwards: keep suppressing until it catches up
                Err(_) => false,
            },
        };

        if due {
            ThrottleOutcome {
                decision: Decision::Send,
                next_state: ThrottleState::sent_at(now),
                zone_id: Some(zone.id.clone()),
            }
        } else {
            ThrottleOutcome {
                decision: Decision::Suppress,
                next_state: *state,
                zone_id: Some(zone.id.clone()),
            }
        }
    }
}

/// First zone, in list order, whose center is strictly closer than its radius.
pub fn containing_zone<'a>(position: (f64, f64), zones: &'a [Zone]) -> Option<&'a Zone> {
    zones
        .iter()
        .find(|zone| distance_m(position, zone.center()) < zone.radius)
}
