//! Periodic capture and delivery.
//!
//! [`TrackingController`] ties the other modules together. Each tick it:
//!
//! 1. captures a fix through the [`CachingPositionSource`](crate::position::CachingPositionSource)
//! 2. asks the [`ThrottleDecider`](crate::throttle::ThrottleDecider) whether to send
//! 3. sends through the [`SyncEngine`](crate::sync::SyncEngine), flushing the
//!    backlog after a success, or queues the sample after a failure
//!
//! ```text
//! capture ──► throttle ──┬── Suppress ──► discard
//!                        └── Send ──► send_now ──┬── ok ──► drain backlog
//!                                                └── err ─► DurableQueue
//! ```
//!
//! Tick failures are logged and never end the loop.

mod config;
mod controller;
mod error;

pub use config::{TrackerConfig, DEFAULT_INTERVAL, MIN_INTERVAL};
pub use controller::{Delivery, TickOutcome, TrackerState, TrackingController};
pub use error::TrackerError;
