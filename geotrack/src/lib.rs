//! geotrack - location telemetry with offline buffering
//!
//! This library periodically captures a device's position and delivers it
//! to a remote collector over HTTP. Samples that cannot be delivered are kept
//! in a crash-safe SQLite queue and replayed in order once the collector is
//! reachable again. While the device sits inside a known safe zone, uploads
//! are throttled to one per window.
//!
//! # Modules
//!
//! - [`position`] - position sources and the last-known-fix cache
//! - [`geofence`] - safe zones, stored locally and synced with the collector
//! - [`throttle`] - the pure send/suppress decision
//! - [`store`] - SQLite-backed queue and key-value state
//! - [`collector`] - the collector REST API
//! - [`sync`] - live delivery and queue draining
//! - [`tracker`] - the periodic capture loop
//! - [`device`] - device identity registration
//! - [`app`] - wiring everything from configuration

use std::future::Future;
use std::pin::Pin;

pub mod app;
pub mod collector;
pub mod config;
pub mod device;
pub mod geo;
pub mod geofence;
pub mod logging;
pub mod position;
pub mod store;
pub mod sync;
pub mod throttle;
pub mod tracker;

/// Version of the geotrack library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Boxed future used by the object-safe async traits in this crate.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
