//! Position acquisition.
//!
//! A [`PositionSource`] wraps whatever the platform offers for location fixes.
//! The tracker never talks to a source directly: every source is wrapped in a
//! [`CachingPositionSource`] which owns the last known fix and decides between
//! cached and fresh acquisition.
//!
//! # Sources
//!
//! - [`GpsdPositionSource`] - the gpsd daemon over its JSON socket protocol
//! - [`StaticPositionSource`] - a fixed installation position from config
//!
//! # Example
//!
//! ```ignore
//! use geotrack::position::{CachingPositionSource, CaptureMode, GpsdPositionSource};
//!
//! let gpsd = GpsdPositionSource::new("127.0.0.1:2947", Duration::from_secs(20));
//! let source = CachingPositionSource::new(Arc::new(gpsd), Duration::from_secs(30));
//!
//! let sample = source.capture(CaptureMode::PreferCached).await?;
//! println!("{:.6}, {:.6}", sample.latitude, sample.longitude);
//! ```

mod caching;
mod gpsd;
mod fixed;
mod types;

pub use caching::{CachingPositionSource, DEFAULT_FRESHNESS};
pub use fixed::StaticPositionSource;
pub use gpsd::{GpsdPositionSource, DEFAULT_GPSD_ADDRESS};
pub use types::{CaptureMode, PositionError, PositionSource, Sample};

#[cfg(test)]
pub use types::tests::ScriptedPositionSource;
