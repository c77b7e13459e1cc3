//! Application bootstrap and lifecycle management.
//!
//! This module provides the `TrackerApp` type which builds every component
//! once, in dependency order, from a single [`AppConfig`]:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         TrackerApp                            │
//! │                                                               │
//! │  1. Database ──────► StateStore, DurableQueue, GeofenceStore  │
//! │  2. ReqwestCollector                                          │
//! │  3. SyncEngine, ZoneSync, DeviceRegistry                      │
//! │  4. PositionSource ──► CachingPositionSource                  │
//! │  5. TrackingController (start / stop)                         │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing is created at import time; the tracker only runs between
//! [`TrackerApp::start`] and [`TrackerApp::shutdown`].
//!
//! # Example
//!
//! ```ignore
//! use geotrack::app::{AppConfig, TrackerApp};
//! use geotrack::config::ConfigFile;
//!
//! let config = AppConfig::from_config_file(&ConfigFile::load()?)?;
//! let app = TrackerApp::start(config).await?;
//!
//! // ... until the host asks to stop
//! app.shutdown().await;
//! ```

mod bootstrap;
mod config;
mod error;

pub use bootstrap::{StatusReport, TrackerApp};
pub use config::{AppConfig, PositionConfig, StorageConfig};
pub use error::AppError;
