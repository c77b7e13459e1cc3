//! Remote collector API.
//!
//! The collector is an ordinary REST backend. This module owns its wire
//! format and the HTTP client used to reach it; everything above it talks to
//! the [`CollectorClient`] trait so tests can substitute a mock.
//!
//! # Endpoints
//!
//! ```text
//! POST   {base}/locations/                 LocationUpload      → 2xx
//! POST   {base}/zones/{device}             [ZoneUpload]        → [RemoteZone]
//! GET    {base}/zones/{device}                                 → [RemoteZone]
//! DELETE {base}/zones/{device}/{zone}                          → 2xx
//! POST   {base}/devices/                   DeviceRegistration  → RemoteDevice
//! GET    {base}/devices/{device}                               → RemoteDevice
//! ```

mod config;
mod http;
mod types;

pub use config::{CollectorConfig, DEFAULT_BASE_URL, DEFAULT_HTTP_TIMEOUT};
pub use http::{CollectorClient, ReqwestCollector};
pub use types::{
    CollectorError, DeviceRegistration, LocationUpload, RemoteDevice, RemoteZone, ZoneUpload,
};

#[cfg(test)]
pub use http::tests::MockCollector;
