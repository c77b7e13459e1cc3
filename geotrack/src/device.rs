//! Device identity bootstrap.
//!
//! Every upload carries the device's unique id. The id is generated locally,
//! registered with the collector, and persisted only once the collector has
//! accepted it.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use rand::Rng;
use thiserror::Error;
use tracing::{info, warn};

use crate::collector::{CollectorClient, CollectorError, DeviceRegistration, RemoteDevice};
use crate::store::{StateStore, StoreError};

/// MAC address reported at registration; the host does not expose one.
const UNKNOWN_MAC: &str = "unknown";

/// Errors from device registration and verification.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// No identity is stored locally.
    #[error("Device is not registered")]
    NotRegistered,

    /// The collector rejected or failed the request.
    #[error("Collector request failed: {0}")]
    Collector(#[from] CollectorError),

    /// Local storage failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The persisted device identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    pub device_id: String,
}

impl fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.device_id)
    }
}

/// Descriptive fields sent with a registration.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceProfile {
    pub name: String,
    pub brand: String,
    pub model: String,
}

impl DeviceProfile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            brand: "unknown".to_string(),
            model: "unknown".to_string(),
        }
    }

    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = brand.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

/// Result of checking the stored identity against the collector.
#[derive(Debug, Clone, PartialEq)]
pub enum Verification {
    /// The collector knows this device.
    Registered(RemoteDevice),
    /// The collector no longer knows this device; the local identity was cleared.
    Cleared(DeviceIdentity),
}

/// Registers, verifies and forgets the device identity.
pub struct DeviceRegistry {
    collector: Arc<dyn CollectorClient>,
    state: StateStore,
}

impl DeviceRegistry {
    pub fn new(collector: Arc<dyn CollectorClient>, state: StateStore) -> Self {
        Self { collector, state }
    }

    /// The stored identity, if any.
    pub fn current(&self) -> Result<Option<DeviceIdentity>, DeviceError> {
        Ok(self
            .state
            .device_id()?
            .map(|device_id| DeviceIdentity { device_id }))
    }

    /// Register a fresh identity with the collector and persist it.
    ///
    /// Any previously stored identity is replaced only after the collector
    /// accepts the new one.
    pub async fn register(&self, profile: &DeviceProfile) -> Result<DeviceIdentity, DeviceError> {
        let registration = DeviceRegistration {
            device_id: generate_device_id(),
            name: profile.name.clone(),
            mac_address: UNKNOWN_MAC.to_string(),
            brand: profile.brand.clone(),
            model: profile.model.clone(),
        };

        let remote = self.collector.register_device(&registration).await?;
        self.state.set_device_id(&registration.device_id)?;

        info!(
            device_id = %registration.device_id,
            remote_id = remote.id,
            name = %profile.name,
            "Device registered"
        );

        Ok(DeviceIdentity {
            device_id: registration.device_id,
        })
    }

    /// Check the stored identity with the collector.
    ///
    /// Only a "not found" answer clears the local identity; network errors
    /// are returned and leave it in place.
    pub async fn verify(&self) -> Result<Verification, DeviceError> {
        let identity = self.current()?.ok_or(DeviceError::NotRegistered)?;

        match self.collector.fetch_device(&identity.device_id).await {
            Ok(remote) => Ok(Verification::Registered(remote)),
            Err(e) if e.is_not_found() => {
                warn!(device_id = %identity, "Collector does not know this device, clearing identity");
                self.state.clear_device_id()?;
                Ok(Verification::Cleared(identity))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Drop the stored identity. Queued samples stay queued.
    pub fn forget(&self) -> Result<Option<DeviceIdentity>, DeviceError> {
        let previous = self.current()?;
        if previous.is_some() {
            self.state.clear_device_id()?;
            info!("Device identity forgotten");
        }
        Ok(previous)
    }
}

/// `device-{unix_millis}-{0..999}`.
fn generate_device_id() -> String {
    let suffix: u32 = rand::rng().random_range(0..1000);
    format!("device-{}-{}", Utc::now().timestamp_millis(), suffix)
}
