//! In-memory device registry.
//!
//! The service manages relays and the end-devices they forward traffic for.
//! Device records enter the registry at startup (configuration seed list) or
//! programmatically; relay/device links are managed through the API. Both
//! live for the lifetime of the process.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::eui::EUI64;

pub mod relay;

/// Registry errors surfaced to the API layer
#[derive(Error, Debug)]
pub enum Error {
    #[error("object does not exist: {0}")]
    NotFound(String),

    #[error("object already exists: {0}")]
    AlreadyExists(String),

    #[error("validation error: {0}")]
    Validation(String),
}

/// A device record. Relays are devices with `is_relay` set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Device {
    pub dev_eui: EUI64,
    pub name: String,
    pub application_id: Uuid,
    pub region: String,
    pub is_relay: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct State {
    devices: HashMap<EUI64, Device>,
    // relay dev_eui -> linked device dev_eui -> link creation time
    links: HashMap<EUI64, HashMap<EUI64, DateTime<Utc>>>,
}

/// Shared handle to the registry. Cheap to clone; all clones observe the
/// same state.
#[derive(Clone, Debug, Default)]
pub struct DeviceStore {
    state: Arc<RwLock<State>>,
}

impl DeviceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a device under a dev_eui that is not yet taken.
    pub async fn create_device(&self, device: Device) -> Result<(), Error> {
        let mut state = self.state.write().await;
        if state.devices.contains_key(&device.dev_eui) {
            return Err(Error::AlreadyExists(device.dev_eui.to_string()));
        }

        let dev_eui = device.dev_eui;
        state.devices.insert(dev_eui, device);

        info!(dev_eui = %dev_eui, "Device created");
        Ok(())
    }

    pub async fn get_device(&self, dev_eui: EUI64) -> Result<Device, Error> {
        self.state
            .read()
            .await
            .devices
            .get(&dev_eui)
            .cloned()
            .ok_or_else(|| Error::NotFound(dev_eui.to_string()))
    }
}
