//! Relay/device link management.
//!
//! A relay forwards uplinks for a bounded set of end-devices. The relay's
//! uplink filter list holds 16 entries of which one is reserved as the
//! catch-all, leaving [`RELAY_MAX_DEVICES`] usable slots.

use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use super::{Device, DeviceStore, Error};
use crate::eui::EUI64;

/// Max number of end-devices that can be added to a relay.
pub const RELAY_MAX_DEVICES: usize = 15;

#[derive(Clone, Debug, Default)]
pub struct RelayFilters {
    pub application_id: Option<Uuid>,
}

#[derive(Clone, Debug, Default)]
pub struct DeviceFilters {
    pub relay_dev_eui: Option<EUI64>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelayListEntry {
    pub dev_eui: EUI64,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceListEntry {
    pub dev_eui: EUI64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

fn relay_matches(d: &Device, filters: &RelayFilters) -> bool {
    d.is_relay
        && filters
            .application_id
            .map_or(true, |id| d.application_id == id)
}

impl DeviceStore {
    /// Number of relays matching the filters.
    pub async fn relay_count(&self, filters: &RelayFilters) -> Result<usize, Error> {
        let state = self.state.read().await;
        Ok(state
            .devices
            .values()
            .filter(|d| relay_matches(d, filters))
            .count())
    }

    /// One page of relays matching the filters, ordered by name.
    pub async fn list_relays(
        &self,
        limit: usize,
        offset: usize,
        filters: &RelayFilters,
    ) -> Result<Vec<RelayListEntry>, Error> {
        let state = self.state.read().await;
        let mut items: Vec<RelayListEntry> = state
            .devices
            .values()
            .filter(|d| relay_matches(d, filters))
            .map(|d| RelayListEntry {
                dev_eui: d.dev_eui,
                name: d.name.clone(),
            })
            .collect();
        items.sort_by(|a, b| a.name.cmp(&b.name).then(a.dev_eui.cmp(&b.dev_eui)));

        Ok(items.into_iter().skip(offset).take(limit).collect())
    }

    /// Number of relay/device links, scoped by the filters.
    pub async fn device_count(&self, filters: &DeviceFilters) -> Result<usize, Error> {
        let state = self.state.read().await;
        Ok(match filters.relay_dev_eui {
            Some(relay_dev_eui) => state.links.get(&relay_dev_eui).map_or(0, |m| m.len()),
            None => state.links.values().map(|m| m.len()).sum(),
        })
    }

    /// One page of linked devices, ordered by device name.
    pub async fn list_devices(
        &self,
        limit: usize,
        offset: usize,
        filters: &DeviceFilters,
    ) -> Result<Vec<DeviceListEntry>, Error> {
        let state = self.state.read().await;

        let links: Vec<(EUI64, DateTime<Utc>)> = match filters.relay_dev_eui {
            Some(relay_dev_eui) => state
                .links
                .get(&relay_dev_eui)
                .map(|m| m.iter().map(|(k, v)| (*k, *v)).collect())
                .unwrap_or_default(),
            None => state
                .links
                .values()
                .flat_map(|m| m.iter().map(|(k, v)| (*k, *v)))
                .collect(),
        };

        let mut items: Vec<DeviceListEntry> = links
            .into_iter()
            .filter_map(|(dev_eui, created_at)| {
                state.devices.get(&dev_eui).map(|d| DeviceListEntry {
                    dev_eui,
                    name: d.name.clone(),
                    created_at,
                })
            })
            .collect();
        items.sort_by(|a, b| a.name.cmp(&b.name).then(a.dev_eui.cmp(&b.dev_eui)));

        Ok(items.into_iter().skip(offset).take(limit).collect())
    }

    /// Link a device behind a relay.
    ///
    /// The relay and the device must already be registered, belong to the
    /// same application and region, and the device must not itself be a
    /// relay. The relay must have a free filter-list slot.
    pub async fn add_device(
        &self,
        relay_dev_eui: EUI64,
        device_dev_eui: EUI64,
    ) -> Result<(), Error> {
        let mut state = self.state.write().await;

        let relay = state
            .devices
            .get(&relay_dev_eui)
            .ok_or_else(|| Error::NotFound(relay_dev_eui.to_string()))?;
        if !relay.is_relay {
            return Err(Error::Validation("device is not a relay".into()));
        }

        let device = state
            .devices
            .get(&device_dev_eui)
            .ok_or_else(|| Error::NotFound(device_dev_eui.to_string()))?;
        if relay.application_id != device.application_id {
            return Err(Error::Validation(
                "relay and device must be under the same application".into(),
            ));
        }
        if relay.region != device.region {
            return Err(Error::Validation(
                "relay and device must be under the same region".into(),
            ));
        }
        if device.is_relay {
            return Err(Error::Validation("can not add a relay to a relay".into()));
        }

        let count = state.links.get(&relay_dev_eui).map_or(0, |m| m.len());
        if count > RELAY_MAX_DEVICES {
            return Err(Error::Validation(format!(
                "max number of devices that can be added to a relay is {}",
                RELAY_MAX_DEVICES
            )));
        }

        let links = state.links.entry(relay_dev_eui).or_default();
        if links.contains_key(&device_dev_eui) {
            return Err(Error::AlreadyExists(device_dev_eui.to_string()));
        }
        links.insert(device_dev_eui, Utc::now());

        info!(relay_dev_eui = %relay_dev_eui, device_dev_eui = %device_dev_eui, "Device added to relay");
        Ok(())
    }

    /// Unlink a device from a relay. Errors when no such link exists.
    pub async fn remove_device(
        &self,
        relay_dev_eui: EUI64,
        device_dev_eui: EUI64,
    ) -> Result<(), Error> {
        let mut state = self.state.write().await;

        let removed = state
            .links
            .get_mut(&relay_dev_eui)
            .and_then(|m| m.remove(&device_dev_eui));
        if removed.is_none() {
            return Err(Error::NotFound(format!(
                "relay_dev_eui: {}, device_dev_eui: {}",
                relay_dev_eui, device_dev_eui
            )));
        }
        if state
            .links
            .get(&relay_dev_eui)
            .is_some_and(|m| m.is_empty())
        {
            state.links.remove(&relay_dev_eui);
        }

        info!(relay_dev_eui = %relay_dev_eui, device_dev_eui = %device_dev_eui, "Device removed from relay");
        Ok(())
    }
}
