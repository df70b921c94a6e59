use std::str::FromStr;

use chrono::{DateTime, Utc};
use tonic::{Request, Response, Status};
use tracing::debug;
use uuid::Uuid;

use crate::eui::EUI64;
use crate::proto::api::{
    relay_service_server::RelayService, AddRelayDeviceRequest, ListRelayDevicesRequest,
    ListRelayDevicesResponse, ListRelaysRequest, ListRelaysResponse, RelayDeviceListItem,
    RelayListItem, RemoveRelayDeviceRequest,
};
use crate::store::relay::{DeviceFilters, RelayFilters};
use crate::store::{self, DeviceStore};

/// Maps registry errors to gRPC status codes
impl From<store::Error> for Status {
    fn from(err: store::Error) -> Self {
        let msg = err.to_string();
        match err {
            store::Error::NotFound(_) => Status::not_found(msg),
            store::Error::AlreadyExists(_) => Status::already_exists(msg),
            store::Error::Validation(_) => Status::invalid_argument(msg),
        }
    }
}

fn datetime_to_timestamp(dt: &DateTime<Utc>) -> prost_types::Timestamp {
    let nanos = dt.timestamp_nanos_opt().unwrap_or_default();
    prost_types::Timestamp {
        seconds: nanos / 1_000_000_000,
        nanos: (nanos % 1_000_000_000) as i32,
    }
}

/// Implementation of the relay management gRPC service
#[derive(Debug)]
pub struct RelayServer {
    store: DeviceStore,
}

#[tonic::async_trait]
impl RelayService for RelayServer {
    async fn list(
        &self,
        request: Request<ListRelaysRequest>,
    ) -> Result<Response<ListRelaysResponse>, Status> {
        let req = request.into_inner();

        debug!(application_id = %req.application_id, limit = req.limit, offset = req.offset, "Listing relays");

        let application_id = if req.application_id.is_empty() {
            None
        } else {
            Some(
                Uuid::from_str(&req.application_id)
                    .map_err(|e| Status::invalid_argument(format!("application_id: {}", e)))?,
            )
        };
        let filters = RelayFilters { application_id };

        let total_count = self.store.relay_count(&filters).await?;
        let items = self
            .store
            .list_relays(req.limit as usize, req.offset as usize, &filters)
            .await?;

        Ok(Response::new(ListRelaysResponse {
            total_count: total_count as u32,
            result: items
                .into_iter()
                .map(|r| RelayListItem {
                    dev_eui: r.dev_eui.to_string(),
                    name: r.name,
                })
                .collect(),
        }))
    }

    async fn add_device(
        &self,
        request: Request<AddRelayDeviceRequest>,
    ) -> Result<Response<()>, Status> {
        let req = request.into_inner();

        debug!(relay_dev_eui = %req.relay_dev_eui, device_dev_eui = %req.device_dev_eui, "Adding device to relay");

        let relay_dev_eui = EUI64::from_str(&req.relay_dev_eui)
            .map_err(|e| Status::invalid_argument(format!("relay_dev_eui: {}", e)))?;
        let device_dev_eui = EUI64::from_str(&req.device_dev_eui)
            .map_err(|e| Status::invalid_argument(format!("device_dev_eui: {}", e)))?;

        self.store.add_device(relay_dev_eui, device_dev_eui).await?;

        Ok(Response::new(()))
    }

    async fn remove_device(
        &self,
        request: Request<RemoveRelayDeviceRequest>,
    ) -> Result<Response<()>, Status> {
        let req = request.into_inner();

        debug!(relay_dev_eui = %req.relay_dev_eui, device_dev_eui = %req.device_dev_eui, "Removing device from relay");

        let relay_dev_eui = EUI64::from_str(&req.relay_dev_eui)
            .map_err(|e| Status::invalid_argument(format!("relay_dev_eui: {}", e)))?;
        let device_dev_eui = EUI64::from_str(&req.device_dev_eui)
            .map_err(|e| Status::invalid_argument(format!("device_dev_eui: {}", e)))?;

        self.store
            .remove_device(relay_dev_eui, device_dev_eui)
            .await?;

        Ok(Response::new(()))
    }

    async fn list_devices(
        &self,
        request: Request<ListRelayDevicesRequest>,
    ) -> Result<Response<ListRelayDevicesResponse>, Status> {
        let req = request.into_inner();

        debug!(relay_dev_eui = %req.relay_dev_eui, limit = req.limit, offset = req.offset, "Listing relay devices");

        let relay_dev_eui = EUI64::from_str(&req.relay_dev_eui)
            .map_err(|e| Status::invalid_argument(format!("relay_dev_eui: {}", e)))?;

        // the relay itself must be a registered device
        self.store.get_device(relay_dev_eui).await?;

        let filters = DeviceFilters {
            relay_dev_eui: Some(relay_dev_eui),
        };
        let total_count = self.store.device_count(&filters).await?;
        let items = self
            .store
            .list_devices(req.limit as usize, req.offset as usize, &filters)
            .await?;

        Ok(Response::new(ListRelayDevicesResponse {
            total_count: total_count as u32,
            result: items
                .into_iter()
                .map(|d| RelayDeviceListItem {
                    dev_eui: d.dev_eui.to_string(),
                    created_at: Some(datetime_to_timestamp(&d.created_at)),
                    name: d.name,
                })
                .collect(),
        }))
    }
}

impl RelayServer {
    pub fn new(store: DeviceStore) -> Self {
        Self { store }
    }
}
