//! LoRaWAN Relay Management Service Library
//!
//! This library carries the protobuf bindings for the `api.RelayService`
//! contract together with the server-side implementation: an in-memory
//! device registry and the gRPC service managing which end-devices a relay
//! forwards traffic for.
//!
//! # Modules
//! - `proto`: generated protobuf/gRPC bindings (package `api`)
//! - `grpc`: the `RelayService` server implementation
//! - `store`: in-memory device registry and relay/device links
//! - `eui`: the EUI-64 identifier type
//! - `config`: configuration management
//!
//! # Example
//! ```no_run
//! use lorawan_relay_service::api::relay_service_client::RelayServiceClient;
//! use lorawan_relay_service::api::ListRelaysRequest;
//!
//! async fn list_relays() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut client = RelayServiceClient::connect("http://127.0.0.1:8090").await?;
//!     let resp = client
//!         .list(ListRelaysRequest {
//!             limit: 10,
//!             ..Default::default()
//!         })
//!         .await?;
//!     println!("{} relays", resp.get_ref().total_count);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod eui;
pub mod grpc;
pub mod store;

/// Generated protocol buffer code
pub mod proto {
    pub mod api {
        tonic::include_proto!("api");

        /// Serialized file descriptor set, registered with the gRPC
        /// reflection service.
        pub const FILE_DESCRIPTOR_SET: &[u8] =
            tonic::include_file_descriptor_set!("relay_descriptor");
    }
}

pub use proto::api;
