//! LoRaWAN Relay Management Service
//!
//! Main entry point for the relay management service. The service exposes
//! the `api.RelayService` gRPC API for listing relays and managing the
//! end-devices they forward traffic for, backed by an in-memory device
//! registry seeded from configuration.
//!
//! # Architecture
//! The service is built using:
//! - gRPC (tonic) for the API surface, with server reflection
//! - An in-memory device registry shared across handlers
//! - YAML configuration with environment overrides
//!
//! # Flow
//! 1. Configuration is loaded and logging initialized
//! 2. Seed devices from the configuration are registered
//! 3. The gRPC server starts serving the relay API

use anyhow::Context;
use chrono::Utc;
use tonic::transport::Server;
use tracing::info;
use tracing_subscriber::EnvFilter;

use lorawan_relay_service::api::relay_service_server::RelayServiceServer;
use lorawan_relay_service::api::FILE_DESCRIPTOR_SET;
use lorawan_relay_service::config::Config;
use lorawan_relay_service::grpc::RelayServer;
use lorawan_relay_service::store::{Device, DeviceStore};

/// Initializes the logging system.
///
/// Installs a tracing subscriber whose filter comes from the configured
/// level; a `RUST_LOG` environment directive takes precedence.
///
/// # Returns
/// * `Result<()>` - Success or error if logging setup fails
fn setup_logging(level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(true)
        .with_line_number(true)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {}", e))
}

/// Builds the device registry and starts the gRPC server.
///
/// Registers the configured seed devices, then serves the relay API plus
/// the server reflection service on the configured bind address.
///
/// # Arguments
/// * `config` - Application configuration
///
/// # Returns
/// * `Result<()>` - Success or error if the server fails to start
async fn setup_services(config: Config) -> anyhow::Result<()> {
    let store = DeviceStore::new();

    for seed in &config.devices {
        store
            .create_device(Device {
                dev_eui: seed.dev_eui,
                name: seed.name.clone(),
                application_id: seed.application_id,
                region: seed.region.clone(),
                is_relay: seed.is_relay,
                created_at: Utc::now(),
            })
            .await
            .with_context(|| format!("registering seed device {}", seed.dev_eui))?;
    }
    info!("Registered {} seed device(s)", config.devices.len());

    let addr = config
        .bind_addr()
        .parse()
        .with_context(|| format!("parsing bind address {}", config.bind_addr()))?;

    let reflection = tonic_reflection::server::Builder::configure()
        .register_encoded_file_descriptor_set(FILE_DESCRIPTOR_SET)
        .build_v1()
        .context("building the reflection service")?;

    info!("Starting gRPC server on {}", addr);

    Server::builder()
        .add_service(RelayServiceServer::new(RelayServer::new(store)))
        .add_service(reflection)
        .serve(addr)
        .await?;

    Ok(())
}

/// Main entry point for the relay management service.
///
/// # Flow
/// 1. Loads configuration and initializes logging
/// 2. Registers seed devices into the registry
/// 3. Starts the gRPC server
///
/// # Returns
/// * `Result<()>` - Success or error if the service fails to start
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::new().context("loading configuration")?;
    setup_logging(&config.logging.level)?;

    info!(
        "{} v{} starting up...",
        config.application.name,
        env!("CARGO_PKG_VERSION")
    );

    setup_services(config).await
}
