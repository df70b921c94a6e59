//! Configuration module.
//!
//! Loads the service configuration from a YAML file layered with
//! `RELAY_`-prefixed environment variable overrides, including the seed list
//! of devices registered into the registry at startup.

use config::{Config as ConfigFile, Environment, File};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::eui::EUI64;

/// Application metadata configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Application {
    /// Name of the application
    pub name: String,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Logging {
    /// Log level directive (trace, debug, info, warn, error)
    pub level: String,
}

/// gRPC server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GrpcConfig {
    /// Server configuration
    pub server: ServerConfig,
}

/// Server bind configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Interface to bind
    pub endpoint: String,
    /// Server port
    pub port: u16,
}

/// A device record registered into the registry at startup
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeviceConfig {
    /// DevEUI (16 hex characters)
    pub dev_eui: EUI64,
    /// Device name
    pub name: String,
    /// Application the device belongs to
    pub application_id: Uuid,
    /// LoRaWAN region common-name (e.g. eu868)
    pub region: String,
    /// Whether the device is a relay
    #[serde(default)]
    pub is_relay: bool,
}

/// Service configuration settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Application metadata
    pub application: Application,
    /// Logging configuration
    pub logging: Logging,
    /// gRPC configuration
    pub grpc: GrpcConfig,
    /// Devices registered at startup
    #[serde(default)]
    pub devices: Vec<DeviceConfig>,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileError(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    ParseError(String),
    #[error("Missing required config value: {0}")]
    MissingConfig(String),
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

impl Config {
    /// Creates a new Config instance by loading and merging configuration
    /// from multiple sources.
    ///
    /// # Configuration Sources
    /// Configuration is loaded in the following order (later sources override
    /// earlier ones):
    /// 1. Base configuration (`config/application.yml`)
    /// 2. Environment variables (prefixed with `RELAY_`, nested keys
    ///    separated by `__`, e.g. `RELAY_GRPC__SERVER__PORT`)
    ///
    /// # Errors
    /// Returns a `ConfigError` if the configuration file cannot be read or
    /// the configuration values cannot be parsed.
    ///
    /// # Examples
    /// ```no_run
    /// use lorawan_relay_service::config::Config;
    ///
    /// let config = Config::new().expect("Failed to load configuration");
    /// println!("Binding to {}", config.bind_addr());
    /// ```
    pub fn new() -> Result<Self, ConfigError> {
        let builder = ConfigFile::builder()
            .add_source(File::with_name("config/application.yml"))
            .add_source(Environment::with_prefix("RELAY").separator("__"));

        let config = builder.build()?;
        config
            .try_deserialize()
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Returns the address the gRPC server binds to.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.grpc.server.endpoint, self.grpc.server.port)
    }
}
