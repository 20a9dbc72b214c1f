//! Service configuration

use crate::ServiceError;
use gps_device::DeviceConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable naming the config file (without extension)
pub const CONFIG_PATH_ENV: &str = "GPS_SERVICE_CONFIG";

/// Service settings, layered as defaults < config file < `GPS__*` env vars
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Receiver and pipeline settings
    pub device: DeviceConfig,

    /// Scheduler back-off after a tick with no work (milliseconds)
    pub idle_interval_ms: u64,

    /// Period of the status log line (seconds)
    pub status_interval_secs: u64,

    /// Upper bound on waiting for the reader thread at shutdown (seconds)
    pub shutdown_timeout_secs: u64,

    /// Bind address for the JSON API
    pub http_addr: String,

    /// Default log filter when `RUST_LOG` is unset
    pub log_level: String,

    /// Emit JSON log lines
    pub log_json: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            device: DeviceConfig::default(),
            idle_interval_ms: 100,
            status_interval_secs: 10,
            shutdown_timeout_secs: 5,
            http_addr: "0.0.0.0:8080".to_string(),
            log_level: "info".to_string(),
            log_json: false,
        }
    }
}

impl ServiceConfig {
    /// Load from `$GPS_SERVICE_CONFIG` (default `gps-service`) and the environment
    pub fn load() -> Result<Self, ServiceError> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| "gps-service".to_string());
        Self::load_from(&path)
    }

    /// Load from a config file (any format the `config` crate detects) and
    /// the environment. A missing file is not an error.
    pub fn load_from(path: &str) -> Result<Self, ServiceError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("GPS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.device.validate()?;
        Ok(config)
    }

    pub fn idle_interval(&self) -> Duration {
        Duration::from_millis(self.idle_interval_ms)
    }

    pub fn status_interval(&self) -> Duration {
        Duration::from_secs(self.status_interval_secs)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}
