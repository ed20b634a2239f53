//! Service configuration

use anyhow::{Context, Result};
use serde::Deserialize;
use trend_lib::TrendConfig;

/// Service configuration
///
/// Read from an optional `trend-service.toml` and `TREND_*` environment
/// variables. Engine thresholds sit at the top level next to the server
/// settings, e.g. `TREND_PORT` and `TREND_NORMAL_MAX`.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Instance name attached to every log event
    #[serde(default = "default_instance_name")]
    pub instance_name: String,

    /// Bind address
    #[serde(default = "default_host")]
    pub host: String,

    /// API server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Engine thresholds applied when a request carries none
    #[serde(flatten)]
    pub engine: TrendConfig,
}

fn default_instance_name() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "trend-service".to_string())
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            instance_name: default_instance_name(),
            host: default_host(),
            port: default_port(),
            engine: TrendConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from config file and environment
    pub fn load() -> Result<Self> {
        Self::load_from("trend-service")
    }

    pub fn load_from(file: &str) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(file).required(false))
            .add_source(
                config::Environment::with_prefix("TREND")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to read service configuration")?;

        let config: ServiceConfig = config
            .try_deserialize()
            .context("Failed to parse service configuration")?;
        config
            .engine
            .validate()
            .context("Invalid engine thresholds in service configuration")?;
        Ok(config)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
