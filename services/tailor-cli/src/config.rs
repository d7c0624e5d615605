//! Configuration types and loading
//!
//! Config precedence: env vars > config file > defaults.
//! The base URL may come from API_BASE_URL so one config file can serve
//! several deployments.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tailor_gateway::GatewayConfig;

/// Root configuration
#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub gateway: GatewayConfig,
    pub storage: StorageConfig,
}

/// Session storage settings
#[derive(Debug, Deserialize)]
pub struct StorageConfig {
    /// JSON file holding the access token, refresh token and cached user
    pub path: PathBuf,
}

impl Config {
    /// Load configuration from a TOML file, then overlay environment variables.
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)?;

        if let Ok(base_url) = std::env::var("API_BASE_URL") {
            config.gateway.base_url = Some(base_url);
        }

        config.gateway.validate().map_err(|e| match e {
            tailor_gateway::Error::Config(msg) => common::Error::Config(msg),
            other => common::Error::Config(other.to_string()),
        })?;

        Ok(config)
    }

    /// Resolve config file path from CLI arg or CONFIG_PATH env var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return PathBuf::from(p);
        }
        PathBuf::from("tailor-api.toml")
    }
}
