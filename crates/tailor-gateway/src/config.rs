//! Gateway configuration
//!
//! Resolved once at process start by the host (see the `tailor-cli` service
//! for the TOML + env loader). A missing `base_url` is not rejected here: it
//! surfaces as `Error::Config` on the first call that needs it, so absolute
//! URLs keep working in a partially configured app.

use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Client identification sent in `X-Client` when none is configured.
pub const DEFAULT_CLIENT_NAME: &str = "tailor-shop-gateway";

/// Gateway settings
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// API base URL, e.g. `https://api.example.com/v1`
    #[serde(default)]
    pub base_url: Option<String>,
    /// Value of the `X-Client` header
    #[serde(default = "default_client_name")]
    pub client_name: String,
    /// Per-attempt HTTP timeout
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Upper bound on a refresh episode. Unset means waiters block until the
    /// refresh endpoint answers.
    #[serde(default)]
    pub refresh_timeout_secs: Option<u64>,
}

fn default_client_name() -> String {
    DEFAULT_CLIENT_NAME.to_string()
}

fn default_timeout() -> u64 {
    60
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            client_name: default_client_name(),
            timeout_secs: default_timeout(),
            refresh_timeout_secs: None,
        }
    }
}

impl GatewayConfig {
    /// Config with the given base URL and defaults elsewhere.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: Some(base_url.into()),
            ..Self::default()
        }
    }

    /// Check value ranges. Called by `Gateway::new`.
    pub fn validate(&self) -> Result<()> {
        if let Some(base) = self.base_url()
            && !crate::url::is_absolute(base)
        {
            return Err(Error::Config(format!(
                "base_url must start with http:// or https://, got: {base}"
            )));
        }
        if self.timeout_secs == 0 {
            return Err(Error::Config("timeout_secs must be greater than 0".into()));
        }
        if self.refresh_timeout_secs == Some(0) {
            return Err(Error::Config(
                "refresh_timeout_secs must be greater than 0".into(),
            ));
        }
        if self.client_name.trim().is_empty() {
            return Err(Error::Config("client_name must not be empty".into()));
        }
        Ok(())
    }

    /// Base URL with blank values treated as unset.
    pub fn base_url(&self) -> Option<&str> {
        self.base_url
            .as_deref()
            .map(str::trim)
            .filter(|b| !b.is_empty())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn refresh_timeout(&self) -> Option<Duration> {
        self.refresh_timeout_secs.map(Duration::from_secs)
    }
}
