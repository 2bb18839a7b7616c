//! Server configuration.
//!
//! Configuration comes from an optional YAML file named by `LINGER_CONFIG`.
//! Every field has a default, so an empty file is valid. The `LISTEN`
//! environment variable overrides `server.listen_addr`.
//!
//! ```yaml
//! server:
//!   listen_addr: "127.0.0.1:8080"
//!   idle_timeout_ms: 3000
//!   max_request_size: 8192
//! site:
//!   index: "<h1>hello</h1>"
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::http::buffer::DEFAULT_MAX_REQUEST_SIZE;

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";

/// Idle timeout applied both before the first byte and while a request is
/// still incomplete.
pub const DEFAULT_IDLE_TIMEOUT_MS: u64 = 3000;

pub const DEFAULT_INDEX: &str =
    "<!DOCTYPE html><html><body><h1>Hello from linger!</h1></body></html>";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub site: SiteConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub idle_timeout_ms: u64,
    pub max_request_size: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Body served for `/` and `/index.html`.
    pub index: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            idle_timeout_ms: DEFAULT_IDLE_TIMEOUT_MS,
            max_request_size: DEFAULT_MAX_REQUEST_SIZE,
        }
    }
}

impl ServerConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            index: DEFAULT_INDEX.to_string(),
        }
    }
}

impl Config {
    /// Loads configuration from `LINGER_CONFIG` (if set) and applies the
    /// `LISTEN` override.
    pub fn load() -> Result<Self> {
        let mut cfg = match std::env::var("LINGER_CONFIG") {
            Ok(path) => Self::from_file(&path)?,
            Err(_) => Self::default(),
        };

        if let Ok(listen_addr) = std::env::var("LISTEN") {
            cfg.server.listen_addr = listen_addr;
        }

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::from_yaml_str(&raw)
            .with_context(|| format!("parsing config file {}", path.display()))
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        // serde_yaml rejects an empty document; treat it as all defaults.
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let cfg: Config = serde_yaml::from_str(raw)?;
        Ok(cfg)
    }

    /// Checks field ranges.
    ///
    /// `listen_addr` must look like `host:port` with a numeric port. The host
    /// may be a name such as `localhost`. It is resolved when binding.
    pub fn validate(&self) -> Result<()> {
        let addr = &self.server.listen_addr;
        let (host, port) = addr
            .rsplit_once(':')
            .with_context(|| format!("listen_addr {:?} has no port", addr))?;
        if host.is_empty() {
            anyhow::bail!("listen_addr {:?} has no host", addr);
        }
        port.parse::<u16>()
            .with_context(|| format!("invalid port in listen_addr {:?}", addr))?;

        if self.server.idle_timeout_ms == 0 {
            anyhow::bail!("idle_timeout_ms must be greater than zero");
        }
        if self.server.max_request_size == 0 {
            anyhow::bail!("max_request_size must be greater than zero");
        }
        Ok(())
    }
}
