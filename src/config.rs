//! Server configuration.
//!
//! Loaded from a YAML file named by `HTTPWIRE_CONFIG` (every field has a
//! default, so the file is optional), then adjusted by the `PORT`
//! environment variable.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::http::reader::{DEFAULT_MAX_REQUEST_SIZE, DEFAULT_READ_BUFFER_SIZE, ReadLimits};

pub const CONFIG_ENV: &str = "HTTPWIRE_CONFIG";
pub const PORT_ENV: &str = "PORT";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub proxy: ProxyConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Bytes requested from the socket per read.
    pub read_buffer_size: usize,
    /// Largest request line plus headers accepted before giving up.
    pub max_request_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 42069,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            max_request_size: DEFAULT_MAX_REQUEST_SIZE,
        }
    }
}

impl ServerConfig {
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn read_limits(&self) -> ReadLimits {
        ReadLimits {
            read_buffer_size: self.read_buffer_size,
            max_request_size: self.max_request_size,
        }
    }
}

/// Where the demo proxy route forwards to.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Request targets starting with this prefix are proxied.
    pub prefix: String,
    /// Base URL of the upstream. Only plain `http` is supported.
    pub upstream: String,
    pub connect_timeout_ms: u64,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            prefix: "/httpbin".to_string(),
            upstream: "http://httpbin.org".to_string(),
            connect_timeout_ms: 5000,
        }
    }
}

impl ProxyConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn upstream_url(&self) -> Result<url::Url> {
        url::Url::parse(&self.upstream)
            .with_context(|| format!("invalid upstream URL: {}", self.upstream))
    }
}

impl Config {
    /// Loads the file named by `HTTPWIRE_CONFIG` (or defaults), then applies `PORT`.
    pub fn load() -> Result<Self> {
        let mut cfg = match std::env::var(CONFIG_ENV) {
            Ok(path) => Self::from_file(&path)?,
            Err(_) => Self::default(),
        };
        cfg.apply_port_override(std::env::var(PORT_ENV).ok().as_deref())?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_yaml_str(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        let cfg: Config = serde_yaml::from_str(contents)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn apply_port_override(&mut self, port: Option<&str>) -> Result<()> {
        if let Some(port) = port {
            self.server.port = port
                .trim()
                .parse()
                .with_context(|| format!("invalid {} value: {}", PORT_ENV, port))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.read_buffer_size == 0 {
            anyhow::bail!("server.read_buffer_size must be greater than zero");
        }
        if self.server.max_request_size < self.server.read_buffer_size {
            anyhow::bail!(
                "server.max_request_size ({}) must be at least server.read_buffer_size ({})",
                self.server.max_request_size,
                self.server.read_buffer_size
            );
        }

        let url = self.proxy.upstream_url()?;
        if url.scheme() != "http" {
            anyhow::bail!("proxy.upstream must use http, got {}", url.scheme());
        }
        if url.host_str().is_none() {
            anyhow::bail!("proxy.upstream is missing a host");
        }
        if !self.proxy.prefix.starts_with('/') {
            anyhow::bail!("proxy.prefix must start with '/'");
        }

        Ok(())
    }
}
