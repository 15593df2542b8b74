//! Runtime Configuration Module
//!
//! Provides configuration loading for actor systems. Supports loading from a
//! TOML file with `ACTORS_`-prefixed environment overrides
//! (e.g. `ACTORS_REMOTE__PORT=9000`).

use crate::defaults;
use anyhow::{Context, Result};
use config_crate::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Network coordinates a system advertises in the paths of its actors
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct RemoteConfig {
    /// Dotted IPv4 address
    pub host: String,
    pub port: u16,
}

impl RemoteConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Coordinates used when no remoting is configured (`0.0.0.0:0000`)
    pub fn unspecified() -> Self {
        Self::new(defaults::UNSPECIFIED_HOST, defaults::UNSPECIFIED_PORT)
    }

    /// Base URL of the command endpoint served at these coordinates
    pub fn command_url(&self) -> String {
        format!("http://{}:{}{}", self.host, self.port, defaults::COMMAND_ROUTE)
    }
}

/// Top-level runtime configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub system: SystemSettings,

    /// Remoting is disabled when absent
    pub remote: Option<RemoteSettings>,

    pub logging: LoggingSettings,
}

/// Actor system settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SystemSettings {
    pub name: String,
    pub mailbox_size: usize,
}

/// Remote endpoint settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RemoteSettings {
    pub host: String,
    pub port: u16,
    pub timeout_ms: u64,
}

/// Logging settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
}

impl Default for SystemSettings {
    fn default() -> Self {
        Self {
            name: "system".to_string(),
            mailbox_size: defaults::MAILBOX_SIZE,
        }
    }
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9000,
            timeout_ms: defaults::REMOTE_TIMEOUT_MS,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
        }
    }
}

impl RemoteSettings {
    pub fn remote_config(&self) -> RemoteConfig {
        RemoteConfig::new(self.host.clone(), self.port)
    }
}

impl RuntimeConfig {
    /// Load configuration from an optional TOML file with environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            info!("Loading runtime config: {:?}", path);
            builder = builder.add_source(File::from(path).required(true));
        }

        // Override with environment variables (ACTORS_ prefix, `__` nesting)
        builder = builder.add_source(
            Environment::with_prefix(defaults::ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .context("Failed to build configuration")?;

        let runtime: RuntimeConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        runtime.validate()?;
        debug!(
            system = %runtime.system.name,
            remote = runtime.remote.is_some(),
            "Runtime configuration loaded"
        );
        Ok(runtime)
    }

    /// Reject values the runtime cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.system.name.is_empty()
            || !self
                .system
                .name
                .chars()
                .all(|c| c.is_alphanumeric() || c == '_')
        {
            anyhow::bail!("Invalid system name: {:?}", self.system.name);
        }
        if self.system.mailbox_size == 0 {
            anyhow::bail!("Mailbox size must be greater than zero");
        }
        if let Some(remote) = &self.remote {
            remote
                .host
                .parse::<std::net::Ipv4Addr>()
                .with_context(|| format!("Invalid remote host: {}", remote.host))?;
            if remote.timeout_ms == 0 {
                anyhow::bail!("Remote timeout must be greater than zero");
            }
        }
        Ok(())
    }

    /// Coordinates to advertise, if remoting is enabled
    pub fn remote_config(&self) -> Option<RemoteConfig> {
        self.remote.as_ref().map(RemoteSettings::remote_config)
    }

    /// Render the effective configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to render configuration")
    }
}
