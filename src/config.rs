use crate::lipsync::{LipsyncConfig, TtsConfig};
use crate::osc::CaptureConfig;
use crate::session::{IdentityPolicy, SimulatorConfig};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Prefix for environment overrides, e.g. `VRM_RELAY__SERVICE__OSC__PORT=9001`
pub const ENV_PREFIX: &str = "VRM_RELAY";

/// Export the variables of a `.env` file into the process environment.
///
/// `None` searches the working directory and its parents. Variables that are
/// already set win over the file. Returns the file that was read, if any.
pub fn load_env_file(path: Option<&Path>) -> Option<PathBuf> {
    let loaded = match path {
        Some(path) => dotenvy::from_path(path).map(|_| path.to_path_buf()),
        None => dotenvy::dotenv(),
    };
    loaded.ok()
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub service: ServiceConfig,
    pub identities: IdentityPolicy,
    pub simulator: SimulatorConfig,
    pub capture: CaptureConfig,
    pub lipsync: LipsyncConfig,
    pub tts: TtsConfig,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub name: String,
    pub ws: ListenerConfig,
    pub osc: ListenerConfig,
    pub http: ListenerConfig,
    /// How long shutdown waits for in-flight cleanup
    pub shutdown_grace_ms: u64,
}

/// A listener address. Keys left out of a file or environment layer keep
/// their built-in values, so `[service.ws] bind = "127.0.0.1"` alone is valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListenerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    pub port: u16,
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}

impl ListenerConfig {
    fn new(port: u16) -> Self {
        Self {
            bind: default_bind(),
            port,
        }
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.bind, self.port)
            .parse()
            .with_context(|| format!("Invalid listen address {}:{}", self.bind, self.port))
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "vrm-relay".to_string(),
            ws: ListenerConfig::new(8080),
            osc: ListenerConfig::new(9000),
            http: ListenerConfig::new(3000),
            shutdown_grace_ms: 1000,
        }
    }
}

impl ServiceConfig {
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}

impl Config {
    /// Load defaults, then `path` (any format the config crate knows, if it
    /// exists), then `VRM_RELAY__*` environment variables. Layers merge key
    /// by key.
    pub fn load(path: &str) -> Result<Self> {
        let mut cfg = Self::read(path)?;
        cfg.finalize();
        Ok(cfg)
    }

    /// Same layering as [`Config::load`] without filling in derived values,
    /// so callers can apply further overrides first.
    pub fn read(path: &str) -> Result<Self> {
        let defaults = config::Config::try_from(&Config::default())
            .context("Failed to build default configuration")?;

        let settings = config::Config::builder()
            .add_source(defaults)
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to read configuration")?;

        settings
            .try_deserialize()
            .context("Failed to parse configuration")
    }

    /// Fill in values derived from other settings
    pub fn finalize(&mut self) {
        if self.lipsync.public_base_url.is_empty() {
            self.lipsync.public_base_url =
                format!("http://localhost:{}/audio", self.service.http.port);
        }
    }
}
