//! Configuration loading from `~/.agentlink/config.toml` with defaults.
//!
//! The orchestrator itself only consumes [`AgentConfig::request_timeout`].
//! The `[network]` table and the key/certificate paths are read by whatever
//! hosts the agent (the CLI) to build its transport and load key material.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Default per-request deadline.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

/// Top-level agent configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Deadline for each outbound request, in milliseconds.
    pub request_timeout_ms: u64,
    /// Path to the agent's key file (`{publicKey, secretKey}` JSON).
    pub key_file: Option<PathBuf>,
    /// Path to the agent's delegation certificate (JSON).
    pub certificate_file: Option<PathBuf>,
    /// TCP transport settings.
    pub network: NetworkConfig,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            key_file: None,
            certificate_file: None,
            network: NetworkConfig::default(),
        }
    }
}

impl AgentConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Override the request deadline.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }
}

/// `[network]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Address the TCP transport listens on.
    pub listen_addr: String,
    /// Pre-shared secret for peer handshakes. Empty disables the TCP transport.
    pub shared_secret: String,
    /// Peers to connect to at startup.
    pub bootstrap_peers: Vec<String>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:4300".to_string(),
            shared_secret: String::new(),
            bootstrap_peers: Vec::new(),
        }
    }
}

/// Load configuration from a TOML file, falling back to defaults.
///
/// A missing, unreadable or invalid file is logged and yields
/// [`AgentConfig::default`]; it is never an error.
pub fn load_config(path: Option<&Path>) -> AgentConfig {
    let config_path = path
        .map(|p| p.to_path_buf())
        .unwrap_or_else(default_config_path);

    if !config_path.exists() {
        info!(
            path = %config_path.display(),
            "Config file not found, using defaults"
        );
        return AgentConfig::default();
    }

    match std::fs::read_to_string(&config_path) {
        Ok(contents) => match toml::from_str::<AgentConfig>(&contents) {
            Ok(config) => {
                info!(path = %config_path.display(), "Loaded configuration");
                config
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    path = %config_path.display(),
                    "Failed to parse config, using defaults"
                );
                AgentConfig::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                error = %e,
                path = %config_path.display(),
                "Failed to read config file, using defaults"
            );
            AgentConfig::default()
        }
    }
}

/// Get the default config file path.
pub fn default_config_path() -> PathBuf {
    agentlink_home().join("config.toml")
}

/// Get the default AgentLink home directory.
pub fn agentlink_home() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(".agentlink")
}
