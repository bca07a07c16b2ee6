//! Core configuration types and loading.

use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

use super::defaults::{
    default_database_path, default_linerate, default_outbound_queue, default_port,
    default_reconnect_max, default_trigger,
};
use super::policy::PolicyDefaults;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Warden configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Who the warden is on the network.
    pub identity: IdentityConfig,
    /// Where to connect.
    pub network: NetworkConfig,
    /// Runtime behaviour (line pacing, command trigger, logging).
    #[serde(default)]
    pub general: GeneralConfig,
    /// Database configuration.
    pub database: Option<DatabaseConfig>,
    /// Defaults for newly joined channels.
    #[serde(default)]
    pub policy: PolicyDefaults,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        content.parse()
    }

    /// Nickname to register with, falling back to the identity nickname.
    pub fn nickname(&self) -> &str {
        self.network
            .nickname
            .as_deref()
            .unwrap_or(&self.identity.nickname)
    }

    /// USER name, falling back to the identity nickname.
    pub fn username(&self) -> &str {
        self.network
            .username
            .as_deref()
            .unwrap_or(&self.identity.nickname)
    }

    /// Realname, falling back to the identity nickname.
    pub fn realname(&self) -> &str {
        self.network
            .realname
            .as_deref()
            .unwrap_or(&self.identity.nickname)
    }

    /// Database path, defaulting to `warden.db`.
    pub fn database_path(&self) -> String {
        self.database
            .as_ref()
            .map(|d| d.path.clone())
            .unwrap_or_else(default_database_path)
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(toml::from_str(s)?)
    }
}

/// `[identity]` table.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityConfig {
    pub nickname: String,
}

/// `[network]` table.
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Server password (PASS).
    pub password: Option<String>,
    pub nickname: Option<String>,
    pub username: Option<String>,
    pub realname: Option<String>,
    /// Channels joined right after registration.
    #[serde(default)]
    pub channels: Vec<String>,
    /// Upper bound for the reconnect backoff, in seconds.
    #[serde(default = "default_reconnect_max")]
    pub reconnect_max_secs: u64,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// `[general]` table.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneralConfig {
    /// Seconds between outgoing lines (flood protection).
    #[serde(default = "default_linerate")]
    pub linerate: f64,
    /// Character that starts a command line.
    #[serde(default = "default_trigger")]
    pub trigger: char,
    /// Usernames that are made owners when they register.
    #[serde(default)]
    pub owners: Vec<String>,
    #[serde(default)]
    pub log_format: LogFormat,
    /// Capacity of the outbound directive queue.
    #[serde(default = "default_outbound_queue")]
    pub outbound_queue: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            linerate: default_linerate(),
            trigger: default_trigger(),
            owners: Vec::new(),
            log_format: LogFormat::default(),
            outbound_queue: default_outbound_queue(),
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to SQLite database file.
    pub path: String,
}
