use std::time::Duration;

use hostsdb_storage::{PoolSettings, StorageConfig};
use serde::Deserialize;
use thiserror::Error;

use crate::server::service::ErrorStatusMode;

/// Datastore used when no configuration file exists
pub const DEFAULT_DATABASE_URL: &str = "postgres://msf@127.0.0.1:5433/msf?sslmode=disable";

/// Listen address used when none is configured
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:9090";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("bind_address is required but not provided")]
    MissingBindAddress,

    #[error("database.url is required but not provided")]
    MissingDatabaseUrl,

    #[error("Storage configuration error: {0}")]
    StorageConfig(#[from] hostsdb_storage::ConfigError),
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// How API errors map onto HTTP status codes
    #[serde(default)]
    pub error_status: ErrorStatusMode,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            error_status: ErrorStatusMode::default(),
        }
    }
}

fn default_bind_address() -> String {
    DEFAULT_BIND_ADDRESS.to_string()
}

/// Datastore connection and pool configuration
///
/// `url` is a `postgres://` URL or a `sqlite://` URL (`sqlite://:memory:`
/// for an in-memory database).
#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,

    /// Seconds a request may wait for a pooled connection
    #[serde(default)]
    pub acquire_timeout_secs: Option<u64>,

    /// Close pooled connections older than this many seconds
    #[serde(default)]
    pub max_lifetime_secs: Option<u64>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_DATABASE_URL.to_string(),
            acquire_timeout_secs: None,
            max_lifetime_secs: None,
        }
    }
}

impl DatabaseConfig {
    /// Parse the URL into a backend and connection string
    pub fn storage_config(&self) -> Result<StorageConfig, ConfigError> {
        Ok(StorageConfig::from_url(&self.url)?)
    }

    pub fn pool_settings(&self) -> PoolSettings {
        let mut settings = PoolSettings::default()
            .with_max_lifetime(self.max_lifetime_secs.map(Duration::from_secs));
        if let Some(secs) = self.acquire_timeout_secs {
            settings = settings.with_acquire_timeout(Duration::from_secs(secs));
        }
        settings
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check required fields and that the database URL parses
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.bind_address.trim().is_empty() {
            return Err(ConfigError::MissingBindAddress);
        }
        if self.database.url.trim().is_empty() {
            return Err(ConfigError::MissingDatabaseUrl);
        }
        self.database.storage_config()?;
        Ok(())
    }
}
