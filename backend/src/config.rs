//! Configuration management for the Inventory Purchasing Platform
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with PO_ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Storage backend selection
    pub storage: StorageConfig,

    /// Purchase order settings
    pub purchasing: PurchasingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    #[serde(default)]
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

/// Where items and orders are kept
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PurchasingConfig {
    /// Prefix for generated order numbers
    pub order_number_prefix: String,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("PO_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("storage.backend", "postgres")?
            .set_default("purchasing.order_number_prefix", "PO")?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (PO_ prefix)
            .add_source(
                Environment::with_prefix("PO")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.backend == StorageBackend::Postgres && self.database.url.is_empty() {
            return Err(ConfigError::Message(
                "database.url is required for the postgres storage backend".to_string(),
            ));
        }
        if self.purchasing.order_number_prefix.trim().is_empty() {
            return Err(ConfigError::Message(
                "purchasing.order_number_prefix must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// In-memory configuration for tests and local runs
    pub fn in_memory() -> Self {
        Self {
            environment: "test".to_string(),
            server: ServerConfig::default(),
            database: DatabaseConfig {
                url: String::new(),
                max_connections: 1,
                min_connections: 0,
            },
            storage: StorageConfig {
                backend: StorageBackend::Memory,
            },
            purchasing: PurchasingConfig {
                order_number_prefix: "PO".to_string(),
            },
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: "0.0.0.0".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_config_is_valid() {
        let config = Config::in_memory();
        assert!(config.validate().is_ok());
        assert_eq!(config.storage.backend, StorageBackend::Memory);
    }

    #[test]
    fn test_postgres_requires_url() {
        let mut config = Config::in_memory();
        config.storage.backend = StorageBackend::Postgres;
        assert!(config.validate().is_err());
        config.database.url = "postgres://localhost/purchasing".to_string();
        assert!(config.validate().is_ok());
    }
}
