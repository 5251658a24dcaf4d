//! Application configuration management.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::types::Currency;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Cash register reconciliation settings.
    #[serde(default)]
    pub register: RegisterConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Cash register reconciliation settings.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterConfig {
    /// Maximum absolute aggregate difference a closing may show and still be
    /// considered balanced.
    #[serde(default = "default_tolerance")]
    pub tolerance: Decimal,
    /// Currency the registers operate in.
    #[serde(default = "default_currency")]
    pub currency: Currency,
    /// Opening float suggested for a register with no previous session.
    #[serde(default = "default_opening_float")]
    pub default_opening_float: BTreeMap<String, Decimal>,
    /// How many times a close recomputes its summary when ledger writes race it.
    #[serde(default = "default_max_close_attempts")]
    pub max_close_attempts: u32,
}

impl Default for RegisterConfig {
    fn default() -> Self {
        Self {
            tolerance: default_tolerance(),
            currency: default_currency(),
            default_opening_float: default_opening_float(),
            max_close_attempts: default_max_close_attempts(),
        }
    }
}

fn default_tolerance() -> Decimal {
    Decimal::from(5000)
}

fn default_currency() -> Currency {
    Currency::Cop
}

fn default_opening_float() -> BTreeMap<String, Decimal> {
    BTreeMap::from([("cash".to_string(), Decimal::from(500_000))])
}

fn default_max_close_attempts() -> u32 {
    3
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("CUADRA").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
