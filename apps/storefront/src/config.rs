//! Storefront configuration.
//!
//! Configuration is loaded from environment variables (optionally via a
//! `.env` file) with fallback to defaults.
//!
//! | Variable                      | Default      |
//! |-------------------------------|--------------|
//! | `DEPOT_HOST`                  | `0.0.0.0`    |
//! | `DEPOT_PORT`                  | `8080`       |
//! | `DEPOT_DB_PATH`               | `./depot.db` |
//! | `DEPOT_DB_MAX_CONNECTIONS`    | `5`          |
//! | `DEPOT_JERIGEN_FEE`           | `20000`      |
//! | `DEPOT_JERIGEN_MODE`          | `per_line`   |
//! | `DEPOT_REQUEST_TIMEOUT_SECS`  | `30`         |

use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use depot_core::validation::validate_price;
use depot_core::{JerigenMode, Money, PricingPolicy};
use thiserror::Error;

/// Storefront configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Address to bind
    pub host: IpAddr,

    /// Port to listen on
    pub port: u16,

    /// SQLite database file
    pub db_path: PathBuf,

    /// Connection pool size
    pub db_max_connections: u32,

    /// Fee charged per container
    pub jerigen_fee: Money,

    /// Whether the fee is charged per flagged line or per unit
    pub jerigen_mode: JerigenMode,

    /// Upper bound on a single request
    pub request_timeout: Duration,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        let config = StorefrontConfig {
            host: var("DEPOT_HOST", "0.0.0.0")
                .parse()
                .map_err(|_| ConfigError::InvalidValue("DEPOT_HOST".to_string()))?,

            port: var("DEPOT_PORT", "8080")
                .parse()
                .map_err(|_| ConfigError::InvalidValue("DEPOT_PORT".to_string()))?,

            db_path: PathBuf::from(var("DEPOT_DB_PATH", "./depot.db")),

            db_max_connections: var("DEPOT_DB_MAX_CONNECTIONS", "5")
                .parse()
                .map_err(|_| ConfigError::InvalidValue("DEPOT_DB_MAX_CONNECTIONS".to_string()))?,

            jerigen_fee: var("DEPOT_JERIGEN_FEE", "20000")
                .parse::<i64>()
                .ok()
                .map(Money::from_minor)
                .filter(|fee| validate_price("jerigen_fee", *fee).is_ok())
                .ok_or_else(|| ConfigError::InvalidValue("DEPOT_JERIGEN_FEE".to_string()))?,

            jerigen_mode: parse_jerigen_mode(&var("DEPOT_JERIGEN_MODE", "per_line"))?,

            request_timeout: var("DEPOT_REQUEST_TIMEOUT_SECS", "30")
                .parse()
                .map(Duration::from_secs)
                .map_err(|_| ConfigError::InvalidValue("DEPOT_REQUEST_TIMEOUT_SECS".to_string()))?,
        };

        if config.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue("DEPOT_DB_MAX_CONNECTIONS".to_string()));
        }

        Ok(config)
    }

    /// Returns the socket address to bind.
    #[must_use]
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Returns the pricing policy derived from this configuration.
    #[must_use]
    pub fn pricing_policy(&self) -> PricingPolicy {
        PricingPolicy::new(self.jerigen_fee, self.jerigen_mode)
    }
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        let policy = PricingPolicy::default();
        StorefrontConfig {
            host: IpAddr::from([0, 0, 0, 0]),
            port: 8080,
            db_path: PathBuf::from("./depot.db"),
            db_max_connections: 5,
            jerigen_fee: policy.jerigen_fee,
            jerigen_mode: policy.jerigen_mode,
            request_timeout: Duration::from_secs(30),
        }
    }
}

fn parse_jerigen_mode(value: &str) -> Result<JerigenMode, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "per_line" => Ok(JerigenMode::PerLine),
        "per_unit" => Ok(JerigenMode::PerUnit),
        _ => Err(ConfigError::InvalidValue("DEPOT_JERIGEN_MODE".to_string())),
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}
