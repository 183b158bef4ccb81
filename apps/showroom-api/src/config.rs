//! API configuration module.
//!
//! Configuration is loaded from `SHOWROOM_*` environment variables with
//! fallback to defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use showroom_core::PointsRate;
use showroom_db::DbConfig;

/// Upper bound applied to any `?limit=` a caller sends.
pub const MAX_PAGE_LIMIT: u32 = 200;

/// API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Interface to bind
    pub bind_address: String,

    /// HTTP port
    pub port: u16,

    /// SQLite database file
    pub database_path: PathBuf,

    /// Pool size
    pub max_connections: u32,

    /// How long a writer waits on a locked database before giving up
    pub busy_timeout_ms: u64,

    /// HS256 secret shared with the token issuer
    pub jwt_secret: String,

    /// Points earned per currency unit, in basis points
    pub points_rate_bps: u32,

    /// Page size when a listing has no `?limit=`
    pub default_page_limit: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            bind_address: "0.0.0.0".to_string(),
            port: 8080,
            database_path: PathBuf::from("showroom.db"),
            max_connections: 5,
            busy_timeout_ms: 5_000,
            jwt_secret: "showroom-dev-secret-change-in-production".to_string(),
            points_rate_bps: showroom_core::DEFAULT_POINTS_RATE_BPS,
            default_page_limit: 50,
        }
    }
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = ApiConfig::default();

        let config = ApiConfig {
            bind_address: lookup("SHOWROOM_BIND_ADDRESS").unwrap_or(defaults.bind_address),

            port: parse_or(&lookup, "SHOWROOM_PORT", defaults.port)?,

            database_path: lookup("SHOWROOM_DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.database_path),

            max_connections: parse_or(&lookup, "SHOWROOM_MAX_CONNECTIONS", defaults.max_connections)?,

            busy_timeout_ms: parse_or(&lookup, "SHOWROOM_BUSY_TIMEOUT_MS", defaults.busy_timeout_ms)?,

            // In production this MUST be set
            jwt_secret: lookup("SHOWROOM_JWT_SECRET").unwrap_or(defaults.jwt_secret),

            points_rate_bps: parse_or(&lookup, "SHOWROOM_POINTS_RATE_BPS", defaults.points_rate_bps)?,

            default_page_limit: parse_or(
                &lookup,
                "SHOWROOM_DEFAULT_PAGE_LIMIT",
                defaults.default_page_limit,
            )?,
        };

        if config.max_connections == 0 {
            return Err(ConfigError::InvalidValue("SHOWROOM_MAX_CONNECTIONS".to_string()));
        }
        if config.default_page_limit == 0 || config.default_page_limit > MAX_PAGE_LIMIT {
            return Err(ConfigError::InvalidValue("SHOWROOM_DEFAULT_PAGE_LIMIT".to_string()));
        }
        if config.jwt_secret.is_empty() {
            return Err(ConfigError::MissingRequired("SHOWROOM_JWT_SECRET".to_string()));
        }

        Ok(config)
    }

    /// Socket address to listen on.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.bind_address, self.port)
            .parse()
            .map_err(|_| ConfigError::InvalidValue("SHOWROOM_BIND_ADDRESS".to_string()))
    }

    /// Configured points rate.
    pub fn points_rate(&self) -> PointsRate {
        PointsRate::from_bps(self.points_rate_bps)
    }

    /// Database settings derived from this configuration.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(self.database_path.clone())
            .max_connections(self.max_connections)
            .busy_timeout(Duration::from_millis(self.busy_timeout_ms))
            .points_rate(self.points_rate())
    }

    /// Clamps a caller-supplied page size.
    pub fn page_limit(&self, requested: Option<u32>) -> u32 {
        requested
            .unwrap_or(self.default_page_limit)
            .clamp(1, MAX_PAGE_LIMIT)
    }
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
