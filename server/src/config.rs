//! Server configuration, read once from the environment at startup.

use std::env;
use std::fmt;
use std::time::Duration;

use thiserror::Error;

const DEFAULT_ADDRESS: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_ROUTE: &str = "/api/v1";
const DEFAULT_POOL_SIZE: u32 = 10;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 3;
const DEFAULT_SERVICE_NAME: &str = "cacahuete-api";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be a positive integer, got '{value}'")]
    InvalidNumber { name: &'static str, value: String },

    #[error("API_ROUTE must start with '/', got '{0}'")]
    InvalidRoute(String),
}

#[derive(Clone)]
pub struct Config {
    pub address: String,
    pub port: u16,
    /// Prefix every API route is nested under; empty means the root
    pub route: String,
    pub log_level: Option<String>,
    /// Postgres connection string; the in-memory store is used without one
    pub database_url: Option<String>,
    pub db_pool_size: u32,
    pub db_connect_timeout: Duration,
    pub otel_service_name: String,
    pub otel_endpoint: Option<String>,
    /// Bearer secret required on recipe routes when set
    pub shared_secret: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the configuration from any variable lookup. Blank values count
    /// as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let route = match var("API_ROUTE") {
            None => DEFAULT_ROUTE.to_string(),
            Some(route) if route.starts_with('/') => route.trim_end_matches('/').to_string(),
            Some(route) => return Err(ConfigError::InvalidRoute(route)),
        };

        Ok(Self {
            address: var("API_ADDRESS").unwrap_or_else(|| DEFAULT_ADDRESS.to_string()),
            port: parse_number("API_PORT", var("API_PORT"), DEFAULT_PORT)?,
            route,
            log_level: var("LOG_LEVEL"),
            database_url: var("DATABASE_URL"),
            db_pool_size: parse_number("DB_POOL_SIZE", var("DB_POOL_SIZE"), DEFAULT_POOL_SIZE)?,
            db_connect_timeout: Duration::from_secs(parse_number(
                "DB_CONNECT_TIMEOUT_SECS",
                var("DB_CONNECT_TIMEOUT_SECS"),
                DEFAULT_CONNECT_TIMEOUT_SECS,
            )?),
            otel_service_name: var("OTEL_SERVICE_NAME")
                .unwrap_or_else(|| DEFAULT_SERVICE_NAME.to_string()),
            otel_endpoint: var("OTEL_EXPORTER_OTLP_ENDPOINT"),
            shared_secret: var("JWT_SECRET"),
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }
}

fn parse_number<T>(name: &'static str, value: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd + From<u8>,
{
    let Some(value) = value else {
        return Ok(default);
    };
    match value.parse::<T>() {
        Ok(number) if number >= T::from(1) => Ok(number),
        _ => Err(ConfigError::InvalidNumber { name, value }),
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("address", &self.address)
            .field("port", &self.port)
            .field("route", &self.route)
            .field("log_level", &self.log_level)
            .field("database", &self.database_url.as_ref().map(|_| "<set>"))
            .field("db_pool_size", &self.db_pool_size)
            .field("db_connect_timeout", &self.db_connect_timeout)
            .field("otel_service_name", &self.otel_service_name)
            .field("otel_endpoint", &self.otel_endpoint)
            .field("shared_secret", &self.shared_secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
