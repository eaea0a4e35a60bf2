//! Application configuration model and loaders.

use std::net::{IpAddr, SocketAddr};

use berth_telemetry::LogFormat;
use tracing::debug;

use crate::defaults::{
    DEFAULT_BIND_ADDR, DEFAULT_DB_MAX_CONNECTIONS, DEFAULT_HTTP_PORT, ENV_BIND_ADDR,
    ENV_DATABASE_URL, ENV_DB_MAX_CONNECTIONS, ENV_HTTP_PORT, ENV_LOG_FORMAT, ENV_LOG_LEVEL,
};
use crate::error::{ConfigError, ConfigResult};

/// Settings required to boot the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Postgres connection string.
    pub database_url: String,
    /// HTTP listen address.
    pub bind_addr: IpAddr,
    /// HTTP listen port.
    pub http_port: u16,
    /// Log level used when `RUST_LOG` is unset.
    pub log_level: String,
    /// Log output format.
    pub log_format: LogFormat,
    /// Upper bound for pooled database connections.
    pub db_max_connections: u32,
}

impl AppConfig {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `MissingEnv` when `DATABASE_URL` is unset and `InvalidField`
    /// for malformed optional values.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`AppConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let database_url = read(ENV_DATABASE_URL).ok_or(ConfigError::MissingEnv {
            name: ENV_DATABASE_URL,
        })?;

        let bind_addr = read(ENV_BIND_ADDR).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_addr
            .trim()
            .parse::<IpAddr>()
            .map_err(|_| ConfigError::InvalidField {
                field: ENV_BIND_ADDR,
                value: Some(bind_addr.clone()),
                reason: "not_an_ip_address",
            })?;

        let http_port = match read(ENV_HTTP_PORT) {
            None => DEFAULT_HTTP_PORT,
            Some(raw) => parse_port(&raw)?,
        };

        let log_level = read(ENV_LOG_LEVEL)
            .unwrap_or_else(|| berth_telemetry::DEFAULT_LOG_LEVEL.to_string());

        let log_format = match read(ENV_LOG_FORMAT) {
            None => LogFormat::infer(),
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidField {
                field: ENV_LOG_FORMAT,
                value: Some(raw.clone()),
                reason: "unsupported_format",
            })?,
        };

        let db_max_connections = match read(ENV_DB_MAX_CONNECTIONS) {
            None => DEFAULT_DB_MAX_CONNECTIONS,
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(value) if value > 0 => value,
                _ => {
                    return Err(ConfigError::InvalidField {
                        field: ENV_DB_MAX_CONNECTIONS,
                        value: Some(raw),
                        reason: "must_be_positive",
                    });
                }
            },
        };

        let config = Self {
            database_url,
            bind_addr,
            http_port,
            log_level,
            log_format,
            db_max_connections,
        };
        debug!(
            bind_addr = %config.bind_addr,
            http_port = config.http_port,
            db_max_connections = config.db_max_connections,
            "configuration loaded"
        );
        Ok(config)
    }

    /// Socket address the HTTP server binds to.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.http_port)
    }
}

fn parse_port(raw: &str) -> ConfigResult<u16> {
    match raw.trim().parse::<u16>() {
        Ok(port) if port > 0 => Ok(port),
        _ => Err(ConfigError::InvalidField {
            field: ENV_HTTP_PORT,
            value: Some(raw.to_string()),
            reason: "must_be_between_1_and_65535",
        }),
    }
}
