//! Environment variable names and defaults.

/// Postgres connection string (required).
pub const ENV_DATABASE_URL: &str = "DATABASE_URL";
/// Listen address for the HTTP server.
pub const ENV_BIND_ADDR: &str = "BERTH_BIND_ADDR";
/// Listen port for the HTTP server.
pub const ENV_HTTP_PORT: &str = "BERTH_HTTP_PORT";
/// Log level used when `RUST_LOG` is unset.
pub const ENV_LOG_LEVEL: &str = "BERTH_LOG_LEVEL";
/// Log output format (`json` or `pretty`).
pub const ENV_LOG_FORMAT: &str = "BERTH_LOG_FORMAT";
/// Upper bound for pooled database connections.
pub const ENV_DB_MAX_CONNECTIONS: &str = "BERTH_DB_MAX_CONNECTIONS";

/// Default listen address.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1";
/// Default listen port.
pub const DEFAULT_HTTP_PORT: u16 = 8080;
/// Default pool size.
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;
