//! Connection and migration helpers.

use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, instrument};

use crate::error::{DataError, Result};

/// Open a connection pool.
///
/// # Errors
///
/// Returns `QueryFailed` if `PostgreSQL` cannot be reached.
#[instrument(name = "data.connect", skip(database_url))]
pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url)
        .await
        .map_err(|source| DataError::query("pool.connect", source))
}

/// Apply the bundled schema migrations.
///
/// # Errors
///
/// Returns `MigrationFailed` if a migration cannot be applied.
pub async fn apply_migrations(pool: &PgPool) -> Result<()> {
    let mut migrator = sqlx::migrate!("./migrations");
    migrator.set_ignore_missing(true);
    migrator
        .run(pool)
        .await
        .map_err(|source| DataError::MigrationFailed { source })?;
    info!("label schema migrations applied");
    Ok(())
}
