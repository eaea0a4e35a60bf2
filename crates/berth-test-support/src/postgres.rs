//! Disposable Postgres databases for integration tests.
//!
//! Each call creates a uniquely named database on the server named by
//! `BERTH_TEST_DATABASE_URL` and drops it when the handle goes away. Tests
//! skip (with an `eprintln!`) when the variable is unset or the server is
//! unreachable.

use std::str::FromStr;
use std::thread;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result, anyhow};
use postgres::NoTls;
use url::Url;

/// Environment variable naming the server used for Postgres-backed tests.
pub const TEST_DATABASE_URL_ENV: &str = "BERTH_TEST_DATABASE_URL";

/// Handle to a disposable database. Dropping it drops the database.
pub struct TestDatabase {
    connection_string: String,
    admin_url: String,
    database: String,
}

impl TestDatabase {
    /// Connection string that can be passed to `sqlx` or other Postgres clients.
    #[must_use]
    pub fn connection_string(&self) -> &str {
        &self.connection_string
    }

    /// Name of the created database.
    #[must_use]
    pub fn database(&self) -> &str {
        &self.database
    }
}

impl Drop for TestDatabase {
    fn drop(&mut self) {
        let statement = format!("DROP DATABASE IF EXISTS \"{}\" WITH (FORCE)", self.database);
        let _ = run_admin_statement(&self.admin_url, statement);
    }
}

/// Create a disposable database on the configured server.
///
/// # Errors
///
/// Returns an error when `BERTH_TEST_DATABASE_URL` is unset or invalid, or
/// when the database cannot be created.
pub fn start_postgres() -> Result<TestDatabase> {
    let base = std::env::var(TEST_DATABASE_URL_ENV)
        .with_context(|| format!("{TEST_DATABASE_URL_ENV} is not set"))?;
    create_unique_database(&base)
}

fn create_unique_database(base_url: &str) -> Result<TestDatabase> {
    let parsed = Url::parse(base_url).context("invalid postgres connection url")?;
    let database = unique_database_name();

    let mut database_url = parsed.clone();
    database_url.set_path(&format!("/{database}"));

    let mut admin = parsed;
    admin.set_path("/postgres");
    let admin_url = admin.to_string();

    run_admin_statement(&admin_url, format!("CREATE DATABASE \"{database}\""))
        .context("failed to create test database")?;

    Ok(TestDatabase {
        connection_string: database_url.to_string(),
        admin_url,
        database,
    })
}

// The blocking client must not run on an async runtime thread.
fn run_admin_statement(admin_url: &str, statement: String) -> Result<()> {
    let admin = admin_url.to_string();
    thread::spawn(move || -> Result<()> {
        let config = postgres::Config::from_str(&admin)?;
        let mut client = config.connect(NoTls)?;
        client.simple_query(&statement).map(|_| ())?;
        Ok(())
    })
    .join()
    .unwrap_or_else(|_| Err(anyhow!("admin statement thread panicked")))
}

fn unique_database_name() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let pid = std::process::id();
    format!("berth_test_{pid}_{nanos}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_names_are_unique_and_prefixed() {
        let first = unique_database_name();
        let second = unique_database_name();
        assert!(first.starts_with("berth_test_"));
        assert_ne!(first, second);
    }

    #[test]
    fn invalid_urls_are_rejected() {
        assert!(create_unique_database("not a url").is_err());
    }
}
