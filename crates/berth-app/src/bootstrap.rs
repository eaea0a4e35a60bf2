//! Service wiring for the `berth` binary.

use std::sync::Arc;

use berth_api::ApiServer;
use berth_config::AppConfig;
use berth_data::{PgDirectory, PgLabelStore, PgPolicySource, connect};
use berth_labels::LabelService;
use berth_telemetry::{LoggingConfig, Metrics, init_logging};
use tracing::{error, info};

use crate::error::{AppError, AppResult};

/// Entry point for the Berth boot sequence.
///
/// # Errors
///
/// Returns an error if configuration, logging, persistence, or the API
/// listener fails.
pub async fn run_app() -> AppResult<()> {
    let config =
        AppConfig::from_env().map_err(|err| AppError::config("app_config.from_env", err))?;
    run_app_with(config).await
}

/// Boot sequence over an already loaded configuration.
pub(crate) async fn run_app_with(config: AppConfig) -> AppResult<()> {
    let logging = LoggingConfig {
        level: &config.log_level,
        format: config.log_format,
        build_sha: option_env!("BERTH_BUILD_SHA").unwrap_or("dev"),
    };
    init_logging(&logging).map_err(|err| AppError::telemetry("telemetry.init", err))?;

    info!(
        max_connections = config.db_max_connections,
        "Berth label service bootstrap starting"
    );

    let pool = connect(&config.database_url, config.db_max_connections)
        .await
        .map_err(|err| AppError::data("pool.connect", err))?;
    let store = PgLabelStore::new(pool.clone())
        .await
        .map_err(|err| AppError::data("label_store.new", err))?;
    let directory = Arc::new(PgDirectory::new(pool.clone()));
    let policies = Arc::new(PgPolicySource::new(pool.clone()));
    let labels = LabelService::new(Arc::new(store), directory.clone(), directory, policies);
    let telemetry =
        Metrics::new().map_err(|err| AppError::telemetry("telemetry.metrics", err))?;

    let addr = config.socket_addr();
    info!(addr = %addr, "Launching API listener");
    let serve_result = ApiServer::new(labels, telemetry)
        .serve(addr, shutdown_signal())
        .await;
    pool.close().await;
    serve_result.map_err(|err| AppError::api_server("api_server.serve", err))?;
    info!("API server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to install shutdown signal handler");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
