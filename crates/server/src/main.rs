//! Pollutant server - water pollutant prediction form
//!
//! Loads the model and schema artifacts once, then serves the prediction
//! form until interrupted.

use anyhow::{Context, Result};
use pollutant_lib::{
    artifacts::load_artifacts,
    health::{components, HealthRegistry},
    observability::StructuredLogger,
    predictor::PredictionService,
};
use pollutant_server::{api, config::ServerConfig};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting pollutant-server");

    let config = ServerConfig::load()?;
    info!(
        model = %config.model_path.display(),
        schema = %config.schema_path.display(),
        strict_station = config.strict_station,
        "Server configured"
    );

    let logger = StructuredLogger::new("server");
    logger.log_startup(SERVER_VERSION);

    let health_registry = HealthRegistry::new();
    health_registry.register(components::PREDICTOR).await;

    // Artifacts are required; a failure here stops the process
    let artifacts = load_artifacts(&config.artifact_config()).map_err(|e| {
        error!(error = %e, "Failed to load artifacts");
        e
    })?;
    logger.log_artifacts_loaded(artifacts.model.version(), artifacts.schema.columns());

    let service = PredictionService::new(
        artifacts.schema.clone(),
        artifacts.model.clone(),
        config.station_policy(),
        logger.clone(),
    )
    .context("Model and schema do not fit together")?;

    health_registry.mark_loaded(service.model_version()).await;

    let app_state = Arc::new(api::AppState::new(Arc::new(service), health_registry.clone()));

    tokio::select! {
        result = api::serve(config.api_port, app_state) => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            health_registry.set_ready(false).await;
            logger.log_shutdown("SIGINT received");
        }
    }

    info!("Shutting down");
    Ok(())
}
