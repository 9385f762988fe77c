//! AQI predictor server binary
//!
//! Loads the regression model, then serves the session API until SIGINT.
//! The process refuses to start if the model artifact cannot be loaded.

use anyhow::{Context, Result};
use aqi_lib::{
    health::{components, HealthRegistry},
    model::ModelWatcher,
    observability::{AqiMetrics, StructuredLogger},
    AqiClassifier, ModelRegistry,
};
use aqi_server::{api, config::ServerConfig};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting aqi-server");

    let config = ServerConfig::load()?;
    info!(
        model_path = %config.model_path.display(),
        api_port = config.api_port,
        watch_model = config.watch_model,
        session_idle_secs = config.session_idle_secs,
        "Server configured"
    );

    let classifier = AqiClassifier::standard().context("Invalid AQI category table")?;

    let health_registry = HealthRegistry::new();
    health_registry.register(components::PIPELINE).await;
    health_registry.register(components::SESSIONS).await;

    let metrics = AqiMetrics::new();
    let logger = StructuredLogger::new(&config.instance);

    // Fail fast: there is nothing useful to serve without a model
    let models = Arc::new(
        ModelRegistry::load(&config.model_path).context("Failed to load model artifact")?,
    );
    let model = models.current();
    logger.log_model_loaded(
        &config.model_path.display().to_string(),
        model.version(),
        model.info().kind,
    );
    metrics.set_model_version(model.version(), model.info().kind);
    health_registry.set_model_loaded(model.version()).await;

    let _watcher = if config.watch_model {
        let watcher = ModelWatcher::new(
            Arc::clone(&models),
            health_registry.clone(),
            metrics.clone(),
            logger.clone(),
        );
        Some(watcher.start()?)
    } else {
        None
    };

    let app_state = Arc::new(
        api::AppState::new(health_registry, metrics, logger.clone(), models)
            .with_classifier(classifier)
            .with_description_delay(config.description_delay())
            .with_session_idle(config.session_idle()),
    );
    let _sweeper = api::spawn_session_sweeper(Arc::clone(&app_state));

    logger.log_startup(SERVER_VERSION, model.version());

    tokio::select! {
        result = api::serve(config.api_port, app_state) => {
            result?;
        }
        signal = tokio::signal::ctrl_c() => {
            signal?;
            logger.log_shutdown("SIGINT received");
            info!("Shutting down");
        }
    }

    Ok(())
}
