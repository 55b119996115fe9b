//! cardiorisk: cardiovascular disease risk prediction over HTTP.
//!
//! This is the application entry point. It initializes tracing, loads
//! configuration from a TOML file, loads the model artifact, builds the Axum
//! router around the shared model handle, and starts the HTTP server.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cardiorisk::config::{AppConfig, LoggingConfig, DEFAULT_CONFIG_PATH, DEFAULT_LOG_FILTER};
use cardiorisk::http::start_server;
use cardiorisk::{create_router, AppState, Classifier, SgdPipeline};

/// cardiorisk: serve a cardiovascular disease risk classifier
#[derive(Parser, Debug)]
#[command(name = "cardiorisk", version, about)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    /// Log level filter (e.g., "cardiorisk=debug,tower_http=info")
    #[arg(short, long)]
    log_level: Option<String>,

    /// Path to the model artifact (overrides model.path)
    #[arg(short, long)]
    model: Option<PathBuf>,
}

fn init_tracing(filter: &str, logging: &LoggingConfig) {
    let registry = tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::new(filter));
    if logging.is_json() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Configuration decides the log format, so it is loaded before tracing starts
    let mut config = AppConfig::load(&args.config)?;
    if let Some(model_path) = args.model {
        config.model.path = model_path;
    }

    // Initialize tracing with priority: CLI > env > default
    let log_filter = args
        .log_level
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());
    init_tracing(&log_filter, &config.logging);

    tracing::info!(config = %args.config, "Loaded configuration");

    // Load the model once; a missing or corrupt artifact is fatal
    let pipeline = SgdPipeline::load(&config.model.path).map_err(|e| {
        tracing::error!(path = %config.model.path.display(), error = %e, "Failed to load model");
        e
    })?;
    let info = pipeline.info();
    tracing::info!(
        path = %config.model.path.display(),
        estimator = %info.estimator,
        sha256 = %info.sha256,
        features = info.n_features,
        classes = ?info.classes,
        "Loaded model artifact"
    );

    let model: Arc<dyn Classifier> = Arc::new(pipeline);
    let state = AppState::new(config, model);
    let app = create_router(state.clone());

    start_server(app, &state.config).await?;

    tracing::info!(model = state.model.name(), "Server stopped, releasing model");
    Ok(())
}
