use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vidmark_core::{
    create_annotator, load_config, validate_config, Annotator, FfmpegMediaBackend,
    FfmpegTranscoder, JobOrchestrator, MediaBackend, Transcoder,
};
use vidmark_server::api::create_router;
use vidmark_server::state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("vidmark {}", VERSION);

    // Determine config path
    let config_path = std::env::var("VIDMARK_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Annotator backend: {:?}", config.annotator.backend);
    info!("Upload dir: {:?}", config.storage.upload_dir);
    info!("Result dir: {:?}", config.storage.result_dir);

    // Storage directories
    for dir in [
        &config.storage.upload_dir,
        &config.storage.result_dir,
        &config.storage.temp_dir,
    ] {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create directory {:?}", dir))?;
    }

    // Media backend and final encoder. A missing ffmpeg only breaks video
    // jobs, so the server still starts.
    let media: Arc<dyn MediaBackend> = Arc::new(FfmpegMediaBackend::new(
        config.transcoder.ffmpeg_path.clone(),
        config.transcoder.ffprobe_path.clone(),
    ));
    if let Err(e) = media.validate().await {
        warn!("Media backend unavailable: {}", e);
    }

    let transcoder: Arc<dyn Transcoder> =
        Arc::new(FfmpegTranscoder::new(config.transcoder.clone()));
    if let Err(e) = transcoder.validate().await {
        warn!("Transcoder unavailable: {}", e);
    }

    // Create annotator
    let annotator: Arc<dyn Annotator> = Arc::from(
        create_annotator(&config.annotator).context("Failed to create annotator")?,
    );
    info!("Using annotator: {}", annotator.name());

    let orchestrator = JobOrchestrator::new(media, annotator, transcoder)
        .with_temp_dir(config.storage.temp_dir.clone())
        .with_pipeline_config(config.pipeline.clone());

    // Create app state
    let state = Arc::new(AppState::new(config.clone(), orchestrator));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
