use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reelforge_api::background;
use reelforge_api::config::ServerConfig;
use reelforge_api::frames::{FileFrameStore, FrameDataStore, InMemoryFrameStore};
use reelforge_api::router::build_app_router;
use reelforge_api::runner::{CommandRenderer, RenderRunner, Renderer, UnconfiguredRenderer};
use reelforge_api::state::AppState;
use reelforge_api::store::JobStore;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    let json_logs = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reelforge_api=debug,tower_http=debug".into()),
        )
        .with(json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json_logs).then(|| tracing_subscriber::fmt::layer()))
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Invalid configuration");
        std::process::exit(1);
    });
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Frame data store ---
    let frames: Arc<dyn FrameDataStore> = match &config.frame_data_dir {
        Some(dir) => {
            let store = FileFrameStore::open(dir).await.unwrap_or_else(|e| {
                tracing::error!(dir = %dir.display(), error = %e, "Cannot open frame data directory");
                std::process::exit(1);
            });
            tracing::info!(dir = %dir.display(), "Frame data stored on disk");
            Arc::new(store)
        }
        None => {
            tracing::info!("Frame data kept in memory");
            Arc::new(InMemoryFrameStore::new())
        }
    };

    // --- Renderer ---
    let renderer: Arc<dyn Renderer> = match config
        .renderer_command
        .as_deref()
        .and_then(CommandRenderer::parse)
    {
        Some(command) => {
            tracing::info!(command = ?command, "Renderer command configured");
            Arc::new(command)
        }
        None => {
            tracing::warn!("RENDERER_COMMAND not set, render jobs will fail");
            Arc::new(UnconfiguredRenderer)
        }
    };

    let jobs = Arc::new(JobStore::new());
    let runner = Arc::new(RenderRunner::new(
        Arc::clone(&jobs),
        Arc::clone(&frames),
        renderer,
        config.public_base_url.clone(),
    ));

    // --- Job retention ---
    let retention_cancel = CancellationToken::new();
    let retention_handle = tokio::spawn(background::job_retention::run(
        Arc::clone(&jobs),
        Duration::from_secs(config.job_retention_secs),
        Duration::from_secs(config.retention_sweep_secs),
        retention_cancel.clone(),
    ));

    let config = Arc::new(config);
    let state = AppState {
        config: Arc::clone(&config),
        jobs,
        frames,
        runner: Arc::clone(&runner),
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .expect("Invalid HOST:PORT combination");

    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Waiting for in-flight renders");
    if !runner
        .shutdown(Duration::from_secs(config.shutdown_timeout_secs))
        .await
    {
        tracing::warn!(
            timeout_secs = config.shutdown_timeout_secs,
            "Renders still running at shutdown timeout"
        );
    }

    retention_cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), retention_handle).await;

    tracing::info!("Server shut down gracefully");
}

/// Wait for a shutdown signal (Ctrl-C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
