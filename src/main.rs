//! Lector Server
//!
//! Upload an EPUB file and read it chapter by chapter, with a collapsible
//! table of contents and previous/next navigation.

use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lector_server::epub::RbookParser;
use lector_server::{routes, AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env first so RUST_LOG set there applies
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "lector_server=debug,tower_http=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config from env: {}, using defaults", e);
        Config::default()
    });

    tracing::info!("Starting Lector Server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        ttl_minutes = config.session.ttl_minutes,
        max_sessions = config.session.max_sessions,
        max_total_bytes = config.session.max_total_bytes,
        max_upload_bytes = config.upload.max_bytes,
        "Session settings"
    );

    // Create application state
    let app_state = AppState::new(config.clone(), Arc::new(RbookParser::new()));

    // Sweep expired reading sessions in the background
    let cleanup = app_state
        .sessions()
        .clone()
        .start_cleanup_task(config.session.cleanup_interval());

    // Build router
    let app = routes::router(app_state).layer(TraceLayer::new_for_http());

    // Start server with graceful shutdown
    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Lector Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    cleanup.abort();
    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown...");
        },
    }
}
