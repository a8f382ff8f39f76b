//! Docparse Server
//!
//! HTTP front end for document parsing with native S3 support.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use docparse_server::analysis::HttpInferenceEngine;
use docparse_server::config::{has_default_bucket, Config};
use docparse_server::dataset::LibreOfficeConverter;
use docparse_server::routes;
use docparse_server::state::AppState;
use docparse_server::storage::ConfigCredentialResolver;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docparse_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) if e.is_bucket_error() => {
            tracing::error!("Refusing to start without bucket credentials: {}", e);
            std::process::exit(1);
        }
        Err(e) => {
            tracing::warn!("Failed to load config from env: {}, using defaults", e);
            Config::default()
        }
    };

    tracing::info!("Starting Docparse Server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Inference endpoint: {}", config.analyzer.inference_url);
    tracing::info!(
        buckets = config.storage.buckets.len(),
        default_bucket = has_default_bucket(&config.storage),
        "Storage configured"
    );
    tracing::info!("Staging root: {}", config.staging.root.display());

    let engine = match HttpInferenceEngine::from_config(&config.analyzer) {
        Ok(engine) => Arc::new(engine),
        Err(e) => {
            tracing::error!("Failed to initialize inference client: {}", e);
            std::process::exit(1);
        }
    };
    let converter = Arc::new(LibreOfficeConverter::new(config.staging.soffice_bin.clone()));
    let resolver = Arc::new(ConfigCredentialResolver::from_config(&config.storage));

    let addr: SocketAddr = match format!("{}:{}", config.server.host, config.server.port).parse() {
        Ok(addr) => addr,
        Err(e) => {
            tracing::error!("Invalid listen address {}:{}: {}", config.server.host, config.server.port, e);
            std::process::exit(1);
        }
    };

    let app_state = AppState::new(config, engine, converter, resolver);
    let app = routes::build_router(app_state);

    // Start server with graceful shutdown
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    tracing::info!("Docparse Server listening on {}", addr);

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!("Server error: {}", e);
    }

    tracing::info!("Server shutdown complete");
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
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
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
