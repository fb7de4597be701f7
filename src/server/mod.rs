//! Range server: a single media resource exposed over HTTP with byte-range
//! semantics.
//!
//! Routes:
//! - `GET /` - length probe (no `Range` header) or partial content
//! - `GET /health` - liveness check

mod range;
mod stream;

pub use stream::{serve_media, MediaResource};

use crate::config::Config;
use anyhow::{Context, Result};
use axum::{
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Shared application context
#[derive(Clone)]
pub struct AppContext {
    pub resource: Arc<MediaResource>,
}

/// Create the Axum router with all routes
pub fn create_router(ctx: AppContext) -> Router {
    // The client may run from a different origin, so every response carries
    // permissive CORS headers and `Range` is an allowed request header.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::HEAD, Method::OPTIONS])
        .allow_headers([
            header::ORIGIN,
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::RANGE,
            HeaderName::from_static("x-requested-with"),
        ]);

    Router::new()
        .route("/", get(serve_media))
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}

/// Start the HTTP server
pub async fn start_server(config: Config) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let resource = MediaResource::open(&config.server.media_path, &config.server.content_type)?;
    tracing::info!(
        "Serving {:?} ({} bytes) as {}",
        config.server.media_path,
        resource.len(),
        resource.content_type()
    );

    let ctx = AppContext {
        resource: Arc::new(resource),
    };

    let app = create_router(ctx);

    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => {}
            Err(e) => {
                tracing::error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
