//! Local HTTP service (Axum).
//!
//! Serves the upload page and three JSON endpoints that accept base64 image
//! payloads and answer with the compressed bytes inline.

pub mod config;
pub mod error;
pub mod models;
pub mod routes;

use crate::batch::BatchAggregator;
use crate::codec::{Codec, ImageCodec};
use axum::extract::DefaultBodyLimit;
use axum::Router;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

pub use config::ServerConfig;

/// Shared, read-only state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub aggregator: BatchAggregator,
    pub static_dir: Option<Arc<PathBuf>>,
}

impl AppState {
    pub fn new(config: &ServerConfig, codec: Arc<dyn Codec>) -> Self {
        Self {
            aggregator: BatchAggregator::new(codec)
                .with_concurrency(config.concurrency)
                .with_timeout(config.job_timeout()),
            static_dir: config.static_dir.clone().map(Arc::new),
        }
    }
}

/// Build the application router backed by the `image` codec.
pub fn build_router(config: &ServerConfig) -> Router {
    build_router_with_codec(config, Arc::new(ImageCodec::new()))
}

/// Build the application router with a custom codec.
pub fn build_router_with_codec(config: &ServerConfig, codec: Arc<dyn Codec>) -> Router {
    Router::new()
        .merge(routes::page_routes())
        .merge(routes::api_routes())
        .layer(DefaultBodyLimit::max(config.body_limit_bytes()))
        .with_state(AppState::new(config, codec))
}

/// Bind the configured address and serve until Ctrl-C.
pub async fn serve(config: ServerConfig) -> std::io::Result<()> {
    let listener = TcpListener::bind(config.address()).await?;
    let address = listener.local_addr()?;
    let router = build_router(&config);

    tracing::info!(
        body_limit_mb = config.body_limit_mb,
        timeout_secs = config.timeout_secs,
        concurrency = config.concurrency,
        "Image Compressor running at http://{}",
        address
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
