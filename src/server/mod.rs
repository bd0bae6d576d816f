//! Relay HTTP server
//!
//! Routes:
//!   POST /api/generate - compose a prompt and relay it upstream
//!   GET  /api/models   - selectable model catalog
//!   GET  /health       - health check

pub mod routes;
pub mod state;

use std::sync::Arc;

use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use crate::config::ServerConfig;
pub use state::AppState;

/// Build the application router
pub fn router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/generate", post(routes::generate))
        .route("/models", get(routes::models));

    Router::new()
        .route("/health", get(|| async { "OK" }))
        .nest("/api", api)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve until the process is stopped
pub async fn run_server(config: &ServerConfig, state: Arc<AppState>) -> Result<()> {
    let addr = config.bind_addr();
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) if e.kind() == std::io::ErrorKind::AddrInUse => {
            error!(%addr, "Port {} is already in use; try `scribe serve --port <PORT>`", config.port);
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    };

    info!(%addr, "Relay listening");
    info!("  POST   /api/generate   - Generate text");
    info!("  GET    /api/models     - List selectable models");
    info!("  GET    /health         - Health check");

    axum::serve(listener, router(state)).await?;
    Ok(())
}
