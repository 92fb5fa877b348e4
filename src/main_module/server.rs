//! HTTP server initialization and routing

use axum::{routing::get, Router};
use log::{error, info};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::line;
use crate::shared::config::ServerConfig;
use crate::shared::state::AppState;

use super::{health_check, shutdown_signal};

pub fn build_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .merge(line::configure())
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
}

pub async fn run_axum_server(app_state: Arc<AppState>, config: &ServerConfig) -> std::io::Result<()> {
    let addr = format!("{}:{}", config.bind_address, config.port);
    let app = build_router(app_state);

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            error!(
                "Failed to bind to {}: {} - is another instance running?",
                addr, e
            );
            return Err(e);
        }
    };
    info!("HTTP server listening on {}", addr);
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(std::io::Error::other)
}
