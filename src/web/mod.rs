//! Single-page web UI and JSON API

mod handlers;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::{config::SessionConfig, credentials::Credentials};

/// Shared server state: immutable config plus the credentials entered by the user
#[derive(Debug)]
pub struct AppState {
    pub config: SessionConfig,
    pub credentials: RwLock<Option<Credentials>>,
}

impl AppState {
    pub fn new(config: SessionConfig, credentials: Option<Credentials>) -> Arc<Self> {
        Arc::new(Self {
            config,
            credentials: RwLock::new(credentials),
        })
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/api/credentials", post(handlers::save_credentials))
        .route("/api/trips", post(handlers::submit_trip))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the UI on `bind` until Ctrl+C
pub async fn serve(state: Arc<AppState>, bind: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!(target: "agenta::web", "Travel planner listening on http://{bind}/");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(target: "agenta::web", error = %err, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!(target: "agenta::web", "Shutdown signal received");
}
