use std::{env, error::Error, sync::Arc};

mod core;
mod routes;

use axum::{
    Router,
    routing::{get, post},
};
use tokio::signal;

use crate::core::app_state::AppState;
use crate::routes::{chart_route::chart, chat_route::chat, ingest_route::ingest};

pub async fn start() -> Result<(), Box<dyn Error>> {
    let host_url = env::var("API_ADDRESS").unwrap_or_else(|_| "127.0.0.1:8080".into());

    let state = Arc::new(AppState::from_env()?);

    let app = Router::new()
        .route("/chat", post(chat))
        .route("/ingest", post(ingest))
        .route("/chart/{session_id}", get(chart))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&host_url).await?;
    tracing::info!("listening on {host_url}");

    // Start server with graceful shutdown on Ctrl+C
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Returns a future that resolves when Ctrl+C is pressed
async fn shutdown_signal() {
    signal::ctrl_c()
        .await
        .expect("Failed to listen for shutdown signal");
}
