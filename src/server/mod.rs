//! HTTP front end: router, handlers and graceful shutdown.

pub mod error;
pub mod pages;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::AppState;

use crate::error::Result;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Builds the router with every route, the upload size limit and request
/// tracing.
pub fn build_router(state: Arc<AppState>) -> Router {
    let max_upload = state.config.max_upload_bytes();

    Router::new()
        .route("/", get(routes::home))
        .route("/face-login", get(routes::face_login))
        .route("/authenticate", post(routes::authenticate))
        .route("/profile", get(routes::profile))
        .route("/level_control", get(routes::level_control))
        .route("/get_level", get(routes::get_level))
        .route("/update_level", post(routes::update_level))
        .route("/change_level", post(routes::change_level))
        .route("/face-logout", get(routes::face_logout))
        .route("/logout", post(routes::logout))
        .route("/health", get(routes::health))
        .layer(DefaultBodyLimit::max(max_upload))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves until Ctrl+C or SIGTERM.
pub async fn start_server(state: Arc<AppState>) -> Result<()> {
    let bind_addr = state.config.server.bind_addr.clone();
    let port = state.config.server.port;
    let app = build_router(state.clone());

    let listener = tokio::net::TcpListener::bind((bind_addr.as_str(), port)).await?;
    tracing::info!(
        "Listening on {} with {} authorized face(s)",
        listener.local_addr()?,
        state.authenticator.registry().len()
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
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
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down..."),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down..."),
    }
}
