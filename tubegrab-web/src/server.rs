//! Router construction and server startup.

use std::time::Instant;

use axum::Router;
use axum::extract::Request;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tubegrab_core::{DownloadService, RuntimeMode, TubegrabConfig};

use crate::handlers::{
    favicon, fetch_download, health, landing_page, selection_page, submit_lookup,
};

/// Shared state handed to every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    pub downloads: DownloadService,
    pub mode: RuntimeMode,
    pub server_started_at: Instant,
}

impl AppState {
    pub fn new(downloads: DownloadService, mode: RuntimeMode) -> Self {
        Self {
            downloads,
            mode,
            server_started_at: Instant::now(),
        }
    }
}

/// Builds the application router with tracing and CORS layers.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(landing_page).post(submit_lookup))
        .route("/download", get(selection_page).post(fetch_download))
        .route("/favicon.ico", get(favicon))
        .route("/health", get(health))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request| {
                tracing::info_span!(
                    "request",
                    id = %uuid::Uuid::new_v4(),
                    method = %request.method(),
                    path = %request.uri().path(),
                )
            }),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Wires collaborators for `mode`, binds the configured address and serves
/// until the process is stopped.
///
/// # Errors
/// - Staging directory cannot be created
/// - Address is invalid or cannot be bound
pub async fn run_server(
    config: TubegrabConfig,
    mode: RuntimeMode,
) -> Result<(), Box<dyn std::error::Error>> {
    let downloads = DownloadService::from_config(&config, mode)?;

    let report = downloads.check_dependencies().await;
    if !report.resolver_available {
        tracing::warn!("Resolver '{}' is not available", report.resolver);
    }
    if !report.transcoder_available {
        tracing::warn!("Transcoder is not available, MP3 downloads will fail");
    }

    let app = build_router(AppState::new(downloads, mode));

    let address = config.server.bind_address()?;
    let listener = tokio::net::TcpListener::bind(address).await?;
    tracing::info!(
        "Tubegrab running on http://{} ({} mode)",
        listener.local_addr()?,
        mode
    );
    axum::serve(listener, app).await?;
    Ok(())
}
