//! End-to-end tests for Tubegrab
//!
//! These tests bind the real router to an ephemeral port and drive it over
//! HTTP with reqwest, the way a browser would.

mod http_workflow;

use tubegrab_core::{DownloadService, RuntimeMode};
use tubegrab_web::{AppState, build_router};

/// Serves the router on 127.0.0.1 and returns its base URL.
pub async fn spawn_app(downloads: DownloadService, mode: RuntimeMode) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    let app = build_router(AppState::new(downloads, mode));
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{address}")
}
