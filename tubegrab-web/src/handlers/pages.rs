//! Landing page, URL lookup and service endpoints

use axum::Form;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, Json, Redirect};
use serde::Deserialize;
use serde_json::{Value, json};

use super::error::WebError;
use crate::server::AppState;
use crate::templates::landing;

/// URL submitted from the landing page.
#[derive(Debug, Deserialize)]
pub struct LookupForm {
    #[serde(default)]
    pub url: String,
}

/// Renders the empty URL form.
pub async fn landing_page() -> Html<String> {
    Html(landing::render(None, None))
}

/// Resolves the submitted URL and redirects to its selection page.
///
/// # Errors
/// Any resolver failure re-renders the landing page with the classified
/// message and the submitted URL.
pub async fn submit_lookup(
    State(state): State<AppState>,
    Form(form): Form<LookupForm>,
) -> Result<Redirect, WebError> {
    let video = state
        .downloads
        .resolve(&form.url)
        .await
        .map_err(|e| WebError::landing(e, &form.url))?;

    tracing::info!("Resolved '{}' ({} streams)", video.title, video.streams.len());
    let location = format!("/download?url={}", urlencoding::encode(&video.reference));
    Ok(Redirect::to(&location))
}

pub async fn favicon() -> StatusCode {
    StatusCode::NOT_FOUND
}

/// Reports runtime mode and collaborator availability.
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let report = state.downloads.check_dependencies().await;
    Json(json!({
        "status": "ok",
        "mode": state.mode,
        "resolver": report.resolver,
        "resolver_available": report.resolver_available,
        "transcoder_available": report.transcoder_available,
        "uptime_seconds": state.server_started_at.elapsed().as_secs(),
    }))
}
