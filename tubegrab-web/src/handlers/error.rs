//! Mapping of domain errors onto HTTP responses.
//!
//! A failed request re-renders the page the user came from with a
//! classified message, so every error carries the page to render.

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use tubegrab_core::{TubegrabError, VideoSummary};

use crate::templates::{SelectionView, landing, selection};

/// Page a failed request is rendered on.
#[derive(Debug, Clone)]
pub enum ErrorPage {
    /// The URL form, pre-filled with what was submitted
    Landing { url: String },
    /// The format/quality form for `url`, with video details when known
    Selection {
        url: String,
        summary: Option<VideoSummary>,
    },
}

/// A classified failure bound to the page that reports it.
#[derive(Debug, thiserror::Error)]
#[error("{source}")]
pub struct WebError {
    source: TubegrabError,
    page: ErrorPage,
}

impl WebError {
    pub fn landing(source: TubegrabError, url: &str) -> Self {
        Self {
            source,
            page: ErrorPage::Landing {
                url: url.trim().to_string(),
            },
        }
    }

    pub fn selection(source: TubegrabError, url: &str, summary: Option<VideoSummary>) -> Self {
        Self {
            source,
            page: ErrorPage::Selection {
                url: url.trim().to_string(),
                summary,
            },
        }
    }

    pub fn status(&self) -> StatusCode {
        status_for(&self.source)
    }
}

/// HTTP status for each error category.
pub fn status_for(error: &TubegrabError) -> StatusCode {
    match error {
        TubegrabError::InvalidReference { .. } | TubegrabError::UnsupportedFormat { .. } => {
            StatusCode::BAD_REQUEST
        }
        TubegrabError::ResolutionUnavailable { .. } => StatusCode::NOT_FOUND,
        TubegrabError::StreamNotFound { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        TubegrabError::UpstreamUnavailable { .. } => StatusCode::BAD_GATEWAY,
        TubegrabError::TranscodeFailure { .. }
        | TubegrabError::Configuration { .. }
        | TubegrabError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = self.status();
        if self.source.is_user_error() {
            tracing::warn!(kind = self.source.kind(), status = %status, "{}", self.source);
        } else {
            tracing::error!(kind = self.source.kind(), status = %status, "{}", self.source);
        }

        let message = self.source.user_message();
        let body = match &self.page {
            ErrorPage::Landing { url } => landing::render(Some(url), Some(&message)),
            ErrorPage::Selection { url, summary } => selection::render(&SelectionView {
                url,
                summary: summary.as_ref(),
                error: Some(&message),
            }),
        };
        (status, Html(body)).into_response()
    }
}
