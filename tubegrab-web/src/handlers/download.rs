//! Selection page and attachment endpoint

use axum::Form;
use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{HeaderValue, header};
use axum::response::{Html, IntoResponse, Response};
use serde::Deserialize;
use tubegrab_core::{
    DownloadArtifact, DownloadFormat, QualityChoice, TubegrabError, VideoSummary,
};

use super::error::WebError;
use crate::server::AppState;
use crate::templates::{SelectionView, selection};

#[derive(Debug, Deserialize)]
pub struct SelectionQuery {
    pub url: Option<String>,
}

/// Fields posted from the selection page.
#[derive(Debug, Deserialize)]
pub struct FetchForm {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub format: String,
    pub quality: Option<String>,
}

/// Renders title, thumbnail and the format/quality form for `?url=`.
///
/// # Errors
/// Lookup failures, including a missing `url`, render the landing page.
pub async fn selection_page(
    State(state): State<AppState>,
    Query(query): Query<SelectionQuery>,
) -> Result<Html<String>, WebError> {
    let url = query.url.unwrap_or_default();
    let summary = state
        .downloads
        .lookup(&url)
        .await
        .map_err(|e| WebError::landing(e, &url))?;

    Ok(Html(selection::render(&SelectionView {
        url: &summary.reference,
        summary: Some(&summary),
        error: None,
    })))
}

/// Streams the requested format back as an attachment.
///
/// # Errors
/// Failures re-render the selection page with the submitted URL; once the
/// video has resolved, its details are shown alongside the message.
pub async fn fetch_download(
    State(state): State<AppState>,
    Form(form): Form<FetchForm>,
) -> Result<Response, WebError> {
    let video = state
        .downloads
        .resolve(&form.url)
        .await
        .map_err(|e| WebError::selection(e, &form.url, None))?;

    let fail = |e: TubegrabError| WebError::selection(e, &form.url, Some(VideoSummary::from(&video)));

    let format: DownloadFormat = form.format.parse().map_err(fail)?;
    let quality = QualityChoice::from_form(form.quality.as_deref());

    let artifact = state
        .downloads
        .fetch(&video, format, &quality)
        .await
        .map_err(fail)?;

    tracing::info!(
        "Serving '{}' ({}, {} bytes)",
        artifact.file_name,
        artifact.mime_type(),
        artifact.bytes.len()
    );
    Ok(attachment(artifact))
}

fn attachment(artifact: DownloadArtifact) -> Response {
    let disposition = HeaderValue::from_str(&content_disposition(&artifact.file_name))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));
    (
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(artifact.mime_type())),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Body::from(artifact.bytes),
    )
        .into_response()
}

/// Builds an attachment disposition with an ASCII fallback name and the
/// UTF-8 name in `filename*`.
pub fn content_disposition(file_name: &str) -> String {
    let ascii: String = file_name
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii() && !c.is_ascii_control() => c,
            _ => '_',
        })
        .collect();
    format!(
        "attachment; filename=\"{ascii}\"; filename*=UTF-8''{}",
        urlencoding::encode(file_name)
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::Ordering;

    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;
    use tubegrab_core::test_fakes::{FakeResolver, RecordingTranscoder, sample_streams};
    use tubegrab_core::{DownloadService, RuntimeMode, StagingArea, TranscodeOptions};

    use super::*;
    use crate::server::{AppState, build_router};

    const URL: &str = "https://video.example/watch?v=1";

    fn router(dir: &std::path::Path, transcoder: RecordingTranscoder) -> axum::Router {
        let downloads = DownloadService::new(
            Arc::new(FakeResolver::new().with_video(URL, "Café <Live>", sample_streams())),
            Arc::new(transcoder),
            StagingArea::new(Some(dir.to_path_buf())).unwrap(),
            TranscodeOptions::default(),
        );
        build_router(AppState::new(downloads, RuntimeMode::Development))
    }

    fn post_form(uri: &str, body: String) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8_lossy(&bytes).into_owned()
    }

    #[test]
    fn test_content_disposition() {
        assert_eq!(
            content_disposition("Café.mp3"),
            "attachment; filename=\"Caf_.mp3\"; filename*=UTF-8''Caf%C3%A9.mp3"
        );
    }

    #[tokio::test]
    async fn test_selection_page_lists_resolutions() {
        let dir = tempfile::tempdir().unwrap();
        let uri = format!("/download?url={}", urlencoding::encode(URL));
        let response = router(dir.path(), RecordingTranscoder::new())
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("Café &lt;Live&gt;"));
        let p720 = html.find(r#"value="720p""#).unwrap();
        let p480 = html.find(r#"value="480p""#).unwrap();
        let p360 = html.find(r#"value="360p""#).unwrap();
        assert!(p720 < p480 && p480 < p360);
        assert!(!html.contains(r#"value="1080p""#));
    }

    #[tokio::test]
    async fn test_missing_url_renders_landing_error() {
        let dir = tempfile::tempdir().unwrap();
        let response = router(dir.path(), RecordingTranscoder::new())
            .oneshot(Request::get("/download").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(response).await.contains(r#"class="error""#));
    }

    #[tokio::test]
    async fn test_mp3_attachment() {
        let dir = tempfile::tempdir().unwrap();
        let body = format!("url={}&format=mp3", urlencoding::encode(URL));
        let response = router(dir.path(), RecordingTranscoder::new())
            .oneshot(post_form("/download", body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "audio/mpeg");
        let disposition = response.headers()[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.contains("filename=\"Caf_ _Live_.mp3\""));
        assert_eq!(
            axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap(),
            RecordingTranscoder::expected_output(&FakeResolver::payload(URL, "140"))
        );
    }

    #[tokio::test]
    async fn test_unknown_format_rerenders_selection() {
        let dir = tempfile::tempdir().unwrap();
        let body = format!("url={}&format=flac", urlencoding::encode(URL));
        let response = router(dir.path(), RecordingTranscoder::new())
            .oneshot(post_form("/download", body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let html = body_text(response).await;
        assert!(html.contains("Unsupported download format"));
        assert!(html.contains(r#"name="url" value="https://video.example/watch?v=1""#));
        assert!(html.contains("Café &lt;Live&gt;"));
    }

    #[tokio::test]
    async fn test_transcode_failure_keeps_url_and_details() {
        let dir = tempfile::tempdir().unwrap();
        let body = format!("url={}&format=mp3", urlencoding::encode(URL));
        let response = router(dir.path(), RecordingTranscoder::failing())
            .oneshot(post_form("/download", body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let html = body_text(response).await;
        assert!(html.contains("Converting the audio track to MP3 failed."));
        assert!(html.contains(r#"value="https://video.example/watch?v=1""#));
        assert!(html.contains("720p"));
    }

    #[tokio::test]
    async fn test_unresolvable_fetch_keeps_url() {
        let dir = tempfile::tempdir().unwrap();
        let body = "url=https%3A%2F%2Fvideo.example%2Fgone&format=mp4".to_string();
        let response = router(dir.path(), RecordingTranscoder::new())
            .oneshot(post_form("/download", body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let html = body_text(response).await;
        assert!(html.contains(r#"value="https://video.example/gone""#));
    }

    #[tokio::test]
    async fn test_every_download_post_resolves_the_url_again() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = Arc::new(FakeResolver::new().with_video(URL, "Café <Live>", sample_streams()));
        let downloads = DownloadService::new(
            resolver.clone(),
            Arc::new(RecordingTranscoder::new()),
            StagingArea::new(Some(dir.path().to_path_buf())).unwrap(),
            TranscodeOptions::default(),
        );
        let app = build_router(AppState::new(downloads, RuntimeMode::Development));

        let uri = format!("/download?url={}", urlencoding::encode(URL));
        let response = app
            .clone()
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        for _ in 0..2 {
            let body = format!("url={}&format=mp4&quality=720p", urlencoding::encode(URL));
            let response = app.clone().oneshot(post_form("/download", body)).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(response.headers()[header::CONTENT_TYPE], "video/mp4");
        }

        assert_eq!(resolver.resolve_calls.load(Ordering::SeqCst), 3);
        assert_eq!(resolver.fetch_calls.load(Ordering::SeqCst), 2);
    }
}
