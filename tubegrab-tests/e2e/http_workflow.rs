//! Browser workflow: landing page, lookup redirect, selection, attachment.

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::redirect::Policy;
use tempfile::{TempDir, tempdir};
use tubegrab_core::test_fakes::{FakeResolver, RecordingTranscoder, sample_streams};
use tubegrab_core::transcoding::looks_like_mp3;
use tubegrab_core::{
    DownloadService, RuntimeMode, StagingArea, TranscodeOptions, TubegrabConfig,
};

use super::spawn_app;

const URL_A: &str = "https://video.example/watch?v=e2e-a";
const URL_B: &str = "https://video.example/watch?v=e2e-b";

async fn fake_app(transcoder: Arc<RecordingTranscoder>) -> (String, TempDir) {
    let dir = tempdir().unwrap();
    let resolver = FakeResolver::new()
        .with_video(URL_A, "Alpha", sample_streams())
        .with_video(URL_B, "Beta", sample_streams());
    let downloads = DownloadService::new(
        Arc::new(resolver),
        transcoder,
        StagingArea::new(Some(dir.path().to_path_buf())).unwrap(),
        TranscodeOptions::default(),
    );
    (spawn_app(downloads, RuntimeMode::Development).await, dir)
}

#[tokio::test]
async fn test_landing_favicon_and_health() {
    let (base, _dir) = fake_app(Arc::new(RecordingTranscoder::new())).await;
    let client = reqwest::Client::new();

    let landing = client.get(format!("{base}/")).send().await.unwrap();
    assert_eq!(landing.status(), StatusCode::OK);
    assert!(landing.text().await.unwrap().contains(r#"name="url""#));

    let favicon = client.get(format!("{base}/favicon.ico")).send().await.unwrap();
    assert_eq!(favicon.status(), StatusCode::NOT_FOUND);

    let health: serde_json::Value = client
        .get(format!("{base}/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");
    assert_eq!(health["mode"], "development");
    assert_eq!(health["resolver_available"], true);
    assert_eq!(health["transcoder_available"], true);
}

#[tokio::test]
async fn test_lookup_redirects_to_selection_page() {
    let (base, _dir) = fake_app(Arc::new(RecordingTranscoder::new())).await;

    let no_redirect = reqwest::Client::builder()
        .redirect(Policy::none())
        .build()
        .unwrap();
    let response = no_redirect
        .post(format!("{base}/"))
        .form(&[("url", URL_A)])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let location = response.headers()["location"].to_str().unwrap().to_string();
    assert_eq!(
        location,
        "/download?url=https%3A%2F%2Fvideo.example%2Fwatch%3Fv%3De2e-a"
    );

    let selection = reqwest::Client::new()
        .post(format!("{base}/"))
        .form(&[("url", URL_A)])
        .send()
        .await
        .unwrap();
    assert_eq!(selection.status(), StatusCode::OK);
    let html = selection.text().await.unwrap();
    assert!(html.contains("<h3>Alpha</h3>"));
    assert!(html.contains(r#"value="720p""#));
}

#[tokio::test]
async fn test_bad_lookup_rerenders_landing_with_url() {
    let (base, _dir) = fake_app(Arc::new(RecordingTranscoder::new())).await;
    let client = reqwest::Client::new();

    let invalid = client
        .post(format!("{base}/"))
        .form(&[("url", "ftp://nowhere")])
        .send()
        .await
        .unwrap();
    assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
    let html = invalid.text().await.unwrap();
    assert!(html.contains(r#"value="ftp://nowhere""#));
    assert!(html.contains(r#"class="error""#));

    let unknown = client
        .post(format!("{base}/"))
        .form(&[("url", "https://video.example/missing")])
        .send()
        .await
        .unwrap();
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_concurrent_mp3_downloads_over_http() {
    let transcoder =
        Arc::new(RecordingTranscoder::new().with_delay(Duration::from_millis(150)));
    let (base, dir) = fake_app(transcoder.clone()).await;
    let client = reqwest::Client::new();

    let request = |url: &'static str| {
        client
            .post(format!("{base}/download"))
            .form(&[("url", url), ("format", "mp3"), ("quality", "highest")])
            .send()
    };
    let (first, second) = tokio::join!(request(URL_A), request(URL_B));
    let (first, second) = (first.unwrap(), second.unwrap());

    for (response, url, name) in [(first, URL_A, "Alpha.mp3"), (second, URL_B, "Beta.mp3")] {
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["content-type"], "audio/mpeg");
        let disposition = response.headers()["content-disposition"]
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.starts_with("attachment;"));
        assert!(disposition.contains(&format!("filename=\"{name}\"")));

        let body = response.bytes().await.unwrap();
        assert_eq!(
            body,
            RecordingTranscoder::expected_output(&FakeResolver::payload(url, "140"))
        );
    }

    assert_eq!(transcoder.calls.load(Ordering::SeqCst), 2);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_mp4_download_with_quality() {
    let (base, _dir) = fake_app(Arc::new(RecordingTranscoder::new())).await;

    let response = reqwest::Client::new()
        .post(format!("{base}/download"))
        .form(&[("url", URL_B), ("format", "mp4"), ("quality", "480p")])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "video/mp4");
    assert_eq!(
        response.bytes().await.unwrap(),
        FakeResolver::payload(URL_B, "59")
    );
}

#[tokio::test]
async fn test_development_mode_end_to_end() {
    let dir = tempdir().unwrap();
    let mut config = TubegrabConfig::for_testing();
    config.staging.directory = Some(dir.path().to_path_buf());
    let downloads = DownloadService::from_config(&config, RuntimeMode::Development).unwrap();
    let base = spawn_app(downloads, RuntimeMode::Development).await;
    let client = reqwest::Client::new();

    let page = client
        .get(format!("{base}/download"))
        .query(&[("url", "https://example.com/watch?v=dev")])
        .send()
        .await
        .unwrap();
    assert_eq!(page.status(), StatusCode::OK);
    assert!(page.text().await.unwrap().contains("Demo video"));

    let mp3 = client
        .post(format!("{base}/download"))
        .form(&[("url", "https://example.com/watch?v=dev"), ("format", "mp3")])
        .send()
        .await
        .unwrap();
    assert_eq!(mp3.status(), StatusCode::OK);
    assert!(looks_like_mp3(&mp3.bytes().await.unwrap()));

    let private = client
        .get(format!("{base}/download"))
        .query(&[("url", "https://example.com/private/clip")])
        .send()
        .await
        .unwrap();
    assert_eq!(private.status(), StatusCode::NOT_FOUND);
}
