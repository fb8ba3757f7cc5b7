//! Classified failures surface unchanged through the service.

use std::sync::Arc;

use tempfile::{TempDir, tempdir};
use tubegrab_core::resolver::classify_ytdlp_error;
use tubegrab_core::test_fakes::{FakeResolver, RecordingTranscoder, sample_streams};
use tubegrab_core::{
    DownloadFormat, DownloadService, QualityChoice, StagingArea, TranscodeOptions, TubegrabError,
};

const URL: &str = "https://video.example/watch?v=err";

fn service_with(
    resolver: FakeResolver,
    transcoder: RecordingTranscoder,
) -> (DownloadService, TempDir) {
    let dir = tempdir().unwrap();
    let service = DownloadService::new(
        Arc::new(resolver),
        Arc::new(transcoder),
        StagingArea::new(Some(dir.path().to_path_buf())).unwrap(),
        TranscodeOptions::default(),
    );
    (service, dir)
}

#[tokio::test]
async fn test_malformed_and_unknown_references() {
    let (service, _dir) = service_with(FakeResolver::new(), RecordingTranscoder::new());

    let err = service.lookup("not a url").await.unwrap_err();
    assert!(matches!(err, TubegrabError::InvalidReference { .. }));
    assert!(err.is_user_error());

    let err = service.lookup(URL).await.unwrap_err();
    assert!(matches!(err, TubegrabError::ResolutionUnavailable { .. }));
}

#[tokio::test]
async fn test_fetch_failure_is_upstream() {
    let (service, _dir) = service_with(
        FakeResolver::new()
            .with_video(URL, "Err", sample_streams())
            .with_failing_fetch(),
        RecordingTranscoder::new(),
    );

    let err = service
        .download(URL, DownloadFormat::Mp4, &QualityChoice::Highest)
        .await
        .unwrap_err();
    assert!(matches!(err, TubegrabError::UpstreamUnavailable { .. }));
    assert!(!err.is_user_error());
}

#[tokio::test]
async fn test_no_progressive_stream_is_stream_not_found() {
    let audio_only: Vec<_> = sample_streams()
        .into_iter()
        .filter(|s| s.resolution.is_none())
        .collect();
    let (service, _dir) = service_with(
        FakeResolver::new().with_video(URL, "Err", audio_only),
        RecordingTranscoder::new(),
    );

    let err = service
        .download(URL, DownloadFormat::Mp4, &QualityChoice::Highest)
        .await
        .unwrap_err();
    assert!(matches!(err, TubegrabError::StreamNotFound { .. }));
}

#[test]
fn test_common_ytdlp_messages_map_to_distinct_categories() {
    let cases = [
        ("ERROR: Unsupported URL: https://example.com", "invalid_reference"),
        (
            "ERROR: [youtube] abc: Private video. Sign in if you've been granted access",
            "resolution_unavailable",
        ),
        ("ERROR: [youtube] abc: Video unavailable", "resolution_unavailable"),
        ("ERROR: Requested format is not available", "stream_not_found"),
        (
            "ERROR: Unable to download webpage: HTTP Error 429: Too Many Requests",
            "upstream_unavailable",
        ),
    ];

    for (stderr, expected) in cases {
        assert_eq!(classify_ytdlp_error(URL, stderr).kind(), expected, "{stderr}");
    }
}
