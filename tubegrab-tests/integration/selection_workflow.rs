//! Lookup and format selection through the download service.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use tempfile::{TempDir, tempdir};
use tubegrab_core::test_fakes::{FakeResolver, RecordingTranscoder};
use tubegrab_core::{
    DownloadFormat, DownloadService, QualityChoice, StagingArea, StreamDescriptor, StreamKind,
    TranscodeOptions,
};

const URL: &str = "https://video.example/watch?v=select";

fn progressive(id: &str, container: &str, height: u32) -> StreamDescriptor {
    StreamDescriptor {
        id: id.to_string(),
        kind: StreamKind::Progressive,
        container: container.to_string(),
        resolution: Some(format!("{height}p")),
        height: Some(height),
        audio_bitrate: None,
    }
}

fn audio(id: &str, container: &str, bitrate: u32) -> StreamDescriptor {
    StreamDescriptor {
        id: id.to_string(),
        kind: StreamKind::AudioOnly,
        container: container.to_string(),
        resolution: None,
        height: None,
        audio_bitrate: Some(bitrate),
    }
}

/// Duplicate labels, a webm stream and an adaptive track the page must skip.
fn streams() -> Vec<StreamDescriptor> {
    vec![
        progressive("a", "mp4", 360),
        progressive("b", "mp4", 1080),
        progressive("c", "mp4", 360),
        progressive("d", "webm", 480),
        progressive("e", "mp4", 720),
        StreamDescriptor {
            id: "f".to_string(),
            kind: StreamKind::VideoOnly,
            container: "mp4".to_string(),
            resolution: Some("2160p".to_string()),
            height: Some(2160),
            audio_bitrate: None,
        },
        audio("g", "webm", 160),
        audio("h", "m4a", 128),
        audio("i", "m4a", 48),
    ]
}

fn service() -> (DownloadService, Arc<RecordingTranscoder>, TempDir) {
    let dir = tempdir().unwrap();
    let transcoder = Arc::new(RecordingTranscoder::new());
    let service = DownloadService::new(
        Arc::new(FakeResolver::new().with_video(URL, "Selection", streams())),
        transcoder.clone(),
        StagingArea::new(Some(dir.path().to_path_buf())).unwrap(),
        TranscodeOptions::default(),
    );
    (service, transcoder, dir)
}

#[tokio::test]
async fn test_lookup_lists_distinct_descending_mp4_resolutions() {
    let (service, _, _dir) = service();
    let summary = service.lookup(URL).await.unwrap();
    assert_eq!(summary.resolutions, vec!["1080p", "720p", "360p"]);
}

#[tokio::test]
async fn test_highest_picks_highest_progressive_stream() {
    let (service, transcoder, _dir) = service();
    let artifact = service
        .download(URL, DownloadFormat::Mp4, &QualityChoice::Highest)
        .await
        .unwrap();
    assert_eq!(artifact.bytes, FakeResolver::payload(URL, "b"));
    assert_eq!(artifact.mime_type(), "video/mp4");
    assert_eq!(transcoder.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_unmatched_and_non_mp4_labels_fall_back_to_highest() {
    let (service, _, _dir) = service();
    for label in ["144p", "480p", "2160p"] {
        let artifact = service
            .download(
                URL,
                DownloadFormat::Mp4,
                &QualityChoice::Label(label.to_string()),
            )
            .await
            .unwrap();
        assert_eq!(artifact.bytes, FakeResolver::payload(URL, "b"), "{label}");
    }
}

#[tokio::test]
async fn test_exact_label_is_honoured() {
    let (service, _, _dir) = service();
    let artifact = service
        .download(
            URL,
            DownloadFormat::Mp4,
            &QualityChoice::from_form(Some("720p")),
        )
        .await
        .unwrap();
    assert_eq!(artifact.bytes, FakeResolver::payload(URL, "e"));
}

#[tokio::test]
async fn test_mp3_prefers_m4a_audio_and_transcodes_once() {
    let (service, transcoder, _dir) = service();
    let artifact = service
        .download(URL, DownloadFormat::Mp3, &QualityChoice::Highest)
        .await
        .unwrap();

    assert_eq!(artifact.mime_type(), "audio/mpeg");
    assert_eq!(artifact.file_name, "Selection.mp3");
    assert_eq!(
        artifact.bytes,
        RecordingTranscoder::expected_output(&FakeResolver::payload(URL, "h"))
    );
    assert_eq!(transcoder.calls.load(Ordering::SeqCst), 1);
}
