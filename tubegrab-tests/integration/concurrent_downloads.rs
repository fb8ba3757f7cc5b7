//! Concurrent MP3 requests must not share staging files.

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use tempfile::tempdir;
use tubegrab_core::test_fakes::{FakeResolver, RecordingTranscoder, sample_streams};
use tubegrab_core::{
    DownloadFormat, DownloadService, QualityChoice, StagingArea, TranscodeOptions,
};

const URL_A: &str = "https://video.example/watch?v=aaaa";
const URL_B: &str = "https://video.example/watch?v=bbbb";

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_mp3_requests_are_independent() {
    let staging_dir = tempdir().unwrap();
    let transcoder =
        Arc::new(RecordingTranscoder::new().with_delay(Duration::from_millis(150)));
    let resolver = FakeResolver::new()
        .with_video(URL_A, "First", sample_streams())
        .with_video(URL_B, "Second", sample_streams());
    let service = DownloadService::new(
        Arc::new(resolver),
        transcoder.clone(),
        StagingArea::new(Some(staging_dir.path().to_path_buf())).unwrap(),
        TranscodeOptions::default(),
    );

    let quality = QualityChoice::Highest;
    let (first, second) = tokio::join!(
        service.download(URL_A, DownloadFormat::Mp3, &quality),
        service.download(URL_B, DownloadFormat::Mp3, &quality),
    );
    let first = first.unwrap();
    let second = second.unwrap();

    assert_eq!(
        first.bytes,
        RecordingTranscoder::expected_output(&FakeResolver::payload(URL_A, "140"))
    );
    assert_eq!(
        second.bytes,
        RecordingTranscoder::expected_output(&FakeResolver::payload(URL_B, "140"))
    );
    assert_eq!(first.file_name, "First.mp3");
    assert_eq!(second.file_name, "Second.mp3");

    assert_eq!(transcoder.calls.load(Ordering::SeqCst), 2);
    let inputs = transcoder.inputs.lock().clone();
    assert_eq!(inputs.len(), 2);
    assert_ne!(inputs[0], inputs[1]);

    let leftovers = std::fs::read_dir(staging_dir.path()).unwrap().count();
    assert_eq!(leftovers, 0, "staged files must be removed after each request");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_many_concurrent_requests_on_spawned_tasks() {
    let staging_dir = tempdir().unwrap();
    let references: Vec<String> = (0..8)
        .map(|i| format!("https://video.example/watch?v={i}"))
        .collect();

    let resolver = references.iter().fold(FakeResolver::new(), |resolver, url| {
        resolver.with_video(url, url, sample_streams())
    });
    let transcoder = Arc::new(RecordingTranscoder::new().with_delay(Duration::from_millis(20)));
    let service = DownloadService::new(
        Arc::new(resolver),
        transcoder.clone(),
        StagingArea::new(Some(staging_dir.path().to_path_buf())).unwrap(),
        TranscodeOptions::default(),
    );

    let handles: Vec<_> = references
        .iter()
        .cloned()
        .map(|url| {
            let service = service.clone();
            tokio::spawn(async move {
                let artifact = service
                    .download(&url, DownloadFormat::Mp3, &QualityChoice::Highest)
                    .await
                    .unwrap();
                (url, artifact)
            })
        })
        .collect();

    for result in futures::future::join_all(handles).await {
        let (url, artifact) = result.unwrap();
        assert_eq!(
            artifact.bytes,
            RecordingTranscoder::expected_output(&FakeResolver::payload(&url, "140"))
        );
    }

    assert_eq!(transcoder.calls.load(Ordering::SeqCst), references.len());
    assert_eq!(std::fs::read_dir(staging_dir.path()).unwrap().count(), 0);
}
