//! In-memory resolver and recording transcoder for tests.
//!
//! Enabled for this crate's unit tests and, through the `test-utils`
//! feature, for the web and integration test crates.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;

use crate::error::{Result, TubegrabError};
use crate::media::{ResolvedVideo, StreamDescriptor, StreamKind};
use crate::resolver::StreamResolver;
use crate::transcoding::{AudioTranscoder, TranscodeOptions, TranscodeResult};

/// A typical stream set: three progressive MP4 resolutions, one adaptive
/// video track and two audio tracks.
pub fn sample_streams() -> Vec<StreamDescriptor> {
    fn video(id: &str, kind: StreamKind, container: &str, height: u32) -> StreamDescriptor {
        StreamDescriptor {
            id: id.to_string(),
            kind,
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

    vec![
        video("18", StreamKind::Progressive, "mp4", 360),
        video("22", StreamKind::Progressive, "mp4", 720),
        video("59", StreamKind::Progressive, "mp4", 480),
        video("137", StreamKind::VideoOnly, "mp4", 1080),
        audio("140", "m4a", 128),
        audio("251", "webm", 160),
    ]
}

/// Resolver backed by a fixed table of videos.
#[derive(Debug, Default)]
pub struct FakeResolver {
    videos: HashMap<String, ResolvedVideo>,
    fail_fetch: bool,
    pub resolve_calls: AtomicUsize,
    pub fetch_calls: AtomicUsize,
}

impl FakeResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_video(
        mut self,
        reference: &str,
        title: &str,
        streams: Vec<StreamDescriptor>,
    ) -> Self {
        self.videos.insert(
            reference.to_string(),
            ResolvedVideo {
                reference: reference.to_string(),
                title: title.to_string(),
                thumbnail_url: Some(format!("https://img.example/{}.jpg", self.videos.len())),
                streams,
            },
        );
        self
    }

    /// Every fetch fails as if the network were down.
    pub fn with_failing_fetch(mut self) -> Self {
        self.fail_fetch = true;
        self
    }

    /// Bytes returned for a stream of a reference.
    pub fn payload(reference: &str, stream_id: &str) -> Bytes {
        Bytes::from(format!("{reference}|{stream_id}"))
    }
}

#[async_trait]
impl StreamResolver for FakeResolver {
    async fn resolve(&self, reference: &str) -> Result<ResolvedVideo> {
        self.resolve_calls.fetch_add(1, Ordering::SeqCst);
        if !reference.starts_with("http://") && !reference.starts_with("https://") {
            return Err(TubegrabError::InvalidReference {
                reference: reference.to_string(),
                reason: "not an http(s) URL".to_string(),
            });
        }
        self.videos
            .get(reference)
            .cloned()
            .ok_or_else(|| TubegrabError::ResolutionUnavailable {
                reference: reference.to_string(),
                reason: "unknown to fake resolver".to_string(),
            })
    }

    async fn fetch(&self, reference: &str, stream: &StreamDescriptor) -> Result<Bytes> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_fetch {
            return Err(TubegrabError::UpstreamUnavailable {
                reason: "fake fetch failure".to_string(),
            });
        }
        let known = self
            .videos
            .get(reference)
            .is_some_and(|video| video.streams.iter().any(|s| s.id == stream.id));
        if !known {
            return Err(TubegrabError::StreamNotFound {
                reference: reference.to_string(),
                wanted: stream.id.clone(),
            });
        }
        Ok(Self::payload(reference, &stream.id))
    }

    async fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

/// Transcoder that records its inputs and writes `ID3` followed by the input.
///
/// It pauses between being called and reading its input so concurrent
/// requests overlap inside the transcode step.
#[derive(Debug)]
pub struct RecordingTranscoder {
    pub calls: AtomicUsize,
    pub inputs: Mutex<Vec<PathBuf>>,
    delay: Duration,
    fail: bool,
}

impl RecordingTranscoder {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            inputs: Mutex::new(Vec::new()),
            delay: Duration::from_millis(50),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// What the transcoder writes for a given input.
    pub fn expected_output(input: &[u8]) -> Bytes {
        let mut output = b"ID3".to_vec();
        output.extend_from_slice(input);
        Bytes::from(output)
    }
}

impl Default for RecordingTranscoder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AudioTranscoder for RecordingTranscoder {
    async fn transcode_to_mp3(
        &self,
        input_path: &Path,
        output_path: &Path,
        _options: &TranscodeOptions,
    ) -> Result<TranscodeResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inputs.lock().push(input_path.to_path_buf());
        tokio::time::sleep(self.delay).await;

        if self.fail {
            return Err(TubegrabError::TranscodeFailure {
                reason: "recording transcoder told to fail".to_string(),
            });
        }

        let input = tokio::fs::read(input_path).await?;
        let output = Self::expected_output(&input);
        tokio::fs::write(output_path, &output).await?;
        Ok(TranscodeResult {
            output_size: output.len() as u64,
            processing_time: self.delay.as_secs_f64(),
        })
    }

    async fn is_available(&self) -> bool {
        !self.fail
    }
}
