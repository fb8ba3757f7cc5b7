//! Lookup and fetch orchestration.
//!
//! `DownloadService` is the only place that knows how a request flows:
//! resolve the reference, pick a stream, fetch its bytes, and for audio
//! requests run them through the transcoder via per-request staging.

use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use serde::Serialize;

use crate::config::TubegrabConfig;
use crate::error::{Result, TubegrabError};
use crate::media::{
    DownloadFormat, QualityChoice, ResolvedVideo, available_resolutions, select_audio_stream,
    select_video_stream,
};
use crate::mode::RuntimeMode;
use crate::resolver::{DemoResolver, StreamResolver, YtDlpResolver};
use crate::staging::StagingArea;
use crate::transcoding::{
    AudioTranscoder, FfmpegTranscoder, SimulationTranscoder, TranscodeOptions,
};

/// What the selection page shows for a resolved video.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoSummary {
    pub reference: String,
    pub title: String,
    pub thumbnail_url: Option<String>,
    /// Distinct progressive MP4 resolution labels, highest first
    pub resolutions: Vec<String>,
}

impl From<&ResolvedVideo> for VideoSummary {
    fn from(video: &ResolvedVideo) -> Self {
        Self {
            reference: video.reference.clone(),
            title: video.title.clone(),
            thumbnail_url: video.thumbnail_url.clone(),
            resolutions: available_resolutions(&video.streams),
        }
    }
}

/// A finished download ready to be sent as an attachment.
#[derive(Debug, Clone)]
pub struct DownloadArtifact {
    /// Sanitized `<title>.<ext>`
    pub file_name: String,
    pub format: DownloadFormat,
    pub bytes: Bytes,
}

impl DownloadArtifact {
    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }
}

/// Availability of the external collaborators.
#[derive(Debug, Clone, Serialize)]
pub struct DependencyReport {
    pub resolver: &'static str,
    pub resolver_available: bool,
    pub transcoder_available: bool,
}

/// Resolves references and produces download artifacts.
#[derive(Debug, Clone)]
pub struct DownloadService {
    resolver: Arc<dyn StreamResolver>,
    transcoder: Arc<dyn AudioTranscoder>,
    staging: StagingArea,
    transcode_options: TranscodeOptions,
}

impl DownloadService {
    pub fn new(
        resolver: Arc<dyn StreamResolver>,
        transcoder: Arc<dyn AudioTranscoder>,
        staging: StagingArea,
        transcode_options: TranscodeOptions,
    ) -> Self {
        Self {
            resolver,
            transcoder,
            staging,
            transcode_options,
        }
    }

    /// Wires the collaborators for a runtime mode.
    ///
    /// # Errors
    /// - `TubegrabError::Io` - Staging directory cannot be created
    pub fn from_config(config: &TubegrabConfig, mode: RuntimeMode) -> Result<Self> {
        let (resolver, transcoder): (Arc<dyn StreamResolver>, Arc<dyn AudioTranscoder>) =
            match mode {
                RuntimeMode::Production => (
                    Arc::new(YtDlpResolver::new(&config.resolver)),
                    Arc::new(FfmpegTranscoder::new(config.transcoder.ffmpeg_path.clone())),
                ),
                RuntimeMode::Development => (
                    Arc::new(DemoResolver::new()),
                    Arc::new(SimulationTranscoder::new()),
                ),
            };
        let staging = StagingArea::new(config.staging.directory.clone())?;

        tracing::info!(
            "Download service ready: mode={}, resolver={}, staging={}",
            mode,
            resolver.name(),
            staging.directory().display()
        );

        Ok(Self::new(
            resolver,
            transcoder,
            staging,
            TranscodeOptions::from_config(&config.transcoder),
        ))
    }

    /// Resolves a submitted reference.
    ///
    /// # Errors
    /// - `TubegrabError::InvalidReference` - Reference is empty or rejected by the resolver
    /// - `TubegrabError::ResolutionUnavailable` - Video is private, removed or restricted
    /// - `TubegrabError::UpstreamUnavailable` - Resolver could not be reached
    pub async fn resolve(&self, reference: &str) -> Result<ResolvedVideo> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(TubegrabError::InvalidReference {
                reference: String::new(),
                reason: "no URL was submitted".to_string(),
            });
        }
        self.resolver.resolve(reference).await
    }

    /// Resolves a reference and summarizes it for the selection page.
    ///
    /// # Errors
    /// Same as [`DownloadService::resolve`].
    pub async fn lookup(&self, reference: &str) -> Result<VideoSummary> {
        let video = self.resolve(reference).await?;
        Ok(VideoSummary::from(&video))
    }

    /// Produces the artifact for an already resolved video.
    ///
    /// # Errors
    /// - `TubegrabError::StreamNotFound` - No stream of the requested kind
    /// - `TubegrabError::UpstreamUnavailable` - Stream bytes could not be fetched
    /// - `TubegrabError::TranscodeFailure` - MP3 conversion failed
    /// - `TubegrabError::Io` - Staging failed
    #[tracing::instrument(skip(self, video), fields(reference = %video.reference))]
    pub async fn fetch(
        &self,
        video: &ResolvedVideo,
        format: DownloadFormat,
        quality: &QualityChoice,
    ) -> Result<DownloadArtifact> {
        let started = Instant::now();
        let bytes = match format {
            DownloadFormat::Mp3 => self.fetch_audio(video).await?,
            DownloadFormat::Mp4 => self.fetch_video(video, quality).await?,
        };

        tracing::info!(
            "Prepared {} download: {} bytes in {:.2}s",
            format,
            bytes.len(),
            started.elapsed().as_secs_f64()
        );

        Ok(DownloadArtifact {
            file_name: attachment_file_name(&video.title, format),
            format,
            bytes,
        })
    }

    /// Resolves and fetches in one step.
    ///
    /// # Errors
    /// Union of [`DownloadService::resolve`] and [`DownloadService::fetch`].
    pub async fn download(
        &self,
        reference: &str,
        format: DownloadFormat,
        quality: &QualityChoice,
    ) -> Result<DownloadArtifact> {
        let video = self.resolve(reference).await?;
        self.fetch(&video, format, quality).await
    }

    pub async fn check_dependencies(&self) -> DependencyReport {
        DependencyReport {
            resolver: self.resolver.name(),
            resolver_available: self.resolver.is_available().await,
            transcoder_available: self.transcoder.is_available().await,
        }
    }

    async fn fetch_video(&self, video: &ResolvedVideo, quality: &QualityChoice) -> Result<Bytes> {
        let stream = select_video_stream(&video.streams, quality).ok_or_else(|| {
            TubegrabError::StreamNotFound {
                reference: video.reference.clone(),
                wanted: "progressive MP4".to_string(),
            }
        })?;
        tracing::debug!(
            "Selected video format {} ({:?}) for quality {}",
            stream.id,
            stream.resolution,
            quality
        );
        self.resolver.fetch(&video.reference, stream).await
    }

    async fn fetch_audio(&self, video: &ResolvedVideo) -> Result<Bytes> {
        let stream = select_audio_stream(&video.streams).ok_or_else(|| {
            TubegrabError::StreamNotFound {
                reference: video.reference.clone(),
                wanted: "audio-only".to_string(),
            }
        })?;
        tracing::debug!("Selected audio format {} ({})", stream.id, stream.container);

        let raw = self.resolver.fetch(&video.reference, stream).await?;

        let input = self.staging.stage(&raw, &stream.container).await?;
        let output = self.staging.allocate("mp3")?;
        self.transcoder
            .transcode_to_mp3(input.path(), output.path(), &self.transcode_options)
            .await?;

        let mp3 = output.read().await?;
        if mp3.is_empty() {
            return Err(TubegrabError::TranscodeFailure {
                reason: "transcoder produced no output".to_string(),
            });
        }
        Ok(mp3)
    }
}

/// Builds `<title>.<ext>` with characters that are unsafe in file names or
/// headers replaced.
pub fn attachment_file_name(title: &str, format: DownloadFormat) -> String {
    let cleaned: String = title
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .take(180)
        .collect();
    let stem = cleaned.trim().trim_matches('.').trim();
    let stem = if stem.is_empty() { "video" } else { stem };
    format!("{stem}.{}", format.extension())
}
