//! Audio transcoding abstraction for both production and simulation modes

pub mod ffmpeg;
pub mod simulation;

use std::path::Path;

use async_trait::async_trait;

pub use ffmpeg::{FfmpegTranscoder, looks_like_mp3};
pub use simulation::SimulationTranscoder;

use crate::config::TranscoderConfig;
use crate::error::Result;

/// Abstraction over the external component that re-encodes audio to MP3.
#[async_trait]
pub trait AudioTranscoder: Send + Sync + std::fmt::Debug {
    /// Transcode the audio track of `input_path` into an MP3 at `output_path`.
    ///
    /// # Errors
    /// - `TubegrabError::TranscodeFailure` - Transcoder failed, timed out or produced no audio
    /// - `TubegrabError::Io` - File I/O error
    async fn transcode_to_mp3(
        &self,
        input_path: &Path,
        output_path: &Path,
        options: &TranscodeOptions,
    ) -> Result<TranscodeResult>;

    /// Check if the transcoder is available and properly configured
    async fn is_available(&self) -> bool;
}

/// Configuration options for a transcode
#[derive(Debug, Clone, PartialEq)]
pub struct TranscodeOptions {
    /// Encoder passed to `-c:a`
    pub audio_codec: String,

    /// Target bitrate passed to `-b:a`
    pub bitrate: String,

    /// Output sample rate in Hz (None = keep source rate)
    pub sample_rate: Option<u32>,

    /// Maximum allowed processing time (None = no limit)
    pub timeout_seconds: Option<u64>,
}

impl Default for TranscodeOptions {
    fn default() -> Self {
        Self {
            audio_codec: "libmp3lame".to_string(),
            bitrate: "192k".to_string(),
            sample_rate: None,
            timeout_seconds: Some(300), // 5 minute timeout
        }
    }
}

impl TranscodeOptions {
    /// Builds options from the transcoder section of the configuration.
    pub fn from_config(config: &TranscoderConfig) -> Self {
        Self {
            bitrate: config.audio_bitrate.clone(),
            timeout_seconds: Some(config.timeout.as_secs()),
            ..Default::default()
        }
    }
}

/// Result of a transcode
#[derive(Debug)]
pub struct TranscodeResult {
    /// Size of output file in bytes
    pub output_size: u64,

    /// Processing time in seconds
    pub processing_time: f64,
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_transcode_options_defaults() {
        let options = TranscodeOptions::default();
        assert_eq!(options.audio_codec, "libmp3lame");
        assert_eq!(options.bitrate, "192k");
        assert_eq!(options.sample_rate, None);
        assert_eq!(options.timeout_seconds, Some(300));
    }

    #[test]
    fn test_transcode_options_from_config() {
        let config = TranscoderConfig {
            audio_bitrate: "128k".to_string(),
            timeout: Duration::from_secs(42),
            ..Default::default()
        };
        let options = TranscodeOptions::from_config(&config);
        assert_eq!(options.bitrate, "128k");
        assert_eq!(options.timeout_seconds, Some(42));
        assert_eq!(options.audio_codec, "libmp3lame");
    }
}
