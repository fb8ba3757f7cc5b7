//! Simulation transcoder for development mode
//!
//! Produces a deterministic MP3-shaped file (ID3 tag followed by frames that
//! wrap the input bytes) without invoking ffmpeg, and simulates processing
//! time proportional to the input size.

use std::path::Path;
use std::time::Instant;

use async_trait::async_trait;

use super::{AudioTranscoder, TranscodeOptions, TranscodeResult};
use crate::error::{Result, TubegrabError};

/// Empty ID3v2.4 tag header
const ID3_HEADER: [u8; 10] = [b'I', b'D', b'3', 4, 0, 0, 0, 0, 0, 0];
/// MPEG-1 Layer III, 128 kbit/s, 44.1 kHz frame header
const FRAME_HEADER: [u8; 4] = [0xFF, 0xFB, 0x90, 0x64];
/// Payload bytes per frame for the header above
const FRAME_PAYLOAD: usize = 413;

/// Simulation transcoder for offline development and tests
#[derive(Debug, Clone)]
pub struct SimulationTranscoder {
    /// Simulated processing speed in megabytes per second
    processing_speed_mb_per_sec: f64,

    /// Whether to simulate the transcoder as available
    is_available: bool,
}

impl SimulationTranscoder {
    /// Create new simulation transcoder
    pub fn new() -> Self {
        Self {
            processing_speed_mb_per_sec: 100.0, // Simulate 100 MB/s
            is_available: true,
        }
    }

    /// Configure simulated processing speed
    pub fn with_speed(mut self, mb_per_sec: f64) -> Self {
        self.processing_speed_mb_per_sec = mb_per_sec;
        self
    }

    /// Simulate the transcoder being unavailable
    pub fn unavailable(mut self) -> Self {
        self.is_available = false;
        self
    }

    /// Wraps raw bytes into MP3-shaped frames.
    pub fn encode(input: &[u8]) -> Vec<u8> {
        let frames = input.len().div_ceil(FRAME_PAYLOAD);
        let mut output = Vec::with_capacity(ID3_HEADER.len() + frames * (FRAME_PAYLOAD + 4));
        output.extend_from_slice(&ID3_HEADER);
        for chunk in input.chunks(FRAME_PAYLOAD) {
            output.extend_from_slice(&FRAME_HEADER);
            output.extend_from_slice(chunk);
            output.resize(output.len() + FRAME_PAYLOAD - chunk.len(), 0);
        }
        output
    }
}

impl Default for SimulationTranscoder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AudioTranscoder for SimulationTranscoder {
    async fn transcode_to_mp3(
        &self,
        input_path: &Path,
        output_path: &Path,
        _options: &TranscodeOptions,
    ) -> Result<TranscodeResult> {
        if !self.is_available {
            return Err(TubegrabError::TranscodeFailure {
                reason: "transcoder not available in simulation".to_string(),
            });
        }

        let start_time = Instant::now();
        let input = tokio::fs::read(input_path).await?;
        if input.is_empty() {
            return Err(TubegrabError::TranscodeFailure {
                reason: "input contains no audio data".to_string(),
            });
        }

        let encoded = Self::encode(&input);
        tokio::fs::write(output_path, &encoded).await?;

        let input_mb = input.len() as f64 / (1024.0 * 1024.0);
        let simulated_processing_time = input_mb / self.processing_speed_mb_per_sec;
        let actual_processing_time = start_time.elapsed().as_secs_f64();

        if actual_processing_time < simulated_processing_time {
            let delay = simulated_processing_time - actual_processing_time;
            tokio::time::sleep(tokio::time::Duration::from_secs_f64(delay)).await;
        }

        Ok(TranscodeResult {
            output_size: encoded.len() as u64,
            processing_time: simulated_processing_time.max(actual_processing_time),
        })
    }

    async fn is_available(&self) -> bool {
        self.is_available
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;
    use crate::transcoding::looks_like_mp3;

    #[test]
    fn test_encode_frames() {
        let encoded = SimulationTranscoder::encode(&[7u8; 1000]);
        assert!(looks_like_mp3(&encoded));
        // Three frames: 413 + 413 + 174 padded
        assert_eq!(encoded.len(), 10 + 3 * (4 + FRAME_PAYLOAD));
        assert_eq!(&encoded[10..14], &FRAME_HEADER);
    }

    #[tokio::test]
    async fn test_simulation_transcode() {
        let temp_dir = tempdir().unwrap();
        let input_path = temp_dir.path().join("input.m4a");
        let output_path = temp_dir.path().join("output.mp3");
        std::fs::write(&input_path, vec![1u8; 64 * 1024]).unwrap();

        let transcoder = SimulationTranscoder::new().with_speed(1000.0);
        let result = transcoder
            .transcode_to_mp3(&input_path, &output_path, &TranscodeOptions::default())
            .await
            .unwrap();

        let written = std::fs::read(&output_path).unwrap();
        assert_eq!(result.output_size, written.len() as u64);
        assert!(looks_like_mp3(&written));
    }

    #[tokio::test]
    async fn test_simulation_unavailable() {
        let temp_dir = tempdir().unwrap();
        let input_path = temp_dir.path().join("input.m4a");
        let output_path = temp_dir.path().join("output.mp3");
        std::fs::write(&input_path, b"dummy content").unwrap();

        let transcoder = SimulationTranscoder::new().unavailable();
        assert!(!transcoder.is_available().await);

        let result = transcoder
            .transcode_to_mp3(&input_path, &output_path, &TranscodeOptions::default())
            .await;
        assert!(matches!(result, Err(TubegrabError::TranscodeFailure { .. })));
    }

    #[tokio::test]
    async fn test_simulation_rejects_empty_input() {
        let temp_dir = tempdir().unwrap();
        let input_path = temp_dir.path().join("input.m4a");
        std::fs::write(&input_path, b"").unwrap();

        let result = SimulationTranscoder::new()
            .transcode_to_mp3(
                &input_path,
                &temp_dir.path().join("out.mp3"),
                &TranscodeOptions::default(),
            )
            .await;
        assert!(matches!(result, Err(TubegrabError::TranscodeFailure { .. })));
    }
}
