//! Production transcoder driving the ffmpeg binary.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::io::AsyncReadExt;

use super::{AudioTranscoder, TranscodeOptions, TranscodeResult};
use crate::error::{Result, TubegrabError};

/// Production transcoder using the ffmpeg command-line tool
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    ffmpeg_path: PathBuf,
}

/// Checks for an ID3v2 tag or an MPEG audio frame sync at the start of a file.
pub fn looks_like_mp3(header: &[u8]) -> bool {
    match header {
        [b'I', b'D', b'3', ..] => true,
        [0xFF, second, ..] => second & 0xE0 == 0xE0,
        _ => false,
    }
}

impl FfmpegTranscoder {
    /// Create new transcoder with a custom binary path
    pub fn new(ffmpeg_path: PathBuf) -> Self {
        Self { ffmpeg_path }
    }

    fn build_command(
        &self,
        input_path: &Path,
        output_path: &Path,
        options: &TranscodeOptions,
    ) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new(&self.ffmpeg_path);
        cmd.arg("-hide_banner")
            .arg("-nostdin")
            .arg("-y") // Overwrite the pre-allocated output file
            .arg("-i")
            .arg(input_path)
            .arg("-vn") // Drop any video track
            .arg("-c:a")
            .arg(&options.audio_codec)
            .arg("-b:a")
            .arg(&options.bitrate);

        if let Some(rate) = options.sample_rate {
            cmd.arg("-ar").arg(rate.to_string());
        }

        cmd.arg("-f").arg("mp3").arg(output_path);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl AudioTranscoder for FfmpegTranscoder {
    async fn transcode_to_mp3(
        &self,
        input_path: &Path,
        output_path: &Path,
        options: &TranscodeOptions,
    ) -> Result<TranscodeResult> {
        let start_time = Instant::now();

        tracing::info!(
            "Starting FFmpeg transcode: {} -> {}",
            input_path.display(),
            output_path.display()
        );
        tracing::debug!("Transcode options: {:?}", options);

        let mut cmd = self.build_command(input_path, output_path, options);
        tracing::debug!("Executing FFmpeg command: {:?}", cmd);

        let run = cmd.output();
        let output = match options.timeout_seconds {
            Some(seconds) => tokio::time::timeout(Duration::from_secs(seconds), run)
                .await
                .map_err(|_| TubegrabError::TranscodeFailure {
                    reason: format!("FFmpeg timed out after {seconds}s"),
                })?,
            None => run.await,
        }
        .map_err(|e| {
            tracing::error!("Failed to execute FFmpeg: {}", e);
            TubegrabError::TranscodeFailure {
                reason: format!("failed to execute {}: {e}", self.ffmpeg_path.display()),
            }
        })?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            tracing::error!("FFmpeg failed with exit code {}: {}", output.status, stderr);
            return Err(TubegrabError::TranscodeFailure {
                reason: format!("FFmpeg failed with exit code {}: {stderr}", output.status),
            });
        }
        if !stderr.is_empty() {
            tracing::debug!("FFmpeg stderr: {}", stderr);
        }

        let output_size = tokio::fs::metadata(output_path).await?.len();
        if output_size == 0 {
            return Err(TubegrabError::TranscodeFailure {
                reason: "FFmpeg produced an empty file".to_string(),
            });
        }

        let mut header = [0u8; 4];
        let mut file = tokio::fs::File::open(output_path).await?;
        let read = file.read(&mut header).await?;
        if !looks_like_mp3(&header[..read]) {
            tracing::error!("Invalid MP3 output. Header: {:?}", &header[..read]);
            return Err(TubegrabError::TranscodeFailure {
                reason: "output does not start with an MP3 frame or ID3 tag".to_string(),
            });
        }

        let processing_time = start_time.elapsed().as_secs_f64();

        tracing::info!(
            "Successfully transcoded {} to MP3: {} bytes in {:.2}s",
            input_path.display(),
            output_size,
            processing_time
        );

        Ok(TranscodeResult {
            output_size,
            processing_time,
        })
    }

    async fn is_available(&self) -> bool {
        tokio::process::Command::new(&self.ffmpeg_path)
            .arg("-version")
            .stdin(Stdio::null())
            .output()
            .await
            .map(|output| output.status.success())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_mp3_header_detection() {
        assert!(looks_like_mp3(b"ID3\x04\x00"));
        assert!(looks_like_mp3(&[0xFF, 0xFB, 0x90, 0x64]));
        assert!(!looks_like_mp3(b"\x00\x00\x00\x18ftypmp42"));
        assert!(!looks_like_mp3(&[0xFF]));
        assert!(!looks_like_mp3(&[]));
    }

    #[test]
    fn test_command_arguments() {
        let transcoder = FfmpegTranscoder::new(PathBuf::from("ffmpeg"));
        let options = TranscodeOptions {
            sample_rate: Some(44_100),
            ..Default::default()
        };
        let cmd = transcoder.build_command(Path::new("in.m4a"), Path::new("out.mp3"), &options);
        let args: Vec<String> = cmd
            .as_std()
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();

        assert!(args.windows(2).any(|w| w == ["-c:a", "libmp3lame"]));
        assert!(args.windows(2).any(|w| w == ["-b:a", "192k"]));
        assert!(args.windows(2).any(|w| w == ["-ar", "44100"]));
        assert!(args.contains(&"-vn".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("out.mp3"));
    }

    #[tokio::test]
    async fn test_missing_binary_is_transcode_failure() {
        let temp_dir = tempdir().unwrap();
        let input_path = temp_dir.path().join("input.m4a");
        let output_path = temp_dir.path().join("output.mp3");
        std::fs::write(&input_path, b"dummy content").unwrap();

        let transcoder = FfmpegTranscoder::new(PathBuf::from("/nonexistent/tubegrab-ffmpeg"));
        assert!(!transcoder.is_available().await);

        let result = transcoder
            .transcode_to_mp3(&input_path, &output_path, &TranscodeOptions::default())
            .await;
        assert!(matches!(result, Err(TubegrabError::TranscodeFailure { .. })));
    }
}
