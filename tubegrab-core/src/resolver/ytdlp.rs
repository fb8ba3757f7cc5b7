//! yt-dlp backed resolver.

use std::ffi::OsStr;
use std::path::PathBuf;
use std::process::{Output, Stdio};
use std::sync::LazyLock;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use regex::Regex;
use serde::Deserialize;

use super::StreamResolver;
use crate::config::ResolverConfig;
use crate::error::{Result, TubegrabError};
use crate::media::{ResolvedVideo, StreamDescriptor, StreamKind, resolution_label};

/// Resolver that shells out to the yt-dlp binary.
#[derive(Debug, Clone)]
pub struct YtDlpResolver {
    binary: PathBuf,
    timeout: Duration,
}

/// Subset of `yt-dlp -J` output that Tubegrab consumes.
#[derive(Debug, Deserialize)]
struct YtDlpInfo {
    title: Option<String>,
    thumbnail: Option<String>,
    #[serde(default)]
    formats: Vec<YtDlpFormat>,
}

#[derive(Debug, Deserialize)]
struct YtDlpFormat {
    format_id: String,
    ext: Option<String>,
    vcodec: Option<String>,
    acodec: Option<String>,
    height: Option<u32>,
    abr: Option<f64>,
}

impl YtDlpFormat {
    fn kind(&self) -> Option<StreamKind> {
        let has_video = match self.vcodec.as_deref() {
            Some("none") => false,
            Some(_) => true,
            None => self.height.is_some(),
        };
        // Formats without codec information are muxed when they carry video
        let has_audio = match self.acodec.as_deref() {
            Some("none") => false,
            Some(_) => true,
            None => has_video,
        };

        match (has_video, has_audio) {
            (true, true) => Some(StreamKind::Progressive),
            (true, false) => Some(StreamKind::VideoOnly),
            (false, true) => Some(StreamKind::AudioOnly),
            (false, false) => None,
        }
    }

    fn into_descriptor(self) -> Option<StreamDescriptor> {
        let kind = self.kind()?;
        let height = match kind {
            StreamKind::AudioOnly => None,
            _ => self.height,
        };
        Some(StreamDescriptor {
            id: self.format_id,
            kind,
            container: self.ext.unwrap_or_else(|| "unknown".to_string()),
            resolution: height.map(resolution_label),
            height,
            audio_bitrate: self.abr.map(|abr| abr.round() as u32),
        })
    }
}

/// Parses `yt-dlp -J` output into a [`ResolvedVideo`].
///
/// Formats that carry neither audio nor video (storyboards) are dropped.
///
/// # Errors
/// - `TubegrabError::UpstreamUnavailable` - Output is not the expected JSON document
pub fn parse_video_info(reference: &str, json: &[u8]) -> Result<ResolvedVideo> {
    let info: YtDlpInfo =
        serde_json::from_slice(json).map_err(|e| TubegrabError::UpstreamUnavailable {
            reason: format!("unexpected yt-dlp output: {e}"),
        })?;

    let streams = info
        .formats
        .into_iter()
        .filter_map(YtDlpFormat::into_descriptor)
        .collect();

    Ok(ResolvedVideo {
        reference: reference.to_string(),
        title: info
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| "video".to_string()),
        thumbnail_url: info.thumbnail,
        streams,
    })
}

static ERROR_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^ERROR:\s*(?:\[[^\]]+\]\s*)?(?:[\w-]+:\s+)?(.+)$")
        .expect("yt-dlp error pattern is a valid regex")
});

/// Maps yt-dlp stderr onto the error taxonomy.
///
/// Anything not recognised becomes `UpstreamUnavailable` and is logged with
/// the raw stderr so new failure modes show up in the logs.
pub fn classify_ytdlp_error(reference: &str, stderr: &str) -> TubegrabError {
    let message = ERROR_LINE
        .captures_iter(stderr)
        .last()
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_else(|| stderr.trim().to_string());
    let lower = stderr.to_lowercase();

    let invalid = |reason: &str| TubegrabError::InvalidReference {
        reference: reference.to_string(),
        reason: reason.to_string(),
    };
    let unavailable = || TubegrabError::ResolutionUnavailable {
        reference: reference.to_string(),
        reason: message.clone(),
    };
    let upstream = || TubegrabError::UpstreamUnavailable {
        reason: message.clone(),
    };

    if lower.contains("unsupported url") {
        return invalid("no extractor supports this URL");
    }
    if lower.contains("is not a valid url") || lower.contains("invalid url") {
        return invalid("not a valid URL");
    }
    if lower.contains("incomplete youtube id") || lower.contains("looks truncated") {
        return invalid("the video ID in the URL is incomplete");
    }
    if lower.contains("requested format") && lower.contains("not available") {
        return TubegrabError::StreamNotFound {
            reference: reference.to_string(),
            wanted: "requested".to_string(),
        };
    }
    if lower.contains("not a bot") || lower.contains("http error 429") {
        return upstream();
    }
    if lower.contains("private video")
        || lower.contains("video unavailable")
        || lower.contains("has been removed")
        || lower.contains("members-only")
        || lower.contains("sign in to confirm your age")
        || lower.contains("copyright")
        || lower.contains("not available in your country")
        || (lower.contains("geo") && lower.contains("block"))
        || lower.contains("not available")
    {
        return unavailable();
    }
    if lower.contains("timed out")
        || lower.contains("unable to download webpage")
        || lower.contains("name or service not known")
        || lower.contains("connection")
    {
        return upstream();
    }

    tracing::warn!(
        error_kind = "unclassified",
        "Unrecognised yt-dlp failure for {reference}: {stderr}"
    );
    upstream()
}

impl YtDlpResolver {
    /// Create a resolver from configuration.
    pub fn new(config: &ResolverConfig) -> Self {
        Self {
            binary: config.ytdlp_path.clone(),
            timeout: config.timeout,
        }
    }

    /// Runs yt-dlp with a bounded wall-clock time.
    async fn run<I, S>(&self, args: I, reference: &str) -> Result<Output>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut cmd = tokio::process::Command::new(&self.binary);
        cmd.args(args)
            // The reference is positional even if it starts with a dash
            .arg("--")
            .arg(reference)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        tracing::debug!("Executing yt-dlp command: {:?}", cmd);

        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                tracing::error!("Failed to execute yt-dlp: {}", e);
                return Err(TubegrabError::UpstreamUnavailable {
                    reason: format!("failed to execute {}: {e}", self.binary.display()),
                });
            }
            Err(_) => {
                return Err(TubegrabError::UpstreamUnavailable {
                    reason: format!("yt-dlp timed out after {}s", self.timeout.as_secs()),
                });
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::warn!("yt-dlp failed with exit code {}: {}", output.status, stderr);
            return Err(classify_ytdlp_error(reference, &stderr));
        }

        Ok(output)
    }
}

#[async_trait]
impl StreamResolver for YtDlpResolver {
    async fn resolve(&self, reference: &str) -> Result<ResolvedVideo> {
        let started = Instant::now();
        let output = self
            .run(["-J", "--no-playlist", "--no-warnings"], reference)
            .await?;
        let video = parse_video_info(reference, &output.stdout)?;

        tracing::info!(
            "Resolved {} ({} streams) in {:.2}s",
            reference,
            video.streams.len(),
            started.elapsed().as_secs_f64()
        );
        Ok(video)
    }

    async fn fetch(&self, reference: &str, stream: &StreamDescriptor) -> Result<Bytes> {
        let started = Instant::now();
        let output = self
            .run(
                [
                    "-f",
                    stream.id.as_str(),
                    "-o",
                    "-",
                    "--no-part",
                    "--no-playlist",
                    "--quiet",
                    "--no-warnings",
                ],
                reference,
            )
            .await?;

        if output.stdout.is_empty() {
            return Err(TubegrabError::UpstreamUnavailable {
                reason: format!("yt-dlp returned no data for format {}", stream.id),
            });
        }

        tracing::info!(
            "Fetched format {} of {}: {} bytes in {:.2}s",
            stream.id,
            reference,
            output.stdout.len(),
            started.elapsed().as_secs_f64()
        );
        Ok(Bytes::from(output.stdout))
    }

    async fn is_available(&self) -> bool {
        tokio::process::Command::new(&self.binary)
            .arg("--version")
            .stdin(Stdio::null())
            .output()
            .await
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    fn name(&self) -> &'static str {
        "yt-dlp"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_INFO: &str = r#"{
        "id": "dQw4w9WgXcQ",
        "title": "Sample Video",
        "thumbnail": "https://i.ytimg.com/vi/dQw4w9WgXcQ/maxresdefault.jpg",
        "formats": [
            {"format_id": "sb0", "ext": "mhtml", "vcodec": "none", "acodec": "none"},
            {"format_id": "140", "ext": "m4a", "vcodec": "none", "acodec": "mp4a.40.2", "abr": 129.48},
            {"format_id": "251", "ext": "webm", "vcodec": "none", "acodec": "opus", "abr": 135.1},
            {"format_id": "18", "ext": "mp4", "vcodec": "avc1.42001E", "acodec": "mp4a.40.2", "height": 360},
            {"format_id": "137", "ext": "mp4", "vcodec": "avc1.640028", "acodec": "none", "height": 1080},
            {"format_id": "http-720", "ext": "mp4", "height": 720}
        ]
    }"#;

    #[test]
    fn test_parse_video_info_kinds() {
        let video = parse_video_info("https://example.com/v", SAMPLE_INFO.as_bytes()).unwrap();

        assert_eq!(video.title, "Sample Video");
        assert_eq!(video.reference, "https://example.com/v");
        assert_eq!(video.streams.len(), 5);

        let kind_of = |id: &str| video.streams.iter().find(|s| s.id == id).unwrap().kind;
        assert_eq!(kind_of("140"), StreamKind::AudioOnly);
        assert_eq!(kind_of("18"), StreamKind::Progressive);
        assert_eq!(kind_of("137"), StreamKind::VideoOnly);
        assert_eq!(kind_of("http-720"), StreamKind::Progressive);

        let audio = video.streams.iter().find(|s| s.id == "140").unwrap();
        assert_eq!(audio.audio_bitrate, Some(129));
        assert_eq!(audio.resolution, None);

        let progressive = video.streams.iter().find(|s| s.id == "18").unwrap();
        assert_eq!(progressive.resolution.as_deref(), Some("360p"));
    }

    #[test]
    fn test_parse_video_info_missing_title() {
        let video = parse_video_info("u", br#"{"title": "  ", "formats": []}"#).unwrap();
        assert_eq!(video.title, "video");
        assert!(video.streams.is_empty());
        assert!(video.thumbnail_url.is_none());
    }

    #[test]
    fn test_parse_video_info_garbage() {
        let result = parse_video_info("u", b"<html>nope</html>");
        assert!(matches!(
            result,
            Err(TubegrabError::UpstreamUnavailable { .. })
        ));
    }

    #[test]
    fn test_classify_unsupported_url() {
        let error = classify_ytdlp_error("foo", "ERROR: Unsupported URL: foo\n");
        assert!(matches!(error, TubegrabError::InvalidReference { .. }));

        let error = classify_ytdlp_error(
            "foo",
            "ERROR: [generic] 'foo' is not a valid URL. Set --default-search \"ytsearch\"",
        );
        assert!(matches!(error, TubegrabError::InvalidReference { .. }));

        let error = classify_ytdlp_error(
            "https://www.youtube.com/watch?v=dQw4w9",
            "ERROR: [youtube:truncated_id] dQw4w9: Incomplete YouTube ID dQw4w9. \
             URL https://www.youtube.com/watch?v=dQw4w9 looks truncated.",
        );
        assert!(matches!(error, TubegrabError::InvalidReference { .. }));

        let error = classify_ytdlp_error(
            "https://www.youtube.com/watch?v=",
            "ERROR: [youtube:truncated_url] The URL https://www.youtube.com/watch?v= looks truncated.",
        );
        assert!(matches!(error, TubegrabError::InvalidReference { .. }));
    }

    #[test]
    fn test_classify_unavailable() {
        let error = classify_ytdlp_error(
            "u",
            "ERROR: [youtube] abc123: Private video. Sign in if you've been granted access",
        );
        match error {
            TubegrabError::ResolutionUnavailable { reason, .. } => {
                assert!(reason.starts_with("Private video"));
            }
            other => panic!("unexpected classification: {other:?}"),
        }

        let error = classify_ytdlp_error("u", "ERROR: [youtube] abc123: Video unavailable");
        assert!(matches!(error, TubegrabError::ResolutionUnavailable { .. }));
    }

    #[test]
    fn test_classify_requested_format() {
        let error = classify_ytdlp_error(
            "u",
            "ERROR: [youtube] abc123: Requested format is not available. Use --list-formats",
        );
        assert!(matches!(error, TubegrabError::StreamNotFound { .. }));
    }

    #[test]
    fn test_classify_network_and_fallback() {
        let error = classify_ytdlp_error(
            "u",
            "ERROR: [youtube] abc: Unable to download webpage: <urlopen error timed out>",
        );
        assert!(matches!(error, TubegrabError::UpstreamUnavailable { .. }));

        let error = classify_ytdlp_error(
            "u",
            "ERROR: [youtube] abc: Sign in to confirm you're not a bot",
        );
        assert!(matches!(error, TubegrabError::UpstreamUnavailable { .. }));

        let error = classify_ytdlp_error("u", "Traceback (most recent call last): boom");
        match error {
            TubegrabError::UpstreamUnavailable { reason } => assert!(reason.contains("boom")),
            other => panic!("unexpected classification: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_binary_is_upstream_error() {
        let resolver = YtDlpResolver::new(&ResolverConfig {
            ytdlp_path: PathBuf::from("/nonexistent/tubegrab-yt-dlp"),
            timeout: Duration::from_secs(5),
        });

        assert!(!resolver.is_available().await);
        let result = resolver.resolve("https://example.com/watch?v=1").await;
        assert!(matches!(
            result,
            Err(TubegrabError::UpstreamUnavailable { .. })
        ));
    }
}
