//! Request-scoped media types.

use serde::{Deserialize, Serialize};

use crate::error::TubegrabError;

/// What a stream variant carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamKind {
    /// Audio and video multiplexed together
    Progressive,
    /// Video track without audio (adaptive streaming)
    VideoOnly,
    /// Audio track without video
    AudioOnly,
}

impl std::fmt::Display for StreamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamKind::Progressive => write!(f, "progressive"),
            StreamKind::VideoOnly => write!(f, "video-only"),
            StreamKind::AudioOnly => write!(f, "audio-only"),
        }
    }
}

/// One retrievable media variant of a video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamDescriptor {
    /// Resolver-specific identifier used to fetch the bytes (yt-dlp format id)
    pub id: String,
    pub kind: StreamKind,
    /// Container extension, e.g. "mp4", "webm", "m4a"
    pub container: String,
    /// Resolution label such as "720p"; None for audio-only streams
    pub resolution: Option<String>,
    /// Frame height in pixels
    pub height: Option<u32>,
    /// Average audio bitrate in kbit/s
    pub audio_bitrate: Option<u32>,
}

impl StreamDescriptor {
    /// Whether the stream uses an MP4 container.
    pub fn is_mp4(&self) -> bool {
        self.container.eq_ignore_ascii_case("mp4")
    }

    /// Pixel height, taken from the descriptor or parsed from its label.
    pub fn effective_height(&self) -> u32 {
        self.height
            .or_else(|| self.resolution.as_deref().and_then(height_from_label))
            .unwrap_or(0)
    }
}

/// A video reference after the resolver has looked it up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedVideo {
    /// The URL exactly as submitted (trimmed)
    pub reference: String,
    pub title: String,
    pub thumbnail_url: Option<String>,
    pub streams: Vec<StreamDescriptor>,
}

/// Requested output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadFormat {
    /// Progressive video in an MP4 container
    Mp4,
    /// Audio track re-encoded to MP3
    Mp3,
}

impl DownloadFormat {
    /// File extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            DownloadFormat::Mp4 => "mp4",
            DownloadFormat::Mp3 => "mp3",
        }
    }

    /// MIME type declared on the attachment.
    pub fn mime_type(self) -> &'static str {
        match self {
            DownloadFormat::Mp4 => "video/mp4",
            DownloadFormat::Mp3 => "audio/mpeg",
        }
    }
}

impl std::str::FromStr for DownloadFormat {
    type Err = TubegrabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mp4" => Ok(DownloadFormat::Mp4),
            "mp3" => Ok(DownloadFormat::Mp3),
            other => Err(TubegrabError::UnsupportedFormat {
                format: other.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for DownloadFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Requested video quality.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QualityChoice {
    Highest,
    /// An exact resolution label such as "480p"
    Label(String),
}

impl QualityChoice {
    /// Interprets the optional `quality` form field. Missing, blank and
    /// "highest" all mean [`QualityChoice::Highest`].
    pub fn from_form(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            None | Some("") => QualityChoice::Highest,
            Some(v) if v.eq_ignore_ascii_case("highest") => QualityChoice::Highest,
            Some(v) => QualityChoice::Label(v.to_string()),
        }
    }
}

impl std::fmt::Display for QualityChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QualityChoice::Highest => write!(f, "highest"),
            QualityChoice::Label(label) => f.write_str(label),
        }
    }
}

/// Formats a pixel height as a resolution label ("720p").
pub fn resolution_label(height: u32) -> String {
    format!("{height}p")
}

/// Parses the leading digits of a label like "1080p" or "720p60".
pub fn height_from_label(label: &str) -> Option<u32> {
    let digits: String = label.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_format_parsing() {
        assert_eq!("mp4".parse::<DownloadFormat>().unwrap(), DownloadFormat::Mp4);
        assert_eq!(" MP3 ".parse::<DownloadFormat>().unwrap(), DownloadFormat::Mp3);
        assert!(matches!(
            "flac".parse::<DownloadFormat>(),
            Err(TubegrabError::UnsupportedFormat { format }) if format == "flac"
        ));
    }

    #[test]
    fn test_mime_types_never_cross() {
        assert_eq!(DownloadFormat::Mp3.mime_type(), "audio/mpeg");
        assert_eq!(DownloadFormat::Mp4.mime_type(), "video/mp4");
    }

    #[test]
    fn test_quality_from_form() {
        assert_eq!(QualityChoice::from_form(None), QualityChoice::Highest);
        assert_eq!(QualityChoice::from_form(Some("  ")), QualityChoice::Highest);
        assert_eq!(QualityChoice::from_form(Some("Highest")), QualityChoice::Highest);
        assert_eq!(
            QualityChoice::from_form(Some("360p")),
            QualityChoice::Label("360p".to_string())
        );
    }

    #[test]
    fn test_height_from_label() {
        assert_eq!(height_from_label("1080p"), Some(1080));
        assert_eq!(height_from_label("720p60"), Some(720));
        assert_eq!(height_from_label("audio"), None);
        assert_eq!(resolution_label(144), "144p");
    }
}
