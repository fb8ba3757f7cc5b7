//! Error taxonomy shared by every Tubegrab subsystem.

/// Errors that can bubble up from resolving, selecting, fetching or
/// transcoding a video.
///
/// Every variant carries a distinct user-facing message (see
/// [`TubegrabError::user_message`]) so the web layer never has to fall back
/// to a generic "something went wrong".
#[derive(Debug, thiserror::Error)]
pub enum TubegrabError {
    #[error("Invalid video reference '{reference}': {reason}")]
    InvalidReference { reference: String, reason: String },

    #[error("Video '{reference}' cannot be resolved: {reason}")]
    ResolutionUnavailable { reference: String, reason: String },

    #[error("No {wanted} stream available for '{reference}'")]
    StreamNotFound { reference: String, wanted: String },

    #[error("Transcoding failed: {reason}")]
    TranscodeFailure { reason: String },

    #[error("Upstream unavailable: {reason}")]
    UpstreamUnavailable { reason: String },

    #[error("Unsupported download format: {format}")]
    UnsupportedFormat { format: String },

    #[error("Configuration error: {reason}")]
    Configuration { reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TubegrabError {
    /// Returns a user-friendly error message suitable for display.
    pub fn user_message(&self) -> String {
        match self {
            TubegrabError::InvalidReference { .. } => {
                "That does not look like a supported video URL.".to_string()
            }
            TubegrabError::ResolutionUnavailable { .. } => {
                "This video is unavailable. It may be private, removed or region-restricted."
                    .to_string()
            }
            TubegrabError::StreamNotFound { wanted, .. } => {
                format!("No {wanted} stream is available for this video.")
            }
            TubegrabError::TranscodeFailure { .. } => {
                "Converting the audio track to MP3 failed.".to_string()
            }
            TubegrabError::UpstreamUnavailable { .. } => {
                "The video service could not be reached. Please try again later.".to_string()
            }
            TubegrabError::UnsupportedFormat { format } => {
                format!("Unsupported download format '{format}'. Choose MP4 or MP3.")
            }
            TubegrabError::Configuration { .. } | TubegrabError::Io(_) => {
                "An unexpected server error occurred.".to_string()
            }
        }
    }

    /// Checks if this error was caused by the request rather than the server
    /// or its collaborators.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            TubegrabError::InvalidReference { .. }
                | TubegrabError::ResolutionUnavailable { .. }
                | TubegrabError::StreamNotFound { .. }
                | TubegrabError::UnsupportedFormat { .. }
        )
    }

    /// Stable short name of the variant, used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            TubegrabError::InvalidReference { .. } => "invalid_reference",
            TubegrabError::ResolutionUnavailable { .. } => "resolution_unavailable",
            TubegrabError::StreamNotFound { .. } => "stream_not_found",
            TubegrabError::TranscodeFailure { .. } => "transcode_failure",
            TubegrabError::UpstreamUnavailable { .. } => "upstream_unavailable",
            TubegrabError::UnsupportedFormat { .. } => "unsupported_format",
            TubegrabError::Configuration { .. } => "configuration",
            TubegrabError::Io(_) => "io",
        }
    }
}

pub type Result<T> = std::result::Result<T, TubegrabError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn all_variants() -> Vec<TubegrabError> {
        vec![
            TubegrabError::InvalidReference {
                reference: "x".to_string(),
                reason: "bad".to_string(),
            },
            TubegrabError::ResolutionUnavailable {
                reference: "x".to_string(),
                reason: "private".to_string(),
            },
            TubegrabError::StreamNotFound {
                reference: "x".to_string(),
                wanted: "audio-only".to_string(),
            },
            TubegrabError::TranscodeFailure {
                reason: "exit 1".to_string(),
            },
            TubegrabError::UpstreamUnavailable {
                reason: "timeout".to_string(),
            },
            TubegrabError::UnsupportedFormat {
                format: "ogg".to_string(),
            },
        ]
    }

    #[test]
    fn test_classified_errors_have_distinct_messages() {
        let messages: Vec<String> = all_variants().iter().map(|e| e.user_message()).collect();
        for (i, message) in messages.iter().enumerate() {
            for other in &messages[i + 1..] {
                assert_ne!(message, other);
            }
        }
    }

    #[test]
    fn test_user_error_classification() {
        assert!(
            TubegrabError::InvalidReference {
                reference: String::new(),
                reason: String::new()
            }
            .is_user_error()
        );
        assert!(
            !TubegrabError::UpstreamUnavailable {
                reason: String::new()
            }
            .is_user_error()
        );
        assert!(
            !TubegrabError::TranscodeFailure {
                reason: String::new()
            }
            .is_user_error()
        );
    }

    #[test]
    fn test_io_error_converts() {
        let error: TubegrabError = std::io::Error::other("disk full").into();
        assert_eq!(error.kind(), "io");
        assert!(!error.is_user_error());
    }
}
