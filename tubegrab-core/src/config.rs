//! Centralized configuration for Tubegrab.
//!
//! All tunable parameters and settings are defined here to avoid
//! hard-coded values scattered throughout the codebase.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Result, TubegrabError};

/// Central configuration for all Tubegrab components.
///
/// Groups related configuration settings into logical sections.
/// Supports environment variable overrides for runtime customization.
#[derive(Debug, Clone, Default)]
pub struct TubegrabConfig {
    pub server: ServerConfig,
    pub resolver: ResolverConfig,
    pub transcoder: TranscoderConfig,
    pub staging: StagingConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
        }
    }
}

impl ServerConfig {
    /// Parses host and port into a socket address.
    ///
    /// # Errors
    /// - `TubegrabError::Configuration` - Host is not a valid IP address
    pub fn bind_address(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| TubegrabError::Configuration {
                reason: format!("invalid bind address {}:{}: {e}", self.host, self.port),
            })
    }
}

/// Stream resolver (yt-dlp) configuration.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Path or name of the yt-dlp binary
    pub ytdlp_path: PathBuf,
    /// Upper bound on a single metadata or fetch call
    pub timeout: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            ytdlp_path: PathBuf::from("yt-dlp"),
            timeout: Duration::from_secs(180),
        }
    }
}

/// Audio transcoder (ffmpeg) configuration.
#[derive(Debug, Clone)]
pub struct TranscoderConfig {
    /// Path or name of the ffmpeg binary
    pub ffmpeg_path: PathBuf,
    /// Target MP3 bitrate passed to `-b:a`
    pub audio_bitrate: String,
    /// Upper bound on a single transcode
    pub timeout: Duration,
}

impl Default for TranscoderConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: PathBuf::from("ffmpeg"),
            audio_bitrate: "192k".to_string(),
            timeout: Duration::from_secs(300), // 5 minutes
        }
    }
}

/// Scratch storage for transcoder input and output.
#[derive(Debug, Clone, Default)]
pub struct StagingConfig {
    /// Directory for staged files (None = system temp dir)
    pub directory: Option<PathBuf>,
}

impl TubegrabConfig {
    /// Creates configuration with environment variable overrides.
    ///
    /// Allows runtime configuration via environment variables while
    /// maintaining sensible defaults. Unparseable values are ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Applies `TUBEGRAB_*` overrides read through `lookup` on top of the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(host) = lookup("TUBEGRAB_HOST") {
            config.server.host = host;
        }

        if let Some(port) = lookup("TUBEGRAB_PORT").and_then(|v| v.parse::<u16>().ok()) {
            config.server.port = port;
        }

        if let Some(path) = lookup("TUBEGRAB_YTDLP_PATH") {
            config.resolver.ytdlp_path = PathBuf::from(path);
        }

        if let Some(seconds) = lookup("TUBEGRAB_RESOLVER_TIMEOUT").and_then(|v| v.parse::<u64>().ok()) {
            config.resolver.timeout = Duration::from_secs(seconds);
        }

        if let Some(path) = lookup("TUBEGRAB_FFMPEG_PATH") {
            config.transcoder.ffmpeg_path = PathBuf::from(path);
        }

        if let Some(bitrate) = lookup("TUBEGRAB_AUDIO_BITRATE") {
            config.transcoder.audio_bitrate = bitrate;
        }

        if let Some(seconds) = lookup("TUBEGRAB_TRANSCODE_TIMEOUT").and_then(|v| v.parse::<u64>().ok()) {
            config.transcoder.timeout = Duration::from_secs(seconds);
        }

        if let Some(dir) = lookup("TUBEGRAB_STAGING_DIR") {
            config.staging.directory = Some(PathBuf::from(dir));
        }

        config
    }

    /// Creates a configuration optimized for testing.
    pub fn for_testing() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0, // Let the OS pick a free port
            },
            resolver: ResolverConfig {
                timeout: Duration::from_secs(5),
                ..Default::default()
            },
            transcoder: TranscoderConfig {
                timeout: Duration::from_secs(5),
                ..Default::default()
            },
            staging: StagingConfig::default(),
        }
    }
}
