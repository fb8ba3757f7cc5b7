//! Stream resolution
//!
//! A resolver turns a submitted URL into metadata and stream descriptors and
//! retrieves the raw bytes of a chosen descriptor. Production uses yt-dlp;
//! development uses a deterministic offline resolver.

pub mod demo;
pub mod ytdlp;

use async_trait::async_trait;
use bytes::Bytes;

pub use demo::DemoResolver;
pub use ytdlp::{YtDlpResolver, classify_ytdlp_error, parse_video_info};

use crate::error::Result;
use crate::media::{ResolvedVideo, StreamDescriptor};

/// Abstraction over the external component that resolves video URLs.
#[async_trait]
pub trait StreamResolver: Send + Sync + std::fmt::Debug {
    /// Looks up title, thumbnail and stream descriptors for a reference.
    ///
    /// # Errors
    /// - `TubegrabError::InvalidReference` - URL is malformed or unsupported
    /// - `TubegrabError::ResolutionUnavailable` - Video is private, removed or restricted
    /// - `TubegrabError::UpstreamUnavailable` - Network failure, timeout or resolver crash
    async fn resolve(&self, reference: &str) -> Result<ResolvedVideo>;

    /// Retrieves the complete bytes of one stream.
    ///
    /// # Errors
    /// - `TubegrabError::StreamNotFound` - Descriptor no longer offered upstream
    /// - `TubegrabError::UpstreamUnavailable` - Network failure, timeout or resolver crash
    async fn fetch(&self, reference: &str, stream: &StreamDescriptor) -> Result<Bytes>;

    /// Check if the resolver can currently be used.
    async fn is_available(&self) -> bool;

    /// Short name for logs and health reports.
    fn name(&self) -> &'static str;
}
