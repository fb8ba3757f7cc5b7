//! Tubegrab Core - Stream resolution and audio transcoding
//!
//! This crate provides the building blocks behind the Tubegrab web front-end:
//! media types and stream selection, the resolver and transcoder seams with
//! their production and simulated implementations, per-request staging of
//! transcoder input, and the `DownloadService` that ties them together.

pub mod config;
pub mod download;
pub mod error;
pub mod media;
pub mod mode;
pub mod resolver;
pub mod staging;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_fakes;
pub mod tracing_setup;
pub mod transcoding;

// Re-export main types for convenient access
pub use config::TubegrabConfig;
pub use download::{DependencyReport, DownloadArtifact, DownloadService, VideoSummary};
pub use error::{Result, TubegrabError};
pub use media::{DownloadFormat, QualityChoice, ResolvedVideo, StreamDescriptor, StreamKind};
pub use mode::RuntimeMode;
pub use resolver::{DemoResolver, StreamResolver, YtDlpResolver};
pub use staging::{StagedFile, StagingArea};
pub use transcoding::{
    AudioTranscoder, FfmpegTranscoder, SimulationTranscoder, TranscodeOptions, TranscodeResult,
};
