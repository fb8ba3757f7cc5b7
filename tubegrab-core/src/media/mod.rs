//! Media model and stream selection.
//!
//! Types describing a resolved video and its stream variants, plus the pure
//! selection rules that decide which variant a download request gets.

pub mod selection;
pub mod types;

pub use selection::{
    available_resolutions, highest_progressive_mp4, select_audio_stream, select_video_stream,
};
pub use types::{
    DownloadFormat, QualityChoice, ResolvedVideo, StreamDescriptor, StreamKind, height_from_label,
    resolution_label,
};
