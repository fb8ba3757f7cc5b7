//! Offline resolver for development mode.
//!
//! Returns deterministic metadata and synthetic media bytes derived from the
//! reference, so the whole UI flow works without network access. Paths
//! containing `private` or `unavailable` resolve to the matching error.

use async_trait::async_trait;
use bytes::Bytes;
use sha1::{Digest, Sha1};

use super::StreamResolver;
use crate::error::{Result, TubegrabError};
use crate::media::{ResolvedVideo, StreamDescriptor, StreamKind, resolution_label};

/// Size of each synthetic stream payload.
const DEMO_PAYLOAD_SIZE: usize = 256 * 1024;

/// Demo resolver for development and UI work.
#[derive(Debug, Clone, Default)]
pub struct DemoResolver;

impl DemoResolver {
    /// Creates a new demo resolver.
    pub fn new() -> Self {
        Self
    }

    fn video_id(reference: &str) -> String {
        let digest = Sha1::digest(reference.as_bytes());
        hex::encode(&digest[..6])
    }

    fn catalogue() -> Vec<StreamDescriptor> {
        let progressive = |id: &str, height: u32| StreamDescriptor {
            id: id.to_string(),
            kind: StreamKind::Progressive,
            container: "mp4".to_string(),
            resolution: Some(resolution_label(height)),
            height: Some(height),
            audio_bitrate: Some(96),
        };
        vec![
            progressive("18", 360),
            progressive("22", 720),
            StreamDescriptor {
                id: "137".to_string(),
                kind: StreamKind::VideoOnly,
                container: "mp4".to_string(),
                resolution: Some(resolution_label(1080)),
                height: Some(1080),
                audio_bitrate: None,
            },
            StreamDescriptor {
                id: "140".to_string(),
                kind: StreamKind::AudioOnly,
                container: "m4a".to_string(),
                resolution: None,
                height: None,
                audio_bitrate: Some(128),
            },
            StreamDescriptor {
                id: "251".to_string(),
                kind: StreamKind::AudioOnly,
                container: "webm".to_string(),
                resolution: None,
                height: None,
                audio_bitrate: Some(160),
            },
        ]
    }
}

#[async_trait]
impl StreamResolver for DemoResolver {
    async fn resolve(&self, reference: &str) -> Result<ResolvedVideo> {
        let url = url::Url::parse(reference).map_err(|e| TubegrabError::InvalidReference {
            reference: reference.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(TubegrabError::InvalidReference {
                reference: reference.to_string(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }

        let path = url.path().to_lowercase();
        if path.contains("private") || path.contains("unavailable") {
            return Err(TubegrabError::ResolutionUnavailable {
                reference: reference.to_string(),
                reason: "demo video is unavailable".to_string(),
            });
        }

        let id = Self::video_id(reference);
        Ok(ResolvedVideo {
            reference: reference.to_string(),
            title: format!("Demo video {id}"),
            thumbnail_url: Some(format!("https://picsum.photos/seed/{id}/320/180")),
            streams: Self::catalogue(),
        })
    }

    async fn fetch(&self, reference: &str, stream: &StreamDescriptor) -> Result<Bytes> {
        if !Self::catalogue().iter().any(|s| s.id == stream.id) {
            return Err(TubegrabError::StreamNotFound {
                reference: reference.to_string(),
                wanted: stream.id.clone(),
            });
        }

        let mut hasher = Sha1::new();
        hasher.update(reference.as_bytes());
        hasher.update(stream.id.as_bytes());
        let seed = hasher.finalize();

        let mut payload = Vec::with_capacity(DEMO_PAYLOAD_SIZE);
        payload.extend_from_slice(b"TUBEGRAB-DEMO:");
        payload.extend_from_slice(stream.id.as_bytes());
        while payload.len() < DEMO_PAYLOAD_SIZE {
            payload.extend_from_slice(&seed);
        }
        payload.truncate(DEMO_PAYLOAD_SIZE);

        Ok(Bytes::from(payload))
    }

    async fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "demo"
    }
}
