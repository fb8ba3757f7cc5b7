//! Stream selection rules.
//!
//! Only progressive MP4 streams are offered as video downloads, so every
//! selectable video has an audio track and plays in a browser.

use std::collections::HashMap;

use super::types::{QualityChoice, StreamDescriptor, StreamKind};

/// Distinct resolution labels of progressive MP4 streams, highest first.
pub fn available_resolutions(streams: &[StreamDescriptor]) -> Vec<String> {
    let mut heights: HashMap<&str, u32> = HashMap::new();
    for stream in streams
        .iter()
        .filter(|s| s.kind == StreamKind::Progressive && s.is_mp4())
    {
        if let Some(label) = stream.resolution.as_deref() {
            let height = stream.effective_height();
            heights
                .entry(label)
                .and_modify(|h| *h = (*h).max(height))
                .or_insert(height);
        }
    }

    let mut labels: Vec<(&str, u32)> = heights.into_iter().collect();
    labels.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| b.0.cmp(a.0)));
    labels.into_iter().map(|(label, _)| label.to_string()).collect()
}

/// The highest-resolution progressive MP4 stream.
///
/// Other containers are never returned: the result is served as `video/mp4`.
pub fn highest_progressive_mp4(streams: &[StreamDescriptor]) -> Option<&StreamDescriptor> {
    streams
        .iter()
        .filter(|s| s.kind == StreamKind::Progressive && s.is_mp4())
        .max_by_key(|s| s.effective_height())
}

/// Picks the video stream for a quality request.
///
/// An exact label match among progressive MP4 streams wins; otherwise, and
/// for [`QualityChoice::Highest`], the highest-resolution progressive MP4
/// stream. `None` when the video has no progressive MP4 stream at all.
pub fn select_video_stream<'a>(
    streams: &'a [StreamDescriptor],
    quality: &QualityChoice,
) -> Option<&'a StreamDescriptor> {
    if let QualityChoice::Label(label) = quality {
        let exact = streams.iter().find(|s| {
            s.kind == StreamKind::Progressive
                && s.is_mp4()
                && s.resolution.as_deref() == Some(label.as_str())
        });
        if exact.is_some() {
            return exact;
        }
        tracing::debug!("No progressive stream labelled {label}, falling back to highest");
    }
    highest_progressive_mp4(streams)
}

/// Picks the audio-only stream to transcode: MP4/M4A containers first, then
/// the highest audio bitrate.
pub fn select_audio_stream(streams: &[StreamDescriptor]) -> Option<&StreamDescriptor> {
    streams
        .iter()
        .filter(|s| s.kind == StreamKind::AudioOnly)
        .max_by_key(|s| {
            let mp4_family = s.is_mp4() || s.container.eq_ignore_ascii_case("m4a");
            (mp4_family, s.audio_bitrate.unwrap_or(0))
        })
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::media::types::resolution_label;

    fn progressive(id: &str, height: u32, container: &str) -> StreamDescriptor {
        StreamDescriptor {
            id: id.to_string(),
            kind: StreamKind::Progressive,
            container: container.to_string(),
            resolution: Some(resolution_label(height)),
            height: Some(height),
            audio_bitrate: Some(128),
        }
    }

    fn audio(id: &str, container: &str, bitrate: u32) -> StreamDescriptor {
        StreamDescriptor {
            id: id.to_string(),
            kind: StreamKind::AudioOnly,
            container: container.to_string(),
            resolution: None,
            height: None,
            audio_bitrate: Some(bitrate),
        }
    }

    fn video_only(id: &str, height: u32) -> StreamDescriptor {
        StreamDescriptor {
            id: id.to_string(),
            kind: StreamKind::VideoOnly,
            container: "mp4".to_string(),
            resolution: Some(resolution_label(height)),
            height: Some(height),
            audio_bitrate: None,
        }
    }

    fn sample_streams() -> Vec<StreamDescriptor> {
        vec![
            progressive("18", 360, "mp4"),
            progressive("22", 720, "mp4"),
            progressive("43", 1080, "webm"),
            progressive("18b", 360, "mp4"),
            video_only("137", 1080),
            audio("140", "m4a", 128),
            audio("251", "webm", 160),
        ]
    }

    #[test]
    fn test_resolutions_distinct_and_descending() {
        let labels = available_resolutions(&sample_streams());
        assert_eq!(labels, vec!["720p".to_string(), "360p".to_string()]);
    }

    #[test]
    fn test_resolutions_ignore_adaptive_and_non_mp4() {
        let streams = vec![video_only("137", 1080), progressive("43", 480, "webm")];
        assert!(available_resolutions(&streams).is_empty());
    }

    #[test]
    fn test_highest_prefers_mp4() {
        let streams = sample_streams();
        assert_eq!(highest_progressive_mp4(&streams).unwrap().id, "22");
    }

    #[test]
    fn test_webm_only_video_has_no_mp4_selection() {
        let streams = vec![progressive("43", 360, "webm"), audio("140", "m4a", 128)];
        assert!(highest_progressive_mp4(&streams).is_none());
        assert!(select_video_stream(&streams, &QualityChoice::Highest).is_none());
        assert!(
            select_video_stream(&streams, &QualityChoice::Label("360p".to_string())).is_none()
        );
    }

    #[test]
    fn test_exact_label_match() {
        let streams = sample_streams();
        let chosen = select_video_stream(&streams, &QualityChoice::Label("360p".to_string()));
        assert_eq!(chosen.unwrap().id, "18");
    }

    #[test]
    fn test_unknown_label_falls_back_to_highest() {
        let streams = sample_streams();
        let chosen = select_video_stream(&streams, &QualityChoice::Label("4320p".to_string()));
        assert_eq!(chosen.unwrap().id, "22");
    }

    #[test]
    fn test_video_only_label_is_not_selected() {
        let streams = sample_streams();
        let chosen = select_video_stream(&streams, &QualityChoice::Label("1080p".to_string()));
        assert_eq!(chosen.unwrap().id, "22");
    }

    #[test]
    fn test_no_progressive_stream() {
        let streams = vec![audio("140", "m4a", 128)];
        assert!(select_video_stream(&streams, &QualityChoice::Highest).is_none());
    }

    #[test]
    fn test_audio_prefers_m4a_over_bitrate() {
        let streams = sample_streams();
        assert_eq!(select_audio_stream(&streams).unwrap().id, "140");
    }

    #[test]
    fn test_audio_highest_bitrate_within_family() {
        let streams = vec![audio("139", "m4a", 48), audio("140", "m4a", 128)];
        assert_eq!(select_audio_stream(&streams).unwrap().id, "140");
        assert!(select_audio_stream(&[progressive("18", 360, "mp4")]).is_none());
    }

    fn arb_streams() -> impl Strategy<Value = Vec<StreamDescriptor>> {
        let heights = prop::sample::select(vec![144u32, 240, 360, 480, 720, 1080, 1440, 2160]);
        let containers = prop::sample::select(vec!["mp4", "webm"]);
        prop::collection::vec((heights, containers), 1..20).prop_map(|items| {
            items
                .into_iter()
                .enumerate()
                .map(|(i, (height, container))| {
                    progressive(&format!("f{i}"), height, container)
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_resolutions_sorted_and_distinct(streams in arb_streams()) {
            let labels = available_resolutions(&streams);
            let heights: Vec<u32> = labels
                .iter()
                .map(|l| crate::media::height_from_label(l).unwrap())
                .collect();
            for pair in heights.windows(2) {
                prop_assert!(pair[0] > pair[1]);
            }
        }

        #[test]
        fn prop_highest_has_maximum_mp4_height(streams in arb_streams()) {
            let chosen = select_video_stream(&streams, &QualityChoice::Highest);
            let max_mp4 = streams.iter().filter(|s| s.is_mp4()).map(|s| s.effective_height()).max();
            match (chosen, max_mp4) {
                (Some(chosen), Some(max)) => {
                    prop_assert!(chosen.is_mp4());
                    prop_assert_eq!(chosen.effective_height(), max);
                }
                (None, None) => {}
                (chosen, max) => {
                    prop_assert!(false, "selection {:?} disagrees with max mp4 height {:?}", chosen, max);
                }
            }
        }

        #[test]
        fn prop_unmatched_label_equals_highest(streams in arb_streams()) {
            let fallback = select_video_stream(&streams, &QualityChoice::Label("99p".to_string()));
            prop_assert_eq!(fallback, highest_progressive_mp4(&streams));
        }
    }
}
