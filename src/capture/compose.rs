//! Stream composition
//!
//! Assembles the final combined stream handed to the encoder and records the
//! original source streams, which must be stopped independently during
//! teardown: stopping the composed stream's tracks does not release the
//! underlying capture handles.

use crate::capture::acquire::CaptureBundle;
use crate::media::MediaStream;
use crate::mixer::MixedAudioOutput;
use crate::utils::error::CaptureError;

/// The combined stream owned exclusively by the active recording session.
#[derive(Debug, Clone)]
pub struct ComposedStream {
    stream: MediaStream,
    originals: Vec<MediaStream>,
}

impl ComposedStream {
    pub fn stream(&self) -> &MediaStream {
        &self.stream
    }

    pub fn originals(&self) -> &[MediaStream] {
        &self.originals
    }

    /// Stop the composed tracks and every original capture stream.
    /// Idempotent.
    pub fn teardown(&self) {
        self.stream.stop_tracks();
        for original in &self.originals {
            original.stop_tracks();
        }
    }
}

/// Combine the display video track with the mixed audio tracks, or with the
/// raw audio tracks when mixing was skipped or faulted.
pub fn compose(
    bundle: &CaptureBundle,
    mixed: Option<&MixedAudioOutput>,
) -> Result<ComposedStream, CaptureError> {
    let video = bundle
        .display
        .video_tracks()
        .into_iter()
        .next()
        .ok_or(CaptureError::MissingVideoTrack)?;

    let combined = MediaStream::new();
    combined.add_track(video);

    match mixed {
        Some(output) => {
            for track in output.tracks() {
                combined.add_track(track.clone());
            }
        }
        None => {
            for track in bundle.display.audio_tracks() {
                combined.add_track(track);
            }
            if let Some(mic) = &bundle.microphone {
                for track in mic.audio_tracks() {
                    combined.add_track(track);
                }
            }
        }
    }

    Ok(ComposedStream {
        stream: combined,
        originals: bundle.original_streams(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{MediaTrack, TrackKind};

    fn bundle(display_audio: bool, mic: bool) -> CaptureBundle {
        let mut display_tracks = vec![MediaTrack::new(TrackKind::Video, "screen")];
        if display_audio {
            display_tracks.push(MediaTrack::new(TrackKind::Audio, "tab audio"));
        }
        CaptureBundle {
            display: MediaStream::with_tracks(display_tracks),
            microphone: mic.then(|| {
                MediaStream::with_tracks(vec![MediaTrack::new(TrackKind::Audio, "mic")])
            }),
            has_display_audio: display_audio,
        }
    }

    #[test]
    fn missing_video_track_is_a_capture_error() {
        let bundle = CaptureBundle {
            display: MediaStream::new(),
            microphone: None,
            has_display_audio: false,
        };
        assert_eq!(
            compose(&bundle, None).unwrap_err(),
            CaptureError::MissingVideoTrack
        );
    }

    #[test]
    fn video_only_when_no_audio_anywhere() {
        let composed = compose(&bundle(false, false), None).unwrap();
        assert_eq!(composed.stream().video_tracks().len(), 1);
        assert!(composed.stream().audio_tracks().is_empty());
        assert_eq!(composed.originals().len(), 1);
    }

    #[test]
    fn unmixed_fallback_carries_raw_audio_tracks() {
        let composed = compose(&bundle(true, true), None).unwrap();
        assert_eq!(composed.stream().audio_tracks().len(), 2);
        assert_eq!(composed.originals().len(), 2);
    }

    #[test]
    fn teardown_stops_composed_and_original_tracks() {
        let b = bundle(true, true);
        let composed = compose(&b, None).unwrap();
        composed.teardown();
        composed.teardown();
        assert!(!composed.stream().has_live_tracks());
        assert!(!b.display.has_live_tracks());
        assert!(!b.microphone.as_ref().unwrap().has_live_tracks());
    }
}
