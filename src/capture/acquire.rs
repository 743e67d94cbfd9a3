//! Stream acquisition
//!
//! Obtains the display capture stream and, when enabled and permitted, the
//! microphone stream for one recording attempt.

use crate::capture::traits::{
    DisplayMediaConstraints, MediaPlatform, PermissionState, UserMediaConstraints,
};
use crate::media::MediaStream;
use crate::utils::error::CaptureError;

/// The capture streams backing one recording attempt.
#[derive(Debug, Clone)]
pub struct CaptureBundle {
    pub display: MediaStream,

    /// Present only if the microphone toggle was on and permission was
    /// granted at acquisition time.
    pub microphone: Option<MediaStream>,

    pub has_display_audio: bool,
}

impl CaptureBundle {
    /// The original source streams, for teardown bookkeeping.
    pub fn original_streams(&self) -> Vec<MediaStream> {
        let mut streams = vec![self.display.clone()];
        if let Some(mic) = &self.microphone {
            streams.push(mic.clone());
        }
        streams
    }

    /// Whether any audio source is available for mixing.
    pub fn has_audio_source(&self) -> bool {
        self.has_display_audio
            || self
                .microphone
                .as_ref()
                .is_some_and(|mic| !mic.audio_tracks().is_empty())
    }

    /// Stop every underlying capture. Idempotent.
    pub fn stop_all(&self) {
        for stream in self.original_streams() {
            stream.stop_tracks();
        }
    }
}

/// Acquire capture streams for a recording attempt.
///
/// Display capture is mandatory: refusal fails the acquisition. Display audio
/// is always requested but may legitimately be absent. The microphone is
/// requested only when `want_microphone` is set and permission was granted;
/// a failing microphone request degrades to display-audio-only instead of
/// failing the whole capture.
pub async fn acquire(
    platform: &dyn MediaPlatform,
    constraints: &DisplayMediaConstraints,
    want_microphone: bool,
    mic_permission: PermissionState,
) -> Result<CaptureBundle, CaptureError> {
    let display = platform.request_display_media(constraints).await?;
    let has_display_audio = !display.audio_tracks().is_empty();

    let microphone = if want_microphone && mic_permission == PermissionState::Granted {
        match platform
            .request_user_media(&UserMediaConstraints { audio: true })
            .await
        {
            Ok(stream) => Some(stream),
            Err(err) => {
                tracing::warn!("Microphone unavailable, recording display audio only: {err}");
                None
            }
        }
    } else {
        None
    };

    tracing::debug!(
        has_display_audio,
        has_microphone = microphone.is_some(),
        "Acquired capture streams"
    );

    Ok(CaptureBundle {
        display,
        microphone,
        has_display_audio,
    })
}
