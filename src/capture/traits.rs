//! Capture trait definitions
//!
//! Platform-agnostic traits for the media primitives the engine orchestrates:
//! display/user-media capture, audio-graph construction, and chunked
//! encoding. Production binds these to a real platform; tests bind them to
//! scripted fakes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::media::{MediaStream, MediaTrack};
use crate::utils::error::{CaptureError, EncoderUnavailable};

/// Platform permission state for a capture device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionState {
    Granted,
    Denied,
}

/// Constraints for a display-capture request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayMediaConstraints {
    /// Preferred capture width in pixels
    pub ideal_width: u32,

    /// Preferred capture height in pixels
    pub ideal_height: u32,

    /// Preferred frame rate in Hz
    pub ideal_frame_rate: u32,

    /// Whether to also request tab/system audio. Zero resulting audio tracks
    /// is a valid outcome, not an error.
    pub capture_audio: bool,
}

impl Default for DisplayMediaConstraints {
    fn default() -> Self {
        Self {
            ideal_width: 1920,
            ideal_height: 1080,
            ideal_frame_rate: 30,
            capture_audio: true,
        }
    }
}

/// Constraints for a user-media (microphone) request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserMediaConstraints {
    pub audio: bool,
}

impl Default for UserMediaConstraints {
    fn default() -> Self {
        Self { audio: true }
    }
}

/// Encoder configuration profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncoderProfile {
    pub mime_type: String,

    /// Target audio bitrate; `None` lets the platform choose.
    pub audio_bits_per_second: Option<u32>,

    /// Target video bitrate; `None` lets the platform choose.
    pub video_bits_per_second: Option<u32>,
}

impl EncoderProfile {
    /// Preferred profile: VP9 + Opus in WebM, 128 kbit/s audio, 2.5 Mbit/s
    /// video.
    pub fn preferred() -> Self {
        Self {
            mime_type: "video/webm;codecs=vp9,opus".to_string(),
            audio_bits_per_second: Some(128_000),
            video_bits_per_second: Some(2_500_000),
        }
    }

    /// Fallback profile: bare WebM with platform-chosen bitrates.
    pub fn platform_default() -> Self {
        Self {
            mime_type: "video/webm".to_string(),
            audio_bits_per_second: None,
            video_bits_per_second: None,
        }
    }

    /// Container media type without codec parameters, used to tag the
    /// finalized blob.
    pub fn container_mime(&self) -> &str {
        self.mime_type
            .split(';')
            .next()
            .unwrap_or(&self.mime_type)
            .trim()
    }
}

/// Event emitted by a running chunked encoder
#[derive(Debug, Clone)]
pub enum EncoderEvent {
    /// An encoded chunk became available. May be empty.
    Data(Vec<u8>),

    /// All chunks have been delivered; the encoding is finished.
    Stopped,
}

/// Chunked media encoder handle.
///
/// `stop` must be idempotent and must cause any remaining `Data` events to be
/// delivered, followed by exactly one `Stopped`.
pub trait MediaEncoder: Send {
    /// Begin encoding, requesting chunk delivery every `timeslice`.
    fn start(&mut self, timeslice: Duration) -> mpsc::UnboundedReceiver<EncoderEvent>;

    /// Request finalization. Calling stop on a stopped encoder is a no-op.
    fn stop(&mut self);

    /// The media type the encoder actually produces.
    fn mime_type(&self) -> &str;
}

/// Audio processing graph with one summing destination.
///
/// Each connected source passes through its own gain stage before summing.
/// `close` must be idempotent.
pub trait AudioGraph: Send {
    fn connect_source(&mut self, track: &MediaTrack, gain: f32);

    /// Tracks carrying the summed output.
    fn output_tracks(&self) -> Vec<MediaTrack>;

    fn close(&mut self);
}

/// The platform capture surface consumed by the engine.
#[async_trait]
pub trait MediaPlatform: Send + Sync {
    /// Request a display (screen/window/tab) capture stream. Suspends on the
    /// platform permission UI.
    async fn request_display_media(
        &self,
        constraints: &DisplayMediaConstraints,
    ) -> Result<MediaStream, CaptureError>;

    /// Request a user-media (microphone) capture stream.
    async fn request_user_media(
        &self,
        constraints: &UserMediaConstraints,
    ) -> Result<MediaStream, CaptureError>;

    /// Query the current microphone permission state.
    async fn query_microphone_permission(&self) -> PermissionState;

    /// Construct an empty audio processing graph.
    fn new_audio_graph(&self) -> Box<dyn AudioGraph>;

    /// Construct an encoder for `stream` with the given profile. Fails when
    /// the platform rejects the configuration.
    fn new_encoder(
        &self,
        stream: &MediaStream,
        profile: &EncoderProfile,
    ) -> Result<Box<dyn MediaEncoder>, EncoderUnavailable>;
}
