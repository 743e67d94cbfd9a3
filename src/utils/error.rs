//! Error types and handling
//!
//! Common error types used across the recording engine.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Capture acquisition failed or was refused.
///
/// Recoverable: the UI surfaces these as "try again". Capture permission is
/// never re-prompted automatically.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("display capture denied: {0}")]
    DisplayDenied(String),

    #[error("microphone capture unavailable: {0}")]
    MicrophoneUnavailable(String),

    #[error("display stream has no video track")]
    MissingVideoTrack,

    #[error("platform capture error: {0}")]
    Platform(String),
}

/// No recording configuration was accepted by the platform encoder.
///
/// Fatal for the session that tried to start; reported to the caller and
/// never retried automatically.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("no supported recording configuration: {0}")]
pub struct EncoderUnavailable(pub String);

/// Internal audio-graph failure.
///
/// Never surfaced: the session falls back to recording the unmixed raw
/// audio tracks.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MixerFault {
    #[error("summing destination produced no output tracks")]
    EmptyDestination,
}

/// A stashed recording entry could not be read back.
///
/// Absorbed by the handoff bridge: retrieval reports "nothing stashed"
/// instead of an error.
#[derive(Error, Debug)]
pub enum HandoffCorrupt {
    #[error("stash entry unreadable: {0}")]
    Unreadable(#[from] serde_json::Error),

    #[error("stashed object URL no longer resolves: {0}")]
    DanglingUrl(String),
}

/// Session-level error carried by the `Error` state.
#[derive(Error, Debug, Clone)]
pub enum RecorderError {
    #[error("capture error: {0}")]
    Capture(#[from] CaptureError),

    #[error("encoder error: {0}")]
    Encoder(#[from] EncoderUnavailable),

    #[error("recording error: {0}")]
    Recording(String),
}

/// Error response for the UI layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl From<&RecorderError> for ErrorResponse {
    fn from(error: &RecorderError) -> Self {
        let code = match error {
            RecorderError::Capture(_) => "CAPTURE_DENIED",
            RecorderError::Encoder(_) => "ENCODER_UNAVAILABLE",
            RecorderError::Recording(_) => "RECORDING_ERROR",
        };

        ErrorResponse {
            code: code.to_string(),
            message: error.to_string(),
        }
    }
}
