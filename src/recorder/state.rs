//! Recording state management
//!
//! Defines the session state machine vocabulary, the recorder configuration,
//! and the finalized artifact.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::capture::traits::{DisplayMediaConstraints, EncoderProfile, PermissionState};
use crate::media::MediaBlob;

/// Current state of a recording session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// No recording in progress
    #[default]
    Idle,
    /// Waiting on stream acquisition (permission UI may be up)
    Acquiring,
    /// Currently recording
    Recording,
    /// Recording finalized into an artifact
    Stopped,
    /// Acquisition or encoder setup failed
    Error,
}

/// Microphone preference, independent of any single recording session.
///
/// Toggling while a recording is live takes effect on the next acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MicrophoneState {
    pub toggled: bool,
    pub status: PermissionState,
}

impl Default for MicrophoneState {
    fn default() -> Self {
        Self {
            toggled: false,
            status: PermissionState::Granted,
        }
    }
}

/// Configuration for a recording session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecorderConfig {
    /// Display-capture constraints
    pub display: DisplayMediaConstraints,

    /// Encoder profile tried first
    pub preferred_profile: EncoderProfile,

    /// Encoder profile used when the preferred one is rejected
    pub fallback_profile: EncoderProfile,

    /// Chunk delivery interval in milliseconds
    pub timeslice_ms: u64,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            display: DisplayMediaConstraints::default(),
            preferred_profile: EncoderProfile::preferred(),
            fallback_profile: EncoderProfile::platform_default(),
            timeslice_ms: 1000,
        }
    }
}

/// A finalized recording
#[derive(Debug, Clone)]
pub struct RecordingArtifact {
    /// The encoded media, tagged with its container media type
    pub blob: MediaBlob,

    /// Transient origin-scoped URL for local preview; revoked on reset or
    /// handoff consumption
    pub url: String,

    /// Recording length in whole seconds
    pub duration_secs: u32,

    /// Wall-clock finalization time
    pub created_at: DateTime<Utc>,
}

impl RecordingArtifact {
    pub fn size_bytes(&self) -> u64 {
        self.blob.size()
    }
}
