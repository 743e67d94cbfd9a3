//! Screen recording session engine.
//!
//! Captures a display (and optionally microphone) stream, mixes the audio
//! sources into a single track, drives a chunked encoder, and hands the
//! finished recording to an upload flow across a page navigation. The
//! platform media primitives are reached through the traits in
//! [`capture::traits`]; everything above them is platform-independent.

pub mod capture;
pub mod handoff;
pub mod media;
pub mod mixer;
pub mod recorder;
pub mod utils;

pub use capture::{
    AudioGraph, CaptureBundle, ComposedStream, DisplayMediaConstraints, EncoderEvent,
    EncoderProfile, MediaEncoder, MediaPlatform, PermissionState, UserMediaConstraints,
};
pub use handoff::{RecordingStash, SessionStore, StashToken, StashedRecording};
pub use media::{MediaBlob, MediaStream, MediaTrack, ObjectUrlRegistry, TrackKind};
pub use mixer::MixedAudioOutput;
pub use recorder::{
    MicrophoneState, RecorderConfig, RecordingArtifact, ScreenRecorder, SessionEvent,
    SessionState,
};
pub use utils::error::{
    CaptureError, EncoderUnavailable, ErrorResponse, HandoffCorrupt, MixerFault, RecorderError,
};
pub use utils::logging::init_logging;
