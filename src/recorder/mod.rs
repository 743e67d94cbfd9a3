//! Recording system module
//!
//! This module implements the recording lifecycle:
//! - RecordingController for the encoder and chunk buffering
//! - ScreenRecorder, the session state machine bound by the UI

pub mod controller;
pub mod session;
pub mod state;

pub use controller::RecordingController;
pub use session::{ScreenRecorder, SessionEvent};
pub use state::{MicrophoneState, RecorderConfig, RecordingArtifact, SessionState};
