//! Stream acquisition and composition
//!
//! This module owns everything between the platform capture surface and the
//! encoder: trait definitions for the platform primitives, acquisition of
//! the display/microphone streams, and composition of the combined stream.

pub mod acquire;
pub mod compose;
pub mod traits;

pub use acquire::{acquire, CaptureBundle};
pub use compose::{compose, ComposedStream};
pub use traits::{
    AudioGraph, DisplayMediaConstraints, EncoderEvent, EncoderProfile, MediaEncoder,
    MediaPlatform, PermissionState, UserMediaConstraints,
};
