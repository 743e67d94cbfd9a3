//! Media primitives
//!
//! Track/stream capture handles and blob/object-URL plumbing shared by the
//! capture, recording, and handoff layers.

pub mod blob;
pub mod stream;

pub use blob::{MediaBlob, ObjectUrlRegistry};
pub use stream::{MediaStream, MediaTrack, TrackKind};
