//! Capture stream and track handles
//!
//! `MediaTrack` and `MediaStream` are cheap cloneable handles onto platform
//! capture objects: cloning shares identity, the way a browser track added to
//! a second stream is still the same track. Stopping is idempotent.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Kind of media a track carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Video,
    Audio,
}

#[derive(Debug)]
struct TrackInner {
    id: Uuid,
    kind: TrackKind,
    label: String,
    live: AtomicBool,
}

/// Handle to a single capture track
#[derive(Debug, Clone)]
pub struct MediaTrack {
    inner: Arc<TrackInner>,
}

impl MediaTrack {
    pub fn new(kind: TrackKind, label: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(TrackInner {
                id: Uuid::new_v4(),
                kind,
                label: label.into(),
                live: AtomicBool::new(true),
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn kind(&self) -> TrackKind {
        self.inner.kind
    }

    pub fn label(&self) -> &str {
        &self.inner.label
    }

    /// Whether the underlying capture is still producing media
    pub fn is_live(&self) -> bool {
        self.inner.live.load(Ordering::SeqCst)
    }

    /// Stop the underlying capture. Stopping an already-stopped track is a
    /// no-op.
    pub fn stop(&self) {
        self.inner.live.store(false, Ordering::SeqCst);
    }
}

#[derive(Debug)]
struct StreamInner {
    id: Uuid,
    tracks: RwLock<Vec<MediaTrack>>,
}

/// Handle to a set of tracks captured (or composed) together
#[derive(Debug, Clone)]
pub struct MediaStream {
    inner: Arc<StreamInner>,
}

impl MediaStream {
    pub fn new() -> Self {
        Self::with_tracks(Vec::new())
    }

    pub fn with_tracks(tracks: Vec<MediaTrack>) -> Self {
        Self {
            inner: Arc::new(StreamInner {
                id: Uuid::new_v4(),
                tracks: RwLock::new(tracks),
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    /// Add a track handle; adding the same track twice keeps one entry.
    pub fn add_track(&self, track: MediaTrack) {
        let mut tracks = self.inner.tracks.write();
        if tracks.iter().all(|t| t.id() != track.id()) {
            tracks.push(track);
        }
    }

    pub fn tracks(&self) -> Vec<MediaTrack> {
        self.inner.tracks.read().clone()
    }

    pub fn video_tracks(&self) -> Vec<MediaTrack> {
        self.tracks_of_kind(TrackKind::Video)
    }

    pub fn audio_tracks(&self) -> Vec<MediaTrack> {
        self.tracks_of_kind(TrackKind::Audio)
    }

    fn tracks_of_kind(&self, kind: TrackKind) -> Vec<MediaTrack> {
        self.inner
            .tracks
            .read()
            .iter()
            .filter(|t| t.kind() == kind)
            .cloned()
            .collect()
    }

    /// Stop every track on this stream. Idempotent.
    pub fn stop_tracks(&self) {
        for track in self.inner.tracks.read().iter() {
            track.stop();
        }
    }

    pub fn has_live_tracks(&self) -> bool {
        self.inner.tracks.read().iter().any(|t| t.is_live())
    }
}

impl Default for MediaStream {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn track_stop_is_idempotent() {
        let track = MediaTrack::new(TrackKind::Audio, "mic");
        assert!(track.is_live());
        track.stop();
        track.stop();
        assert!(!track.is_live());
    }

    #[test]
    fn cloned_track_shares_identity() {
        let track = MediaTrack::new(TrackKind::Video, "screen");
        let alias = track.clone();
        alias.stop();
        assert!(!track.is_live());
        assert_eq!(track.id(), alias.id());
    }

    #[test]
    fn stream_filters_tracks_by_kind() {
        let stream = MediaStream::with_tracks(vec![
            MediaTrack::new(TrackKind::Video, "screen"),
            MediaTrack::new(TrackKind::Audio, "tab audio"),
        ]);
        assert_eq!(stream.video_tracks().len(), 1);
        assert_eq!(stream.audio_tracks().len(), 1);
    }

    #[test]
    fn adding_a_track_twice_keeps_one_entry() {
        let stream = MediaStream::new();
        let track = MediaTrack::new(TrackKind::Audio, "mixed");
        stream.add_track(track.clone());
        stream.add_track(track);
        assert_eq!(stream.tracks().len(), 1);
    }

    #[test]
    fn stop_tracks_stops_everything_once() {
        let stream = MediaStream::with_tracks(vec![
            MediaTrack::new(TrackKind::Video, "screen"),
            MediaTrack::new(TrackKind::Audio, "mic"),
        ]);
        stream.stop_tracks();
        stream.stop_tracks();
        assert!(!stream.has_live_tracks());
    }
}
