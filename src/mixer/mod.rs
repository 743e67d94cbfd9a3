//! Audio mixing graph construction
//!
//! Combines the display and microphone audio sources into one summed output
//! track set, each source through its own gain stage. Mixing is skipped
//! entirely when no audio source exists; a graph that misbehaves is reported
//! as a fault so the caller can fall back to the unmixed raw tracks.

use crate::capture::acquire::CaptureBundle;
use crate::capture::traits::AudioGraph;
use crate::media::MediaTrack;
use crate::utils::error::MixerFault;

/// Reference level for tab/system audio.
pub const DISPLAY_AUDIO_GAIN: f32 = 1.0;

/// Microphone capture usually comes in quieter than system audio, so its
/// gain stage sits slightly above the reference level.
pub const MICROPHONE_GAIN: f32 = 1.2;

/// The mixed audio output and the graph that produces it.
///
/// Exists only while at least one audio source is present; the graph must be
/// closed when the recording session releases its resources.
pub struct MixedAudioOutput {
    tracks: Vec<MediaTrack>,
    graph: Box<dyn AudioGraph>,
}

impl std::fmt::Debug for MixedAudioOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MixedAudioOutput")
            .field("tracks", &self.tracks)
            .finish_non_exhaustive()
    }
}

impl MixedAudioOutput {
    pub fn tracks(&self) -> &[MediaTrack] {
        &self.tracks
    }

    /// Close the underlying graph. Idempotent.
    pub fn close(&mut self) {
        self.graph.close();
    }
}

/// Build the mixing graph over whichever audio sources the bundle carries.
///
/// Returns `Ok(None)` when neither display audio nor microphone audio exists:
/// mixing is skipped, not mixed-with-silence. Returns `Err(MixerFault)` when
/// the summing destination yields no tracks despite connected inputs; the
/// caller then records the raw tracks unmixed.
pub fn build_mixer<F>(new_graph: F, bundle: &CaptureBundle) -> Result<Option<MixedAudioOutput>, MixerFault>
where
    F: FnOnce() -> Box<dyn AudioGraph>,
{
    if !bundle.has_audio_source() {
        return Ok(None);
    }

    let mic_tracks: Vec<MediaTrack> = bundle
        .microphone
        .as_ref()
        .map(|mic| mic.audio_tracks())
        .unwrap_or_default();

    let mut graph = new_graph();

    if bundle.has_display_audio {
        for track in bundle.display.audio_tracks() {
            graph.connect_source(&track, DISPLAY_AUDIO_GAIN);
        }
    }
    for track in &mic_tracks {
        graph.connect_source(track, MICROPHONE_GAIN);
    }

    let tracks = graph.output_tracks();
    if tracks.is_empty() {
        graph.close();
        return Err(MixerFault::EmptyDestination);
    }

    Ok(Some(MixedAudioOutput { tracks, graph }))
}
