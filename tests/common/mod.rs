//! Scripted platform fake shared by the integration suites.
//!
//! Every knob is a plain field; every stream, graph, and encoder the engine
//! asks for is recorded so the tests can assert on teardown behavior.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use screencast_recorder::{
    AudioGraph, CaptureError, DisplayMediaConstraints, EncoderEvent, EncoderProfile,
    EncoderUnavailable, MediaEncoder, MediaPlatform, MediaStream, MediaTrack, PermissionState,
    TrackKind, UserMediaConstraints,
};

#[derive(Default)]
pub struct GraphState {
    pub connections: Mutex<Vec<(String, f32)>>,
    pub closed: AtomicBool,
}

struct FakeGraph {
    state: Arc<GraphState>,
    output: MediaTrack,
    yields_no_tracks: bool,
}

impl AudioGraph for FakeGraph {
    fn connect_source(&mut self, track: &MediaTrack, gain: f32) {
        self.state
            .connections
            .lock()
            .push((track.label().to_string(), gain));
    }

    fn output_tracks(&self) -> Vec<MediaTrack> {
        if self.yields_no_tracks {
            Vec::new()
        } else {
            vec![self.output.clone()]
        }
    }

    fn close(&mut self) {
        self.state.closed.store(true, Ordering::SeqCst);
    }
}

/// Self-driving chunked encoder: emits one fixed-size chunk per timeslice
/// until stopped, then delivers the stop event.
struct FakeEncoder {
    mime_type: String,
    chunk_len: usize,
    timeslice: Duration,
    started: Option<Instant>,
    delivered: Arc<AtomicUsize>,
    tx: Option<mpsc::UnboundedSender<EncoderEvent>>,
    ticker: Option<JoinHandle<()>>,
}

impl MediaEncoder for FakeEncoder {
    fn start(&mut self, timeslice: Duration) -> mpsc::UnboundedReceiver<EncoderEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        let chunk_tx = tx.clone();
        let chunk_len = self.chunk_len;
        let delivered = Arc::clone(&self.delivered);
        // Capture the baseline instant synchronously at `start()` time rather
        // than lazily inside the spawned task: under paused time a single
        // `advance()` jumps the clock before the task is first polled.
        let started = Instant::now();
        self.timeslice = timeslice;
        self.started = Some(started);
        self.tx = Some(tx);
        self.ticker = Some(tokio::spawn(async move {
            let mut next = started + timeslice;
            loop {
                tokio::time::sleep_until(next).await;
                next += timeslice;
                if chunk_tx
                    .send(EncoderEvent::Data(vec![0xC5; chunk_len]))
                    .is_err()
                {
                    break;
                }
                delivered.fetch_add(1, Ordering::SeqCst);
            }
        }));
        rx
    }

    fn stop(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
        // Honor the MediaEncoder contract: stop delivers the Data for every
        // elapsed timeslice not yet emitted, then exactly one Stopped. Under
        // paused time a single `advance()` jump leaves the live ticker no
        // scheduler turn to emit, so this flush is what delivers the chunks;
        // in real time it only tops up the slices the ticker hasn't reached.
        if let Some(tx) = self.tx.take() {
            let elapsed = self.started.map(|s| s.elapsed()).unwrap_or_default();
            let expected = (elapsed.as_millis() / self.timeslice.as_millis().max(1)) as usize;
            let already = self.delivered.load(Ordering::SeqCst);
            for _ in already..expected {
                let _ = tx.send(EncoderEvent::Data(vec![0xC5; self.chunk_len]));
            }
            let _ = tx.send(EncoderEvent::Stopped);
        }
    }

    fn mime_type(&self) -> &str {
        &self.mime_type
    }
}

pub struct FakePlatform {
    pub display_denied: bool,
    pub display_audio: bool,
    pub display_delay_ms: Option<u64>,
    pub mic_fails: bool,
    pub mic_permission: PermissionState,
    pub reject_preferred_profile: bool,
    pub reject_all_profiles: bool,
    pub graph_yields_no_tracks: bool,
    pub chunk_len: usize,
    pub streams: Mutex<Vec<MediaStream>>,
    pub graphs: Mutex<Vec<Arc<GraphState>>>,
    pub encoder_profiles: Mutex<Vec<String>>,
    pub encoded_streams: Mutex<Vec<MediaStream>>,
}

impl Default for FakePlatform {
    fn default() -> Self {
        Self {
            display_denied: false,
            display_audio: true,
            display_delay_ms: None,
            mic_fails: false,
            mic_permission: PermissionState::Granted,
            reject_preferred_profile: false,
            reject_all_profiles: false,
            graph_yields_no_tracks: false,
            chunk_len: 4096,
            streams: Mutex::new(Vec::new()),
            graphs: Mutex::new(Vec::new()),
            encoder_profiles: Mutex::new(Vec::new()),
            encoded_streams: Mutex::new(Vec::new()),
        }
    }
}

impl FakePlatform {
    pub fn acquired_streams(&self) -> Vec<MediaStream> {
        self.streams.lock().clone()
    }

    /// True when every track of every acquired stream has been stopped.
    pub fn all_tracks_stopped(&self) -> bool {
        self.streams.lock().iter().all(|s| !s.has_live_tracks())
    }

    pub fn graph_count(&self) -> usize {
        self.graphs.lock().len()
    }

    pub fn graphs_closed(&self) -> bool {
        self.graphs
            .lock()
            .iter()
            .all(|g| g.closed.load(Ordering::SeqCst))
    }

    /// (source label, gain) pairs across every graph built so far.
    pub fn graph_connections(&self) -> Vec<(String, f32)> {
        self.graphs
            .lock()
            .iter()
            .flat_map(|g| g.connections.lock().clone())
            .collect()
    }

    pub fn requested_profiles(&self) -> Vec<String> {
        self.encoder_profiles.lock().clone()
    }

    pub fn last_encoded_stream(&self) -> Option<MediaStream> {
        self.encoded_streams.lock().last().cloned()
    }
}

#[async_trait]
impl MediaPlatform for FakePlatform {
    async fn request_display_media(
        &self,
        constraints: &DisplayMediaConstraints,
    ) -> Result<MediaStream, CaptureError> {
        if let Some(delay) = self.display_delay_ms {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.display_denied {
            return Err(CaptureError::DisplayDenied("user dismissed the picker".into()));
        }

        let mut tracks = vec![MediaTrack::new(TrackKind::Video, "screen")];
        if constraints.capture_audio && self.display_audio {
            tracks.push(MediaTrack::new(TrackKind::Audio, "tab audio"));
        }
        let stream = MediaStream::with_tracks(tracks);
        self.streams.lock().push(stream.clone());
        Ok(stream)
    }

    async fn request_user_media(
        &self,
        _constraints: &UserMediaConstraints,
    ) -> Result<MediaStream, CaptureError> {
        if self.mic_fails {
            return Err(CaptureError::MicrophoneUnavailable("device busy".into()));
        }
        let stream = MediaStream::with_tracks(vec![MediaTrack::new(TrackKind::Audio, "mic")]);
        self.streams.lock().push(stream.clone());
        Ok(stream)
    }

    async fn query_microphone_permission(&self) -> PermissionState {
        self.mic_permission
    }

    fn new_audio_graph(&self) -> Box<dyn AudioGraph> {
        let state = Arc::new(GraphState::default());
        self.graphs.lock().push(Arc::clone(&state));
        Box::new(FakeGraph {
            state,
            output: MediaTrack::new(TrackKind::Audio, "mixed"),
            yields_no_tracks: self.graph_yields_no_tracks,
        })
    }

    fn new_encoder(
        &self,
        stream: &MediaStream,
        profile: &EncoderProfile,
    ) -> Result<Box<dyn MediaEncoder>, EncoderUnavailable> {
        self.encoder_profiles.lock().push(profile.mime_type.clone());

        if self.reject_all_profiles
            || (self.reject_preferred_profile && profile.mime_type.contains("codecs="))
        {
            return Err(EncoderUnavailable(format!(
                "{} is not supported",
                profile.mime_type
            )));
        }

        self.encoded_streams.lock().push(stream.clone());
        Ok(Box::new(FakeEncoder {
            mime_type: profile.mime_type.clone(),
            chunk_len: self.chunk_len,
            timeslice: Duration::ZERO,
            started: None,
            delivered: Arc::new(AtomicUsize::new(0)),
            tx: None,
            ticker: None,
        }))
    }
}
