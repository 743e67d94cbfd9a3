//! Recording controller
//!
//! Owns the encoder lifecycle: profile selection with fallback, chunk
//! buffering at a fixed timeslice, and finalization of the buffered chunks
//! into a playable artifact.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::capture::compose::ComposedStream;
use crate::capture::traits::{EncoderEvent, MediaEncoder, MediaPlatform};
use crate::media::{MediaBlob, ObjectUrlRegistry};
use crate::recorder::state::{RecorderConfig, RecordingArtifact};
use crate::utils::error::EncoderUnavailable;

/// Round an elapsed duration to whole seconds.
pub(crate) fn whole_seconds(elapsed: Duration) -> u32 {
    (elapsed.as_millis() as f64 / 1000.0).round() as u32
}

struct Finalized {
    data: Vec<u8>,
    media_type: String,
    duration_secs: u32,
}

struct ActiveEncoding {
    encoder: Box<dyn MediaEncoder>,
    pump: JoinHandle<()>,
    finalized_rx: oneshot::Receiver<Finalized>,
    started_at: Instant,
}

/// Handle returned by [`RecordingController::request_stop`]; awaiting it
/// yields the finalized artifact once all chunks have been delivered.
pub struct PendingFinalize {
    finalized_rx: oneshot::Receiver<Finalized>,
    urls: Arc<ObjectUrlRegistry>,
}

impl PendingFinalize {
    /// Wait for the final chunk delivery and build the artifact. Returns
    /// `None` if the encoder died without finishing.
    pub async fn wait(self) -> Option<RecordingArtifact> {
        let finalized = self.finalized_rx.await.ok()?;
        let blob = MediaBlob::new(finalized.data, finalized.media_type);
        let url = self.urls.create_url(&blob);
        Some(RecordingArtifact {
            blob,
            url,
            duration_secs: finalized.duration_secs,
            created_at: Utc::now(),
        })
    }
}

/// Encoder lifecycle owner: `Idle -> Recording -> Stopped`.
pub struct RecordingController {
    urls: Arc<ObjectUrlRegistry>,
    active: Option<ActiveEncoding>,
}

impl RecordingController {
    pub fn new(urls: Arc<ObjectUrlRegistry>) -> Self {
        Self { urls, active: None }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Time since `start`, while an encoding is live.
    pub fn elapsed(&self) -> Option<Duration> {
        self.active.as_ref().map(|a| a.started_at.elapsed())
    }

    /// Start encoding the composed stream.
    ///
    /// Tries the preferred profile first and falls back to the platform
    /// default; only when both are rejected does the start fail.
    pub fn start(
        &mut self,
        platform: &dyn MediaPlatform,
        composed: &ComposedStream,
        config: &RecorderConfig,
    ) -> Result<(), EncoderUnavailable> {
        debug_assert!(self.active.is_none(), "encoder already running");

        let (mut encoder, profile) =
            match platform.new_encoder(composed.stream(), &config.preferred_profile) {
                Ok(encoder) => (encoder, &config.preferred_profile),
                Err(err) => {
                    tracing::debug!("Preferred encoder profile rejected ({err}), falling back");
                    let encoder =
                        platform.new_encoder(composed.stream(), &config.fallback_profile)?;
                    (encoder, &config.fallback_profile)
                }
            };

        let events = encoder.start(Duration::from_millis(config.timeslice_ms));
        let started_at = Instant::now();
        let media_type = profile.container_mime().to_string();
        let (finalized_tx, finalized_rx) = oneshot::channel();

        let pump = tokio::spawn(pump_chunks(events, started_at, media_type, finalized_tx));

        self.active = Some(ActiveEncoding {
            encoder,
            pump,
            finalized_rx,
            started_at,
        });

        tracing::info!(profile = %profile.mime_type, "Encoder started");
        Ok(())
    }

    /// Request finalization. Returns `None` when no encoding is live, making
    /// a second stop a no-op.
    pub fn request_stop(&mut self) -> Option<PendingFinalize> {
        let mut active = self.active.take()?;
        active.encoder.stop();
        Some(PendingFinalize {
            finalized_rx: active.finalized_rx,
            urls: Arc::clone(&self.urls),
        })
    }

    /// Drop the in-flight encoding without finalizing: buffered chunks are
    /// discarded and no artifact is produced. Idempotent.
    pub fn abort(&mut self) {
        if let Some(mut active) = self.active.take() {
            active.encoder.stop();
            active.pump.abort();
            tracing::debug!("Recording aborted, buffered chunks discarded");
        }
    }
}

async fn pump_chunks(
    mut events: mpsc::UnboundedReceiver<EncoderEvent>,
    started_at: Instant,
    media_type: String,
    finalized_tx: oneshot::Sender<Finalized>,
) {
    let mut chunks: Vec<Vec<u8>> = Vec::new();

    while let Some(event) = events.recv().await {
        match event {
            EncoderEvent::Data(data) if !data.is_empty() => chunks.push(data),
            // zero-length deliveries are discarded, not stored
            EncoderEvent::Data(_) => {}
            EncoderEvent::Stopped => {
                let duration_secs = whole_seconds(started_at.elapsed());
                let _ = finalized_tx.send(Finalized {
                    data: chunks.concat(),
                    media_type,
                    duration_secs,
                });
                return;
            }
        }
    }

    tracing::warn!("Encoder event stream closed without a stop event");
}
