//! Recording session state machine
//!
//! `ScreenRecorder` is the public-facing orchestrator: it sequences
//! acquire -> mix -> compose -> record -> finalize and owns every acquired
//! resource until teardown. Exactly one session may be acquiring or
//! recording per recorder instance.
//!
//! Cancellation is epoch-based: every reset bumps the session epoch, and
//! every suspension point re-checks it afterwards, so a capture granted for
//! an already-reset session is stopped on the spot instead of adopted.

use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::capture::acquire::{self, CaptureBundle};
use crate::capture::compose::{self, ComposedStream};
use crate::capture::traits::{MediaPlatform, PermissionState};
use crate::media::ObjectUrlRegistry;
use crate::mixer::{self, MixedAudioOutput};
use crate::recorder::controller::{whole_seconds, RecordingController};
use crate::recorder::state::{MicrophoneState, RecorderConfig, RecordingArtifact, SessionState};
use crate::utils::error::{ErrorResponse, RecorderError};

/// Events emitted as the session transitions
#[derive(Debug, Clone)]
pub enum SessionEvent {
    Started,
    Stopped,
    Reset,
    Error(String),
}

enum StartOutcome {
    Started,
    Canceled,
}

/// Everything a live capture holds; torn down exactly once per session.
struct CaptureResources {
    bundle: CaptureBundle,
    mixed: Option<MixedAudioOutput>,
    composed: ComposedStream,
}

impl CaptureResources {
    fn teardown(&mut self) {
        self.composed.teardown();
        self.bundle.stop_all();
        if let Some(mixed) = self.mixed.as_mut() {
            mixed.close();
        }
    }
}

struct SessionInner {
    state: SessionState,
    epoch: u64,
    pending_stop: bool,
    resources: Option<CaptureResources>,
    artifact: Option<RecordingArtifact>,
    microphone: MicrophoneState,
    controller: RecordingController,
    last_error: Option<RecorderError>,
}

/// The recording session aggregate exposed to the UI layer.
pub struct ScreenRecorder {
    platform: Arc<dyn MediaPlatform>,
    config: RecorderConfig,
    urls: Arc<ObjectUrlRegistry>,
    inner: Mutex<SessionInner>,
    event_tx: broadcast::Sender<SessionEvent>,
}

impl ScreenRecorder {
    pub fn new(platform: Arc<dyn MediaPlatform>, config: RecorderConfig) -> Self {
        Self::with_url_registry(platform, config, Arc::new(ObjectUrlRegistry::new()))
    }

    /// Build a recorder sharing an object-URL registry with the handoff
    /// bridge.
    pub fn with_url_registry(
        platform: Arc<dyn MediaPlatform>,
        config: RecorderConfig,
        urls: Arc<ObjectUrlRegistry>,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(32);
        Self {
            platform,
            config,
            urls: Arc::clone(&urls),
            inner: Mutex::new(SessionInner {
                state: SessionState::Idle,
                epoch: 0,
                pending_stop: false,
                resources: None,
                artifact: None,
                microphone: MicrophoneState::default(),
                controller: RecordingController::new(urls),
                last_error: None,
            }),
            event_tx,
        }
    }

    pub fn object_urls(&self) -> Arc<ObjectUrlRegistry> {
        Arc::clone(&self.urls)
    }

    /// Subscribe to session transition events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.event_tx.subscribe()
    }

    pub fn state(&self) -> SessionState {
        self.inner.lock().state
    }

    pub fn is_recording(&self) -> bool {
        self.state() == SessionState::Recording
    }

    pub fn artifact(&self) -> Option<RecordingArtifact> {
        self.inner.lock().artifact.clone()
    }

    /// Recording length in whole seconds: the artifact's duration once
    /// stopped, the live elapsed time while recording, zero otherwise.
    pub fn duration_secs(&self) -> u32 {
        let inner = self.inner.lock();
        if let Some(artifact) = &inner.artifact {
            return artifact.duration_secs;
        }
        inner.controller.elapsed().map(whole_seconds).unwrap_or(0)
    }

    pub fn microphone_state(&self) -> MicrophoneState {
        self.inner.lock().microphone
    }

    pub fn last_error(&self) -> Option<ErrorResponse> {
        self.inner.lock().last_error.as_ref().map(ErrorResponse::from)
    }

    /// Toggle the microphone preference, re-querying platform permission.
    ///
    /// The UI calls this once at mount to initialize the preference: granted
    /// permission enables the toggle, a denial forces it off. A toggle while
    /// recording takes effect on the next acquisition only.
    pub async fn toggle_microphone(&self) -> MicrophoneState {
        let status = self.platform.query_microphone_permission().await;

        let mut inner = self.inner.lock();
        inner.microphone = match status {
            PermissionState::Denied => MicrophoneState {
                toggled: false,
                status: PermissionState::Denied,
            },
            PermissionState::Granted => MicrophoneState {
                toggled: !inner.microphone.toggled,
                status: PermissionState::Granted,
            },
        };
        inner.microphone
    }

    /// Start a recording session. Returns `false` on acquisition or encoder
    /// failure (the session is then in `Error`) and when the start was
    /// canceled by a concurrent reset.
    ///
    /// Starting over a live recording forces a full stop+reset of the
    /// previous session first; starting while an acquisition is already in
    /// flight is rejected.
    pub async fn start_recording(&self) -> bool {
        match self.state() {
            SessionState::Acquiring => {
                tracing::warn!("start_recording ignored: acquisition already in flight");
                return false;
            }
            SessionState::Recording => {
                self.stop_recording().await;
                self.reset_recording();
            }
            SessionState::Stopped | SessionState::Error => self.reset_recording(),
            SessionState::Idle => {}
        }

        match self.run_acquisition().await {
            Ok(StartOutcome::Started) => {
                let _ = self.event_tx.send(SessionEvent::Started);

                let stop_queued = {
                    let mut inner = self.inner.lock();
                    std::mem::take(&mut inner.pending_stop)
                };
                if stop_queued {
                    tracing::debug!("Applying stop queued during acquisition");
                    self.stop_recording().await;
                }
                true
            }
            Ok(StartOutcome::Canceled) => false,
            Err(_) => false,
        }
    }

    /// Stop the live recording and finalize it into an artifact.
    ///
    /// Idempotent: stopping a session that is not recording is a no-op. A
    /// stop issued while acquisition is still in flight is queued and takes
    /// effect as soon as the recording starts.
    pub async fn stop_recording(&self) {
        let (pending, epoch) = {
            let mut inner = self.inner.lock();
            match inner.state {
                SessionState::Acquiring => {
                    inner.pending_stop = true;
                    tracing::debug!("Stop requested during acquisition, queued");
                    return;
                }
                SessionState::Recording => {}
                _ => return,
            }

            let pending = inner.controller.request_stop();
            // Release the capture hardware now; finalization continues from
            // the chunks already delivered.
            if let Some(resources) = inner.resources.as_mut() {
                resources.teardown();
            }
            (pending, inner.epoch)
        };

        // No pending finalization means another stop already claimed it.
        let Some(pending) = pending else { return };
        let artifact = pending.wait().await;

        let mut inner = self.inner.lock();
        if inner.epoch != epoch {
            // A reset raced finalization; the artifact belongs to nobody.
            drop(inner);
            if let Some(artifact) = artifact {
                self.urls.revoke(&artifact.url);
            }
            return;
        }

        inner.resources = None;
        match artifact {
            Some(artifact) => {
                tracing::info!(duration_secs = artifact.duration_secs, "Recording stopped");
                inner.state = SessionState::Stopped;
                inner.artifact = Some(artifact);
                drop(inner);
                let _ = self.event_tx.send(SessionEvent::Stopped);
            }
            None => {
                let err = RecorderError::Recording("encoder finished without an artifact".into());
                tracing::error!("{err}");
                inner.state = SessionState::Error;
                inner.last_error = Some(err.clone());
                drop(inner);
                let _ = self.event_tx.send(SessionEvent::Error(err.to_string()));
            }
        }
    }

    /// Universal escape hatch: legal from any state. Tears down the capture
    /// streams, the audio graph, buffered chunks, and the preview URL, then
    /// returns the session to `Idle`.
    pub fn reset_recording(&self) {
        {
            let mut inner = self.inner.lock();
            inner.epoch += 1;
            inner.pending_stop = false;
            inner.controller.abort();
            if let Some(mut resources) = inner.resources.take() {
                resources.teardown();
            }
            if let Some(artifact) = inner.artifact.take() {
                self.urls.revoke(&artifact.url);
            }
            inner.last_error = None;
            inner.state = SessionState::Idle;
        }
        let _ = self.event_tx.send(SessionEvent::Reset);
        tracing::debug!("Recording session reset");
    }

    /// Discard the finished recording and immediately start a new one.
    pub async fn record_again(&self) -> bool {
        self.reset_recording();
        self.start_recording().await
    }

    async fn run_acquisition(&self) -> Result<StartOutcome, RecorderError> {
        let (epoch, toggled, status) = {
            let mut inner = self.inner.lock();
            inner.epoch += 1;
            inner.pending_stop = false;
            inner.state = SessionState::Acquiring;
            inner.last_error = None;
            (inner.epoch, inner.microphone.toggled, inner.microphone.status)
        };

        let bundle = match acquire::acquire(
            self.platform.as_ref(),
            &self.config.display,
            toggled,
            status,
        )
        .await
        {
            Ok(bundle) => bundle,
            Err(err) => return Err(self.fail_start(epoch, err.into())),
        };

        // The session may have been reset while the permission UI was up;
        // the capture then belongs to nobody and must not be adopted.
        if self.is_stale(epoch) {
            bundle.stop_all();
            tracing::debug!("Discarding capture acquired for a reset session");
            return Ok(StartOutcome::Canceled);
        }

        let mixed = match mixer::build_mixer(|| self.platform.new_audio_graph(), &bundle) {
            Ok(mixed) => mixed,
            Err(fault) => {
                tracing::warn!("Audio mixer fault, recording unmixed tracks: {fault}");
                None
            }
        };

        let composed = match compose::compose(&bundle, mixed.as_ref()) {
            Ok(composed) => composed,
            Err(err) => {
                bundle.stop_all();
                if let Some(mut mixed) = mixed {
                    mixed.close();
                }
                return Err(self.fail_start(epoch, err.into()));
            }
        };

        let mut inner = self.inner.lock();
        if inner.epoch != epoch || inner.state != SessionState::Acquiring {
            drop(inner);
            composed.teardown();
            if let Some(mut mixed) = mixed {
                mixed.close();
            }
            return Ok(StartOutcome::Canceled);
        }

        match inner
            .controller
            .start(self.platform.as_ref(), &composed, &self.config)
        {
            Ok(()) => {
                inner.state = SessionState::Recording;
                inner.resources = Some(CaptureResources {
                    bundle,
                    mixed,
                    composed,
                });
                tracing::info!("Recording started");
                Ok(StartOutcome::Started)
            }
            Err(err) => {
                drop(inner);
                composed.teardown();
                if let Some(mut mixed) = mixed {
                    mixed.close();
                }
                Err(self.fail_start(epoch, err.into()))
            }
        }
    }

    /// Record a start failure. Callers have already released their partial
    /// resources; this moves the session to `Error` unless a reset already
    /// superseded it.
    fn fail_start(&self, epoch: u64, err: RecorderError) -> RecorderError {
        tracing::error!("Recording failed to start: {err}");
        let mut inner = self.inner.lock();
        if inner.epoch == epoch && inner.state == SessionState::Acquiring {
            inner.state = SessionState::Error;
            inner.last_error = Some(err.clone());
            drop(inner);
            let _ = self.event_tx.send(SessionEvent::Error(err.to_string()));
        }
        err
    }

    fn is_stale(&self, epoch: u64) -> bool {
        let inner = self.inner.lock();
        inner.epoch != epoch || inner.state != SessionState::Acquiring
    }
}

impl Drop for ScreenRecorder {
    fn drop(&mut self) {
        // teardown on unmount; any in-flight acquisition observes the epoch
        // bump and releases its own streams
        self.reset_recording();
    }
}
