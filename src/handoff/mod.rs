//! Cross-navigation handoff
//!
//! Passes a finished recording to the upload flow across a page transition.
//! Only the object URL and metadata travel through the tab-scoped store; the
//! bytes are re-read from the registry at retrieval time. Entries are
//! consumed at most once, and anything unreadable reads as "nothing stashed".

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use crate::media::{MediaBlob, ObjectUrlRegistry};
use crate::recorder::state::RecordingArtifact;
use crate::utils::error::HandoffCorrupt;

/// File name the upload flow sees for a stashed screen recording.
pub const STASHED_RECORDING_NAME: &str = "screen-recording.webm";

/// Tab-scoped string key/value store, valid only within the originating
/// browsing session.
#[derive(Debug, Default)]
pub struct SessionStore {
    entries: Mutex<HashMap<String, String>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, key: &str, value: String) {
        self.entries.lock().insert(key.to_string(), value);
    }

    /// Read and delete in one step; entries are single-use.
    pub fn take(&self, key: &str) -> Option<String> {
        self.entries.lock().remove(key)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StashEntry {
    url: String,
    name: String,
    media_type: String,
    size_bytes: u64,
    duration_secs: u32,
}

/// Opaque key under which a recording was stashed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StashToken(String);

impl StashToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StashToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A recording rehydrated on the upload page.
#[derive(Debug, Clone)]
pub struct StashedRecording {
    pub blob: MediaBlob,
    pub name: String,
    pub duration_secs: u32,
}

impl StashedRecording {
    pub fn size_bytes(&self) -> u64 {
        self.blob.size()
    }
}

/// Bridge between the recording UI and the upload flow.
pub struct RecordingStash {
    store: Arc<SessionStore>,
    urls: Arc<ObjectUrlRegistry>,
}

impl RecordingStash {
    pub fn new(store: Arc<SessionStore>, urls: Arc<ObjectUrlRegistry>) -> Self {
        Self { store, urls }
    }

    /// Stash a finished artifact for the upload flow. The bytes are not
    /// copied; only the object URL and metadata are serialized.
    pub fn stash(&self, artifact: &RecordingArtifact) -> StashToken {
        let entry = StashEntry {
            url: artifact.url.clone(),
            name: STASHED_RECORDING_NAME.to_string(),
            media_type: artifact.blob.media_type().to_string(),
            size_bytes: artifact.size_bytes(),
            duration_secs: artifact.duration_secs,
        };

        let token = StashToken(format!("recording:{}", Uuid::new_v4()));
        match serde_json::to_string(&entry) {
            Ok(json) => self.store.set(token.as_str(), json),
            Err(err) => tracing::error!("Failed to serialize stash entry: {err}"),
        }

        tracing::debug!(token = %token, size_bytes = entry.size_bytes, "Stashed recording");
        token
    }

    /// Single-use retrieval: the entry is deleted and the object URL revoked.
    /// Absent, malformed, or dangling entries all read as `None`; the
    /// upload flow treats that as "no recording to resume".
    pub fn retrieve(&self, token: &StashToken) -> Option<StashedRecording> {
        let raw = self.store.take(token.as_str())?;
        match self.rehydrate(&raw) {
            Ok(recording) => Some(recording),
            Err(err) => {
                tracing::warn!("Discarding stashed recording: {err}");
                None
            }
        }
    }

    fn rehydrate(&self, raw: &str) -> Result<StashedRecording, HandoffCorrupt> {
        let entry: StashEntry = serde_json::from_str(raw)?;

        let blob = self
            .urls
            .resolve(&entry.url)
            .ok_or_else(|| HandoffCorrupt::DanglingUrl(entry.url.clone()))?;
        self.urls.revoke(&entry.url);

        Ok(StashedRecording {
            blob,
            name: entry.name,
            duration_secs: entry.duration_secs,
        })
    }
}
