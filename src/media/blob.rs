//! Finished-media blobs and origin-scoped object URLs

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug)]
struct BlobInner {
    data: Vec<u8>,
    media_type: String,
}

/// Immutable byte blob tagged with a media type. Cloning shares the bytes.
#[derive(Debug, Clone)]
pub struct MediaBlob {
    inner: Arc<BlobInner>,
}

impl MediaBlob {
    pub fn new(data: Vec<u8>, media_type: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(BlobInner {
                data,
                media_type: media_type.into(),
            }),
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.inner.data
    }

    pub fn media_type(&self) -> &str {
        &self.inner.media_type
    }

    pub fn size(&self) -> u64 {
        self.inner.data.len() as u64
    }
}

/// Registry of transient `blob:` URLs for locally-held media.
///
/// A created URL keeps the blob reachable until it is revoked; revoking an
/// unknown URL is a no-op.
#[derive(Debug, Default)]
pub struct ObjectUrlRegistry {
    entries: Mutex<HashMap<String, MediaBlob>>,
}

impl ObjectUrlRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_url(&self, blob: &MediaBlob) -> String {
        let url = format!("blob:{}", Uuid::new_v4());
        self.entries.lock().insert(url.clone(), blob.clone());
        url
    }

    pub fn resolve(&self, url: &str) -> Option<MediaBlob> {
        self.entries.lock().get(url).cloned()
    }

    pub fn revoke(&self, url: &str) {
        self.entries.lock().remove(url);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
