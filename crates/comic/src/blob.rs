//! Revocable in-process binary handles for large media.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

const BLOB_SCHEME: &str = "blob:cbx/";

/// A blob registered with a store: its MIME type and bytes.
#[derive(Debug, Clone)]
pub struct Blob {
    pub mime: String,
    pub bytes: Arc<[u8]>,
}

/// Registry of short-lived blob URLs.
///
/// Handles stay resolvable until revoked. Whoever creates a handle owns its
/// revocation.
#[derive(Debug, Default)]
pub struct BlobStore {
    blobs: Mutex<HashMap<String, Blob>>,
}

impl BlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `bytes` and return a fresh `blob:` URL for them.
    pub fn create(&self, bytes: impl Into<Arc<[u8]>>, mime: &str) -> String {
        let url = format!("{}{}", BLOB_SCHEME, Uuid::new_v4());
        self.blobs.lock().insert(
            url.clone(),
            Blob {
                mime: mime.to_string(),
                bytes: bytes.into(),
            },
        );
        url
    }

    pub fn resolve(&self, url: &str) -> Option<Blob> {
        self.blobs.lock().get(url).cloned()
    }

    /// Drop a handle. Returns `false` if it was not live.
    pub fn revoke(&self, url: &str) -> bool {
        self.blobs.lock().remove(url).is_some()
    }

    /// Number of live handles.
    pub fn len(&self) -> usize {
        self.blobs.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_blob_url(url: &str) -> bool {
        url.starts_with(BLOB_SCHEME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_resolve_revoke() {
        let store = BlobStore::new();
        let url = store.create(vec![9u8, 8, 7], "video/mp4");
        assert!(BlobStore::is_blob_url(&url));
        assert_eq!(store.len(), 1);

        let blob = store.resolve(&url).unwrap();
        assert_eq!(blob.mime, "video/mp4");
        assert_eq!(&*blob.bytes, &[9, 8, 7]);

        assert!(store.revoke(&url));
        assert!(!store.revoke(&url));
        assert!(store.resolve(&url).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_urls_are_unique() {
        let store = BlobStore::new();
        let a = store.create(Vec::<u8>::new(), "video/webm");
        let b = store.create(Vec::<u8>::new(), "video/webm");
        assert_ne!(a, b);
        assert_eq!(store.len(), 2);
    }
}
