//! Optional runtime capabilities, probed once and carried as handles.

use crate::blob::BlobStore;
use crate::transcode::{ExternalTranscoder, Transcoder};
use std::sync::Arc;

/// Optional collaborators the pipeline can use when present.
#[derive(Debug, Clone, Default)]
pub struct Capabilities {
    transcoder: Option<Arc<dyn Transcoder>>,
    blobs: Option<Arc<BlobStore>>,
}

impl Capabilities {
    /// Probe the environment: a HEIC transcoder on `PATH` and a fresh blob store.
    pub fn detect() -> Self {
        let transcoder = ExternalTranscoder::probe().map(|t| Arc::new(t) as Arc<dyn Transcoder>);
        Self {
            transcoder,
            blobs: Some(Arc::new(BlobStore::new())),
        }
    }

    /// No transcoder and no blob store.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_transcoder(mut self, transcoder: Arc<dyn Transcoder>) -> Self {
        self.transcoder = Some(transcoder);
        self
    }

    pub fn without_transcoder(mut self) -> Self {
        self.transcoder = None;
        self
    }

    pub fn with_blob_store(mut self, blobs: Arc<BlobStore>) -> Self {
        self.blobs = Some(blobs);
        self
    }

    pub fn transcoder(&self) -> Option<&Arc<dyn Transcoder>> {
        self.transcoder.as_ref()
    }

    pub fn blob_store(&self) -> Option<&Arc<BlobStore>> {
        self.blobs.as_ref()
    }
}
