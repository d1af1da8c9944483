//! The process-wide "currently loaded collection" slot.

use crate::collection::{CollectionBuilder, ComicCollection, LoadStage};
use crate::error::ComicError;
use parking_lot::Mutex;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Holds the collection the viewer is showing and serializes replacements.
///
/// Loads run on the blocking pool. When loads overlap the last one started
/// wins: earlier loads finish, release what they built and report
/// [`ComicError::Superseded`]. A failed load leaves the current collection in place.
pub struct ComicSession {
    builder: Arc<CollectionBuilder>,
    current: Mutex<Option<Arc<ComicCollection>>>,
    generation: AtomicU64,
}

impl ComicSession {
    pub fn new(builder: CollectionBuilder) -> Self {
        Self {
            builder: Arc::new(builder),
            current: Mutex::new(None),
            generation: AtomicU64::new(0),
        }
    }

    pub fn builder(&self) -> &CollectionBuilder {
        &self.builder
    }

    /// The collection currently on display, if any.
    pub fn current(&self) -> Option<Arc<ComicCollection>> {
        self.current.lock().clone()
    }

    pub fn page_count(&self) -> usize {
        self.current.lock().as_ref().map_or(0, |c| c.len())
    }

    /// Load `path` and make it the current collection.
    pub async fn load(&self, path: impl AsRef<Path>) -> Result<Arc<ComicCollection>, ComicError> {
        self.load_with_progress(path, |_| {}).await
    }

    /// [`load`](Self::load), reporting each stage to `observer`.
    pub async fn load_with_progress<F>(
        &self,
        path: impl AsRef<Path>,
        observer: F,
    ) -> Result<Arc<ComicCollection>, ComicError>
    where
        F: Fn(LoadStage) + Send + Sync + 'static,
    {
        let generation = self.begin();
        let builder = Arc::clone(&self.builder);
        let path = path.as_ref().to_path_buf();

        let collection =
            tokio::task::spawn_blocking(move || builder.build_with_progress(&path, &observer))
                .await??;
        self.install(generation, collection)
    }

    /// Release and clear the current collection.
    pub fn close(&self) {
        if let Some(old) = self.current.lock().take() {
            old.release();
            tracing::debug!("Closed {:?}", old.source());
        }
    }

    fn begin(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn install(
        &self,
        generation: u64,
        collection: ComicCollection,
    ) -> Result<Arc<ComicCollection>, ComicError> {
        let mut slot = self.current.lock();

        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!("Discarding superseded load of {:?}", collection.source());
            collection.release();
            return Err(ComicError::Superseded);
        }

        if let Some(old) = slot.take() {
            old.release();
        }

        let collection = Arc::new(collection);
        *slot = Some(Arc::clone(&collection));
        tracing::info!(
            "Now showing {:?} ({} pages)",
            collection.source(),
            collection.len()
        );
        Ok(collection)
    }
}

impl Drop for ComicSession {
    fn drop(&mut self) {
        self.close();
    }
}
