//! Archive path to ordered page sequence.

use crate::blob::BlobStore;
use crate::capabilities::Capabilities;
use crate::classify::accept_and_sort;
use crate::error::ComicError;
use crate::listing::{list_entries, ArchiveEntry};
use crate::materialize::{Materializer, Page};
use crate::signature::detect;
use crate::types::{ArchiveFormat, CollectionSummary, LoadOptions, MediaKind, UnknownFormatPolicy};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Stage reached by a load, reported to progress observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStage {
    Detecting,
    Listing(ArchiveFormat),
    Filtering,
    /// 1-based accepted entry being built out of `total`
    Materializing { index: usize, total: usize },
    Ready,
}

/// Observer for load progress.
pub type LoadObserver<'a> = dyn Fn(LoadStage) + Send + Sync + 'a;

/// Ordered pages of one loaded archive.
///
/// Page `i` is the `i`-th accepted media entry in natural path order. Blob
/// handles issued for video pages are revoked by [`ComicCollection::release`],
/// which also runs on drop.
#[derive(Debug)]
pub struct ComicCollection {
    source: PathBuf,
    format: ArchiveFormat,
    pages: Vec<Page>,
    skipped: usize,
    blobs: Option<Arc<BlobStore>>,
    released: AtomicBool,
}

impl ComicCollection {
    fn new(source: &Path, format: ArchiveFormat, blobs: Option<Arc<BlobStore>>) -> Self {
        Self {
            source: source.to_path_buf(),
            format,
            pages: Vec::new(),
            skipped: 0,
            blobs,
            released: AtomicBool::new(false),
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Format the archive was read as.
    pub fn format(&self) -> ArchiveFormat {
        self.format
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// Page at 0-based `index`.
    pub fn page(&self, index: usize) -> Option<&Page> {
        self.pages.get(index)
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Accepted entries that failed to materialize.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Decoded bytes of the page at 0-based `index`.
    pub fn page_bytes(&self, index: usize) -> Result<Vec<u8>, ComicError> {
        let page = self.page(index).ok_or_else(|| {
            ComicError::PageUnavailable(format!("page index {} out of range", index))
        })?;
        page.source.payload(self.blobs.as_deref())
    }

    /// Blob URLs this collection still owns.
    pub fn blob_handles(&self) -> Vec<&str> {
        if self.is_released() {
            return Vec::new();
        }
        self.pages
            .iter()
            .filter(|page| page.source.is_blob())
            .map(|page| page.source.uri())
            .collect()
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }

    /// Revoke every blob handle issued for this collection. Safe to call twice.
    pub fn release(&self) {
        if self.released.swap(true, Ordering::AcqRel) {
            return;
        }

        let Some(store) = &self.blobs else {
            return;
        };

        let mut revoked = 0;
        for page in self.pages.iter().filter(|page| page.source.is_blob()) {
            if store.revoke(page.source.uri()) {
                revoked += 1;
            }
        }

        if revoked > 0 {
            tracing::debug!("Released {} blob handles for {:?}", revoked, self.source);
        }
    }

    pub fn summary(&self) -> CollectionSummary {
        CollectionSummary {
            source: self.source.display().to_string(),
            format: self.format,
            page_count: self.pages.len(),
            skipped: self.skipped,
            pages: self.pages.iter().map(Page::summary).collect(),
        }
    }
}

impl Drop for ComicCollection {
    fn drop(&mut self) {
        self.release();
    }
}

/// Runs the full pipeline: detect, list, filter, sort, materialize.
#[derive(Debug, Clone, Default)]
pub struct CollectionBuilder {
    options: LoadOptions,
    capabilities: Capabilities,
}

impl CollectionBuilder {
    pub fn new(options: LoadOptions, capabilities: Capabilities) -> Self {
        Self {
            options,
            capabilities,
        }
    }

    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    /// Pick the back-end format for `path`.
    ///
    /// 7-Zip fails fast. Unrecognized signatures are read as ZIP unless the
    /// policy says to reject them.
    pub fn resolve_format(&self, path: &Path) -> Result<ArchiveFormat, ComicError> {
        match detect(path) {
            ArchiveFormat::SevenZip => Err(ComicError::UnsupportedFormat {
                format: ArchiveFormat::SevenZip,
                reason: "7z not supported, must be ZIP/RAR".to_string(),
            }),
            ArchiveFormat::Unknown => match self.options.unknown_format {
                UnknownFormatPolicy::TryZip => {
                    tracing::debug!("Unrecognized signature for {:?}, trying ZIP", path);
                    Ok(ArchiveFormat::Zip)
                }
                UnknownFormatPolicy::Reject => Err(ComicError::UnsupportedFormat {
                    format: ArchiveFormat::Unknown,
                    reason: "unrecognized archive signature".to_string(),
                }),
            },
            format => Ok(format),
        }
    }

    /// Resolve, list and filter: the accepted entries in page order.
    pub fn accepted_entries(
        &self,
        path: &Path,
        observer: &LoadObserver<'_>,
    ) -> Result<(ArchiveFormat, Vec<(ArchiveEntry, MediaKind)>), ComicError> {
        observer(LoadStage::Detecting);
        let format = self.resolve_format(path)?;

        observer(LoadStage::Listing(format));
        let entries = list_entries(path, format)?;
        let listed = entries.len();

        observer(LoadStage::Filtering);
        let accepted = accept_and_sort(entries);
        tracing::debug!(
            "{} of {} entries accepted as pages in {:?}",
            accepted.len(),
            listed,
            path
        );

        Ok((format, accepted))
    }

    /// Load every page of the archive at `path`.
    pub fn build(&self, path: &Path) -> Result<ComicCollection, ComicError> {
        self.build_with_progress(path, &|_| {})
    }

    /// [`build`](Self::build) with stage notifications.
    pub fn build_with_progress(
        &self,
        path: &Path,
        observer: &LoadObserver<'_>,
    ) -> Result<ComicCollection, ComicError> {
        let (format, accepted) = self.accepted_entries(path, observer)?;
        let materializer = Materializer::new(&self.options, &self.capabilities);

        // Dropping `collection` on an early return releases any handles it already holds.
        let mut collection =
            ComicCollection::new(path, format, self.capabilities.blob_store().cloned());
        let total = accepted.len();

        for (position, (entry, _)) in accepted.iter().enumerate() {
            observer(LoadStage::Materializing {
                index: position + 1,
                total,
            });

            let number = collection.pages.len() + 1;
            match materializer.materialize(entry, number) {
                Ok(Some(page)) => collection.pages.push(page),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!("Skipping entry: {}", e);
                    collection.skipped += 1;
                }
            }
        }

        if collection.is_empty() {
            return Err(ComicError::NoMediaFound);
        }

        observer(LoadStage::Ready);
        tracing::info!(
            "Loaded {} pages from {:?} ({}, {} skipped)",
            collection.len(),
            path,
            format,
            collection.skipped
        );
        Ok(collection)
    }

    /// Build only the first page that satisfies `accept`, materializing entries
    /// in page order until one does.
    pub fn first_page(
        &self,
        path: &Path,
        accept: impl Fn(MediaKind) -> bool,
    ) -> Result<Page, ComicError> {
        let (_, accepted) = self.accepted_entries(path, &|_| {})?;
        let materializer = Materializer::new(&self.options, &self.capabilities);

        for (entry, kind) in accepted.iter().filter(|(_, kind)| accept(*kind)) {
            match materializer.materialize(entry, 1) {
                Ok(Some(page)) => return Ok(page),
                Ok(None) => {}
                Err(e) => tracing::warn!("Skipping {:?} entry: {}", kind, e),
            }
        }

        Err(ComicError::NoMediaFound)
    }
}
