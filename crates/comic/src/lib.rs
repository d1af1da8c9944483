//! # Comic
//!
//! Reads comic-book archives (CBZ/CBR) into an ordered sequence of renderable pages.
//!
//! The pipeline detects the real container from its magic bytes, lists entries
//! through one interface for both ZIP and RAR, keeps image and video entries in
//! natural page order, and turns each one into a page the presentation layer
//! can display directly.
//!
//! ## Supported Formats
//!
//! - ZIP (CBZ), detected by content regardless of extension
//! - RAR 4.x and 5.x (CBR)
//! - 7-Zip is recognized and rejected
//!
//! ## Example
//!
//! ```rust,no_run
//! use comic::{CollectionBuilder, Capabilities, LoadOptions};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let builder = CollectionBuilder::new(LoadOptions::default(), Capabilities::detect());
//!
//! let collection = builder.build(Path::new("volume01.cbz"))?;
//! for page in collection.pages() {
//!     println!("{} {} ({})", page.number, page.entry_path, page.mime);
//! }
//!
//! // Revoke any video handles before discarding the collection
//! collection.release();
//!
//! comic::generate_thumbnail(&builder, Path::new("volume01.cbz"), Path::new("cover.jpg"))?;
//! # Ok(())
//! # }
//! ```

pub mod blob;
pub mod capabilities;
pub mod classify;
pub mod collection;
pub mod error;
pub mod listing;
pub mod materialize;
pub mod session;
pub mod signature;
pub mod thumbnail;
pub mod transcode;
pub mod types;
pub mod viewer;

// Re-export main types
pub use blob::BlobStore;
pub use capabilities::Capabilities;
pub use collection::{CollectionBuilder, ComicCollection, LoadObserver, LoadStage};
pub use error::{ComicError, TranscodeError};
pub use listing::ArchiveEntry;
pub use materialize::{Degradation, MediaSource, Page};
pub use session::ComicSession;
pub use thumbnail::{generate_thumbnail, ThumbnailInfo};
pub use transcode::{ExternalTranscoder, TargetFormat, Transcoder};
pub use types::{
    ArchiveFormat, CollectionSummary, LoadOptions, MediaKind, PageSummary, UnknownFormatPolicy,
    VideoSourcePreference,
};
pub use viewer::ViewerState;

use std::path::Path;

/// Detect the container format of a file from its leading bytes.
///
/// Never fails: unreadable or unrecognized files are [`ArchiveFormat::Unknown`].
pub fn detect(path: &Path) -> ArchiveFormat {
    signature::detect(path)
}

/// List the entries of an archive with the back-end for `format`.
///
/// # Errors
///
/// Returns `UnsupportedFormat` for formats without a back-end and
/// `ArchiveRead` when the container cannot be parsed.
pub fn list_entries(path: &Path, format: ArchiveFormat) -> Result<Vec<ArchiveEntry>, ComicError> {
    listing::list_entries(path, format)
}

/// Load an archive with default options and no optional capabilities.
///
/// # Errors
///
/// Returns an error if:
/// - The file is a 7-Zip archive (`UnsupportedFormat`)
/// - The container cannot be read (`ArchiveRead`)
/// - No image or video entries survive filtering (`NoMediaFound`)
pub fn load(path: &Path) -> Result<ComicCollection, ComicError> {
    CollectionBuilder::default().build(path)
}
