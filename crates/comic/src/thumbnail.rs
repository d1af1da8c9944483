//! Representative thumbnail for an archive: the first image page, written to disk.

use crate::collection::CollectionBuilder;
use crate::error::ComicError;
use crate::types::MediaKind;
use std::io::Write;
use std::path::{Path, PathBuf};

/// What was written by [`generate_thumbnail`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThumbnailInfo {
    pub dest: PathBuf,
    /// Normalized path of the entry used
    pub entry_path: String,
    pub mime: String,
    pub bytes_written: u64,
}

/// Write the decoded bytes of the first image page of `src` to `dest`.
///
/// Only as many entries as needed are materialized. The file is staged next to
/// `dest` and moved into place, so a failure never leaves a partial thumbnail.
pub fn generate_thumbnail(
    builder: &CollectionBuilder,
    src: &Path,
    dest: &Path,
) -> Result<ThumbnailInfo, ComicError> {
    let page = builder.first_page(src, |kind| kind == MediaKind::Image)?;
    let bytes = page.source.payload(None)?;

    let dir = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut staged = tempfile::NamedTempFile::new_in(dir)?;
    staged.write_all(&bytes)?;
    staged.as_file().sync_all()?;
    staged.persist(dest).map_err(|e| ComicError::Io(e.error))?;

    tracing::info!(
        "Wrote thumbnail {:?} from {} ({} bytes)",
        dest,
        page.entry_path,
        bytes.len()
    );

    Ok(ThumbnailInfo {
        dest: dest.to_path_buf(),
        entry_path: page.entry_path,
        mime: page.mime,
        bytes_written: bytes.len() as u64,
    })
}
