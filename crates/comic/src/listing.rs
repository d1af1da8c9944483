//! Uniform entry listing over ZIP and RAR containers.
//!
//! Both back-ends produce [`ArchiveEntry`] values whose bytes are read through
//! the same [`ArchiveEntry::read_bytes`] call. ZIP entries read lazily from a
//! shared open archive; RAR entries are extracted in one upfront pass and
//! served from memory, since RAR offers no cheap random access by name.

use crate::error::ComicError;
use crate::types::ArchiveFormat;
use parking_lot::Mutex;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::Arc;

/// Produces the full uncompressed content of one entry. Every call yields all bytes.
pub trait ReadEntry: Send + Sync {
    fn read(&self) -> Result<Vec<u8>, ComicError>;
}

/// One member of a container.
#[derive(Clone)]
pub struct ArchiveEntry {
    path: String,
    is_directory: bool,
    size: Option<u64>,
    reader: Arc<dyn ReadEntry>,
}

impl ArchiveEntry {
    pub fn new(
        path: impl Into<String>,
        is_directory: bool,
        size: Option<u64>,
        reader: Arc<dyn ReadEntry>,
    ) -> Self {
        Self {
            path: path.into(),
            is_directory,
            size,
            reader,
        }
    }

    /// An entry whose bytes are already held in memory.
    pub fn in_memory(
        path: impl Into<String>,
        is_directory: bool,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Self {
        let bytes: Arc<[u8]> = bytes.into();
        let size = Some(bytes.len() as u64);
        Self::new(path, is_directory, size, Arc::new(MemoryEntry(bytes)))
    }

    /// Raw path in the archive's native form.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The back-end's own directory marker.
    pub fn is_directory_flag(&self) -> bool {
        self.is_directory
    }

    /// Uncompressed size as recorded by the container, when known.
    pub fn size(&self) -> Option<u64> {
        self.size
    }

    pub fn read_bytes(&self) -> Result<Vec<u8>, ComicError> {
        self.reader.read()
    }
}

impl fmt::Debug for ArchiveEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArchiveEntry")
            .field("path", &self.path)
            .field("is_directory", &self.is_directory)
            .field("size", &self.size)
            .finish()
    }
}

struct MemoryEntry(Arc<[u8]>);

impl ReadEntry for MemoryEntry {
    fn read(&self) -> Result<Vec<u8>, ComicError> {
        Ok(self.0.to_vec())
    }
}

type SharedZip = Arc<Mutex<zip::ZipArchive<BufReader<File>>>>;

/// Upper bound on the buffer reserved from a size the archive declares.
const MAX_PREALLOC: u64 = 64 * 1024 * 1024; // 64 MiB

/// Capacity to reserve for an entry that declares `declared` bytes.
fn initial_capacity(declared: u64) -> usize {
    usize::try_from(declared.min(MAX_PREALLOC)).unwrap_or(0)
}

struct ZipEntry {
    archive: SharedZip,
    index: usize,
}

impl ReadEntry for ZipEntry {
    fn read(&self) -> Result<Vec<u8>, ComicError> {
        let mut archive = self.archive.lock();
        let mut file = archive.by_index(self.index)?;
        let mut buffer = Vec::with_capacity(initial_capacity(file.size()));
        file.read_to_end(&mut buffer)
            .map_err(|e| ComicError::ArchiveRead(e.to_string()))?;
        Ok(buffer)
    }
}

/// A container back-end able to enumerate its entries.
pub trait EntryLister: Send + Sync {
    /// Format this back-end reads.
    fn format(&self) -> ArchiveFormat;

    /// Enumerate every entry, directories included.
    fn list(&self, path: &Path) -> Result<Vec<ArchiveEntry>, ComicError>;
}

/// ZIP back-end using the central directory for random access.
pub struct ZipLister;

impl EntryLister for ZipLister {
    fn format(&self) -> ArchiveFormat {
        ArchiveFormat::Zip
    }

    fn list(&self, path: &Path) -> Result<Vec<ArchiveEntry>, ComicError> {
        let file = File::open(path).map_err(|e| ComicError::ArchiveRead(e.to_string()))?;
        let archive = zip::ZipArchive::new(BufReader::new(file))?;
        let shared: SharedZip = Arc::new(Mutex::new(archive));

        let mut archive = shared.lock();
        let mut entries = Vec::with_capacity(archive.len());

        for index in 0..archive.len() {
            let file = archive.by_index(index)?;
            entries.push(ArchiveEntry::new(
                file.name(),
                file.is_dir(),
                Some(file.size()),
                Arc::new(ZipEntry {
                    archive: Arc::clone(&shared),
                    index,
                }),
            ));
        }

        tracing::debug!("Listed {} ZIP entries from {:?}", entries.len(), path);
        Ok(entries)
    }
}

/// RAR back-end. Extracts every entry during listing.
pub struct RarLister;

impl EntryLister for RarLister {
    fn format(&self) -> ArchiveFormat {
        ArchiveFormat::Rar
    }

    fn list(&self, path: &Path) -> Result<Vec<ArchiveEntry>, ComicError> {
        use unrar::Archive;

        let open_archive = Archive::new(path).open_for_processing()?;
        let mut entries = Vec::new();
        let mut current = Some(open_archive);

        while let Some(arch) = current {
            match arch.read_header()? {
                Some(header) => {
                    let entry = header.entry();
                    let name = entry.filename.to_string_lossy().to_string();
                    let is_directory = entry.is_directory();

                    if is_directory {
                        entries.push(ArchiveEntry::in_memory(name, true, Vec::<u8>::new()));
                        current = Some(header.skip()?);
                    } else {
                        let (data, rest) = header.read()?;
                        entries.push(ArchiveEntry::in_memory(name, false, data));
                        current = Some(rest);
                    }
                }
                None => {
                    current = None;
                }
            }
        }

        tracing::debug!("Extracted {} RAR entries from {:?}", entries.len(), path);
        Ok(entries)
    }
}

/// Back-end for a detected format. Only ZIP and RAR have one.
pub fn lister_for(format: ArchiveFormat) -> Option<Box<dyn EntryLister>> {
    match format {
        ArchiveFormat::Zip => Some(Box::new(ZipLister)),
        ArchiveFormat::Rar => Some(Box::new(RarLister)),
        ArchiveFormat::SevenZip | ArchiveFormat::Unknown => None,
    }
}

/// List all entries of `path` using the back-end for `format`.
pub fn list_entries(path: &Path, format: ArchiveFormat) -> Result<Vec<ArchiveEntry>, ComicError> {
    let lister = lister_for(format)
        .ok_or_else(|| ComicError::UnsupportedFormat {
            format,
            reason: format!("no reader for {}", format),
        })?;
    lister.list(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::{SimpleFileOptions, ZipWriter};

    #[test]
    fn test_declared_size_does_not_drive_allocation() {
        assert_eq!(initial_capacity(10), 10);
        assert_eq!(initial_capacity(u64::MAX), MAX_PREALLOC as usize);
    }

    #[test]
    fn test_in_memory_entry_reads_repeatedly() {
        let entry = ArchiveEntry::in_memory("a.png", false, vec![1u8, 2, 3]);
        assert_eq!(entry.read_bytes().unwrap(), vec![1, 2, 3]);
        assert_eq!(entry.read_bytes().unwrap(), vec![1, 2, 3]);
        assert_eq!(entry.size(), Some(3));
    }

    #[test]
    fn test_zip_lister_reads_each_entry_fully() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("book.cbz");

        let mut zip = ZipWriter::new(File::create(&path).unwrap());
        zip.add_directory("pages/", SimpleFileOptions::default()).unwrap();
        zip.start_file("pages/01.jpg", SimpleFileOptions::default()).unwrap();
        zip.write_all(b"first").unwrap();
        zip.start_file("pages/02.jpg", SimpleFileOptions::default()).unwrap();
        zip.write_all(b"second").unwrap();
        zip.finish().unwrap();

        let entries = ZipLister.list(&path).unwrap();
        assert_eq!(entries.len(), 3);
        assert!(entries[0].is_directory_flag());
        assert_eq!(entries[2].path(), "pages/02.jpg");

        // Out-of-order and repeated reads against the shared archive
        assert_eq!(entries[2].read_bytes().unwrap(), b"second");
        assert_eq!(entries[1].read_bytes().unwrap(), b"first");
        assert_eq!(entries[2].read_bytes().unwrap(), b"second");
    }

    #[test]
    fn test_lister_selection() {
        assert_eq!(lister_for(ArchiveFormat::Zip).unwrap().format(), ArchiveFormat::Zip);
        assert_eq!(lister_for(ArchiveFormat::Rar).unwrap().format(), ArchiveFormat::Rar);
        assert!(lister_for(ArchiveFormat::SevenZip).is_none());
        assert!(lister_for(ArchiveFormat::Unknown).is_none());
    }

    #[test]
    fn test_zip_lister_rejects_garbage() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("junk.cbz");
        std::fs::write(&path, b"this is not a zip archive at all").unwrap();

        let result = ZipLister.list(&path);
        assert!(matches!(result, Err(ComicError::ArchiveRead(_))));
    }
}
