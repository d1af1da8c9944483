//! Content-based container detection from magic bytes.

use crate::types::ArchiveFormat;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Number of leading bytes inspected.
pub const SIGNATURE_LEN: usize = 8;

const ZIP_SIGNATURES: &[&[u8]] = &[
    b"PK\x03\x04", // local file header
    b"PK\x05\x06", // empty archive
    b"PK\x07\x08", // spanned archive
];

const RAR_SIGNATURES: &[&[u8]] = &[
    b"Rar!\x1A\x07\x00",     // RAR 4.x
    b"Rar!\x1A\x07\x01\x00", // RAR 5.x
];

const SEVEN_ZIP_SIGNATURE: &[u8] = b"7z\xBC\xAF\x27\x1C";

/// Detect the container format of the file at `path`.
///
/// Reads at most [`SIGNATURE_LEN`] bytes from offset 0. Detection is advisory:
/// a missing or unreadable file yields [`ArchiveFormat::Unknown`] rather than
/// an error, and so does a file shorter than any signature.
pub fn detect(path: &Path) -> ArchiveFormat {
    let head = match read_head(path) {
        Ok(head) => head,
        Err(e) => {
            tracing::debug!("Signature read failed for {:?}: {}", path, e);
            return ArchiveFormat::Unknown;
        }
    };

    let format = detect_from_bytes(&head);
    tracing::debug!("Detected {} for {:?}", format, path);
    format
}

/// Classify a byte prefix. Inputs shorter than a signature simply fail to match it.
pub fn detect_from_bytes(data: &[u8]) -> ArchiveFormat {
    if ZIP_SIGNATURES.iter().any(|sig| data.starts_with(sig)) {
        return ArchiveFormat::Zip;
    }

    if RAR_SIGNATURES.iter().any(|sig| data.starts_with(sig)) {
        return ArchiveFormat::Rar;
    }

    if data.starts_with(SEVEN_ZIP_SIGNATURE) {
        return ArchiveFormat::SevenZip;
    }

    ArchiveFormat::Unknown
}

/// Read up to `SIGNATURE_LEN` bytes. The file closes when `file` drops, on every path.
fn read_head(path: &Path) -> std::io::Result<Vec<u8>> {
    let file = File::open(path)?;
    let mut head = Vec::with_capacity(SIGNATURE_LEN);
    file.take(SIGNATURE_LEN as u64).read_to_end(&mut head)?;
    Ok(head)
}
