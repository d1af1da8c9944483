//! Error types for comic archive loading.

use crate::types::ArchiveFormat;
use thiserror::Error;

/// Markers that identify a truncated or mislabeled container in a raw
/// back-end error message.
const TRUNCATION_MARKERS: &[&str] = &[
    "unexpected end",
    "unexpected eof",
    "failed to fill whole buffer",
    "central directory end",
    "could not find eocd",
];

/// Main error type for loading an archive into a page sequence.
#[derive(Debug, Error)]
pub enum ComicError {
    /// The container is 7-Zip or otherwise not readable as ZIP/RAR.
    #[error("Unsupported format ({format}): {reason}")]
    UnsupportedFormat {
        /// What the signature was detected as
        format: ArchiveFormat,
        reason: String,
    },

    /// The container could not be listed or read. Carries the raw back-end message.
    #[error("Archive read error: {0}")]
    ArchiveRead(String),

    /// The archive parsed but holds no image or video entries.
    #[error("No supported media found in archive")]
    NoMediaFound,

    /// A single entry could not be turned into a page.
    #[error("Failed to materialize '{path}': {message}")]
    EntryMaterialize {
        /// Normalized entry path
        path: String,
        /// What went wrong
        message: String,
    },

    /// A page's bytes could not be produced from an already loaded collection.
    #[error("Page unavailable: {0}")]
    PageUnavailable(String),

    /// A newer load started before this one finished.
    #[error("Load superseded by a newer request")]
    Superseded,

    /// The background task running the pipeline failed.
    #[error("Background task failed: {0}")]
    Task(String),

    /// An I/O error outside of archive parsing (e.g. writing a thumbnail).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ComicError {
    /// Whether this error aborts a whole load (as opposed to a skipped entry).
    pub fn is_archive_level(&self) -> bool {
        !matches!(
            self,
            ComicError::EntryMaterialize { .. } | ComicError::PageUnavailable(_)
        )
    }

    /// Whether the raw read error looks like a truncated stream.
    pub fn is_truncation(&self) -> bool {
        match self {
            ComicError::ArchiveRead(message) => {
                let lower = message.to_lowercase();
                TRUNCATION_MARKERS.iter().any(|m| lower.contains(m))
            }
            _ => false,
        }
    }

    /// The single message shown to the user for a failed load.
    pub fn user_message(&self) -> String {
        match self {
            ComicError::UnsupportedFormat {
                format: ArchiveFormat::SevenZip,
                ..
            } => "7z archives are not supported. The file must be a ZIP (CBZ) or RAR (CBR) archive."
                .to_string(),
            ComicError::UnsupportedFormat { reason, .. } => format!(
                "Unsupported archive ({}). The file must be a ZIP (CBZ) or RAR (CBR) archive.",
                reason
            ),
            ComicError::ArchiveRead(_) if self.is_truncation() => {
                "The archive ended unexpectedly. It may be incomplete, or mislabeled \
                 (for example a RAR file renamed to .cbz)."
                    .to_string()
            }
            ComicError::ArchiveRead(message) => format!("Failed to read archive: {}", message),
            ComicError::NoMediaFound => {
                "No supported images or videos were found in this archive.".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl From<zip::result::ZipError> for ComicError {
    fn from(e: zip::result::ZipError) -> Self {
        ComicError::ArchiveRead(e.to_string())
    }
}

impl From<unrar::error::UnrarError> for ComicError {
    fn from(e: unrar::error::UnrarError) -> Self {
        ComicError::ArchiveRead(e.to_string())
    }
}

impl From<tokio::task::JoinError> for ComicError {
    fn from(e: tokio::task::JoinError) -> Self {
        ComicError::Task(e.to_string())
    }
}

/// Errors raised by a HEIC/HEIF transcoder.
#[derive(Debug, Error)]
pub enum TranscodeError {
    /// No transcoder is installed.
    #[error("Transcoder unavailable")]
    Unavailable,

    /// The transcoder ran but did not produce output.
    #[error("Transcoding failed: {0}")]
    Failed(String),

    /// Scratch file handling failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
