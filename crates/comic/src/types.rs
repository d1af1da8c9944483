//! Type definitions shared across the page pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use ts_rs::TS;

/// Container format detected from a file's leading bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveFormat {
    Zip,
    Rar,
    SevenZip,
    Unknown,
}

impl ArchiveFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArchiveFormat::Zip => "ZIP",
            ArchiveFormat::Rar => "RAR",
            ArchiveFormat::SevenZip => "7Z",
            ArchiveFormat::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a page renders as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

/// What to do when the signature matches neither ZIP, RAR nor 7-Zip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownFormatPolicy {
    /// Attempt a ZIP read anyway (files with prepended junk are still valid ZIPs).
    #[default]
    TryZip,
    /// Fail immediately with `UnsupportedFormat`.
    Reject,
}

/// How video pages are exposed to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoSourcePreference {
    /// Revocable blob handle when a blob store is available.
    #[default]
    Blob,
    /// Always inline the video as a base64 data URI.
    DataUri,
}

/// Options for loading an archive into pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    /// Policy for unrecognized signatures
    pub unknown_format: UnknownFormatPolicy,

    /// JPEG quality used when transcoding HEIC/HEIF (1-100)
    pub heic_quality: u8,

    /// Preferred source form for video pages
    pub video_source: VideoSourcePreference,

    /// Largest single entry accepted, in bytes (default: 512 MiB)
    pub max_entry_bytes: Option<u64>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            unknown_format: UnknownFormatPolicy::TryZip,
            heic_quality: 92,
            video_source: VideoSourcePreference::Blob,
            max_entry_bytes: Some(512 * 1024 * 1024), // 512 MiB
        }
    }
}

impl LoadOptions {
    /// Read options from a JSON file. Missing fields keep their defaults.
    pub fn from_json_file(path: &Path) -> std::io::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// Transcoder quality as a fraction in `0.01..=1.0`.
    pub fn quality_fraction(&self) -> f32 {
        f32::from(self.heic_quality.clamp(1, 100)) / 100.0
    }
}

/// Presentation-facing description of one page.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PageSummary {
    /// 1-based page number
    #[ts(type = "number")]
    pub number: usize,

    /// Normalized entry path inside the archive
    pub entry_path: String,

    pub kind: MediaKind,

    pub mime: String,

    /// Whether the source is a revocable blob handle
    pub blob: bool,

    /// Recorded degradation, if any
    #[ts(optional)]
    pub degradation: Option<String>,
}

/// Presentation-facing description of a loaded collection.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSummary {
    pub source: String,

    pub format: ArchiveFormat,

    #[ts(type = "number")]
    pub page_count: usize,

    /// Entries that were accepted but failed to materialize
    #[ts(type = "number")]
    pub skipped: usize,

    pub pages: Vec<PageSummary>,
}
