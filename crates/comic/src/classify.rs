//! Entry classification and page ordering.
//!
//! Pure functions over entry metadata: path normalization, extension lookup,
//! junk filtering, media classification and the natural page order.

use crate::listing::ArchiveEntry;
use crate::types::MediaKind;
use std::cmp::Ordering;

/// Image extensions accepted as pages.
pub const IMAGE_EXTENSIONS: &[&str] = &[
    ".jpg", ".jpeg", ".png", ".gif", ".webp", ".bmp", ".heic", ".heif",
];

/// Video extensions accepted as pages.
pub const VIDEO_EXTENSIONS: &[&str] = &[".mp4", ".webm", ".mov", ".m4v", ".ogv"];

/// Extensions that need transcoding before most renderers can show them.
pub const HEIF_EXTENSIONS: &[&str] = &[".heic", ".heif"];

/// Resource-fork folder macOS adds when zipping.
const MACOS_JUNK_PREFIX: &str = "__MACOSX/";

/// Convert backslashes to slashes, strip a leading `./` and collapse repeated slashes.
pub fn normalize_path(raw: &str) -> String {
    let forward = raw.replace('\\', "/");
    let mut trimmed = forward.as_str();
    while let Some(rest) = trimmed.strip_prefix("./") {
        trimmed = rest;
    }

    let mut normalized = String::with_capacity(trimmed.len());
    let mut previous_slash = false;
    for c in trimmed.chars() {
        if c == '/' {
            if previous_slash {
                continue;
            }
            previous_slash = true;
        } else {
            previous_slash = false;
        }
        normalized.push(c);
    }
    normalized
}

/// Lowercase, dot-inclusive extension of a normalized path; empty when there is none.
pub fn path_extension(normalized: &str) -> String {
    let file_name = normalized.rsplit('/').next().unwrap_or(normalized);
    match file_name.rfind('.') {
        Some(dot) => file_name[dot..].to_lowercase(),
        None => String::new(),
    }
}

/// Extension of an entry's normalized path.
pub fn extension(entry: &ArchiveEntry) -> String {
    path_extension(&normalize_path(entry.path()))
}

/// True when the back-end marks the entry as a directory or its path ends in `/`.
pub fn is_directory(entry: &ArchiveEntry) -> bool {
    entry.is_directory_flag() || normalize_path(entry.path()).ends_with('/')
}

/// Media kind for an extension, if it is one we render.
pub fn kind_for_extension(ext: &str) -> Option<MediaKind> {
    if IMAGE_EXTENSIONS.contains(&ext) {
        Some(MediaKind::Image)
    } else if VIDEO_EXTENSIONS.contains(&ext) {
        Some(MediaKind::Video)
    } else {
        None
    }
}

/// Classify an entry. Directories, `__MACOSX/` junk and unknown extensions give `None`.
pub fn media_kind(entry: &ArchiveEntry) -> Option<MediaKind> {
    if is_directory(entry) {
        return None;
    }

    let normalized = normalize_path(entry.path());
    if normalized.starts_with(MACOS_JUNK_PREFIX) {
        return None;
    }

    kind_for_extension(&path_extension(&normalized))
}

/// Whether an extension is HEIC/HEIF.
pub fn is_heif_extension(ext: &str) -> bool {
    HEIF_EXTENSIONS.contains(&ext)
}

/// Page order: case-insensitive comparison treating digit runs as numbers,
/// so `page2.jpg` sorts before `page10.jpg`.
pub fn compare_paths(a: &str, b: &str) -> Ordering {
    natord::compare_ignore_case(&normalize_path(a), &normalize_path(b))
}

/// [`compare_paths`] over entries.
pub fn compare_for_ordering(a: &ArchiveEntry, b: &ArchiveEntry) -> Ordering {
    compare_paths(a.path(), b.path())
}

/// Keep only page entries and sort them into page order.
///
/// The sort is stable, so entries comparing equal keep their archive order.
pub fn accept_and_sort(entries: Vec<ArchiveEntry>) -> Vec<(ArchiveEntry, MediaKind)> {
    let mut accepted: Vec<(ArchiveEntry, MediaKind)> = entries
        .into_iter()
        .filter_map(|entry| media_kind(&entry).map(|kind| (entry, kind)))
        .collect();
    accepted.sort_by(|(a, _), (b, _)| compare_for_ordering(a, b));
    accepted
}
