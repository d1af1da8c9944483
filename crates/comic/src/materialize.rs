//! Turning accepted entries into renderable pages.

use crate::blob::BlobStore;
use crate::capabilities::Capabilities;
use crate::classify::{extension, is_heif_extension, media_kind, normalize_path};
use crate::error::ComicError;
use crate::listing::ArchiveEntry;
use crate::transcode::TargetFormat;
use crate::types::{LoadOptions, MediaKind, PageSummary, VideoSourcePreference};
use base64::{engine::general_purpose, Engine as _};
use std::fmt;

/// MIME tag used for HEIC/HEIF bytes shown without transcoding.
pub const HEIC_FALLBACK_MIME: &str = "image/heic";

/// Where the presentation layer gets a page's bytes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaSource {
    /// Self-contained `data:<mime>;base64,<payload>` URI
    DataUri(String),
    /// Revocable `blob:` URL registered in a [`BlobStore`]
    Blob(String),
}

impl MediaSource {
    pub fn uri(&self) -> &str {
        match self {
            MediaSource::DataUri(uri) | MediaSource::Blob(uri) => uri,
        }
    }

    pub fn is_blob(&self) -> bool {
        matches!(self, MediaSource::Blob(_))
    }

    /// The decoded bytes behind this source, without any URI envelope.
    pub fn payload(&self, blobs: Option<&BlobStore>) -> Result<Vec<u8>, ComicError> {
        match self {
            MediaSource::DataUri(uri) => decode_data_uri(uri)
                .map(|(_, bytes)| bytes)
                .ok_or_else(|| ComicError::PageUnavailable("malformed data URI".to_string())),
            MediaSource::Blob(url) => blobs
                .and_then(|store| store.resolve(url))
                .map(|blob| blob.bytes.to_vec())
                .ok_or_else(|| ComicError::PageUnavailable(format!("blob {} was revoked", url))),
        }
    }
}

/// A recoverable shortcut taken while building a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Degradation {
    /// HEIC shown as-is because no transcoder is installed
    TranscodeUnavailable,
    /// HEIC shown as-is because transcoding failed
    TranscodeFailed(String),
    /// Video inlined as a data URI because no blob store is available
    InlineVideo,
}

impl fmt::Display for Degradation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Degradation::TranscodeUnavailable => f.write_str("transcoder unavailable"),
            Degradation::TranscodeFailed(reason) => write!(f, "transcoding failed: {}", reason),
            Degradation::InlineVideo => f.write_str("video inlined as data URI"),
        }
    }
}

/// One renderable page.
#[derive(Debug, Clone)]
pub struct Page {
    /// 1-based position in the collection
    pub number: usize,
    /// Normalized entry path
    pub entry_path: String,
    pub kind: MediaKind,
    pub mime: String,
    pub source: MediaSource,
    /// Same as `source` for images; a placeholder graphic for videos
    pub thumbnail: MediaSource,
    pub degradation: Option<Degradation>,
}

impl Page {
    pub fn summary(&self) -> PageSummary {
        PageSummary {
            number: self.number,
            entry_path: self.entry_path.clone(),
            kind: self.kind,
            mime: self.mime.clone(),
            blob: self.source.is_blob(),
            degradation: self.degradation.as_ref().map(|d| d.to_string()),
        }
    }
}

/// Builds pages from entries using the configured options and capabilities.
pub struct Materializer<'a> {
    options: &'a LoadOptions,
    capabilities: &'a Capabilities,
}

impl<'a> Materializer<'a> {
    pub fn new(options: &'a LoadOptions, capabilities: &'a Capabilities) -> Self {
        Self {
            options,
            capabilities,
        }
    }

    /// Build the page for `entry` at 1-based `position`.
    ///
    /// Returns `Ok(None)` for entries that are not media. Read failures and
    /// oversized entries are reported as [`ComicError::EntryMaterialize`].
    pub fn materialize(
        &self,
        entry: &ArchiveEntry,
        position: usize,
    ) -> Result<Option<Page>, ComicError> {
        let kind = match media_kind(entry) {
            Some(kind) => kind,
            None => return Ok(None),
        };

        let entry_path = normalize_path(entry.path());
        let ext = extension(entry);

        if let (Some(size), Some(limit)) = (entry.size(), self.options.max_entry_bytes) {
            if size > limit {
                return Err(ComicError::EntryMaterialize {
                    path: entry_path,
                    message: format!("entry is {} bytes, limit is {}", size, limit),
                });
            }
        }

        let bytes = entry.read_bytes().map_err(|e| ComicError::EntryMaterialize {
            path: entry_path.clone(),
            message: e.to_string(),
        })?;

        let page = match kind {
            MediaKind::Image => self.image_page(entry_path, &ext, bytes, position),
            MediaKind::Video => self.video_page(entry_path, &ext, bytes, position),
        };
        Ok(Some(page))
    }

    fn image_page(&self, entry_path: String, ext: &str, bytes: Vec<u8>, position: usize) -> Page {
        let (mime, bytes, degradation) = if is_heif_extension(ext) {
            self.transcode_heif(&entry_path, bytes)
        } else {
            (mime_for(MediaKind::Image, ext), bytes, None)
        };

        let source = MediaSource::DataUri(data_uri(&mime, &bytes));
        Page {
            number: position,
            entry_path,
            kind: MediaKind::Image,
            mime,
            thumbnail: source.clone(),
            source,
            degradation,
        }
    }

    fn transcode_heif(
        &self,
        entry_path: &str,
        bytes: Vec<u8>,
    ) -> (String, Vec<u8>, Option<Degradation>) {
        let transcoder = match self.capabilities.transcoder() {
            Some(transcoder) => transcoder,
            None => {
                tracing::warn!("No transcoder for {}, keeping HEIC bytes", entry_path);
                return (
                    HEIC_FALLBACK_MIME.to_string(),
                    bytes,
                    Some(Degradation::TranscodeUnavailable),
                );
            }
        };

        match transcoder.transcode(&bytes, TargetFormat::Jpeg, self.options.quality_fraction()) {
            Ok(jpeg) => (TargetFormat::Jpeg.mime().to_string(), jpeg, None),
            Err(e) => {
                tracing::warn!("Transcoding {} failed: {}", entry_path, e);
                (
                    HEIC_FALLBACK_MIME.to_string(),
                    bytes,
                    Some(Degradation::TranscodeFailed(e.to_string())),
                )
            }
        }
    }

    fn video_page(&self, entry_path: String, ext: &str, bytes: Vec<u8>, position: usize) -> Page {
        let mime = mime_for(MediaKind::Video, ext);
        let store = match self.options.video_source {
            VideoSourcePreference::Blob => self.capabilities.blob_store(),
            VideoSourcePreference::DataUri => None,
        };

        let (source, degradation) = match store {
            Some(store) => (MediaSource::Blob(store.create(bytes, &mime)), None),
            None => {
                if self.options.video_source == VideoSourcePreference::Blob {
                    tracing::warn!("No blob store, inlining video {}", entry_path);
                }
                (
                    MediaSource::DataUri(data_uri(&mime, &bytes)),
                    Some(Degradation::InlineVideo),
                )
            }
        };

        Page {
            number: position,
            entry_path,
            kind: MediaKind::Video,
            mime,
            source,
            thumbnail: MediaSource::DataUri(data_uri(
                "image/svg+xml",
                video_placeholder_svg(position).as_bytes(),
            )),
            degradation,
        }
    }
}

/// MIME type for a dot-inclusive lowercase extension.
pub fn mime_for(kind: MediaKind, ext: &str) -> String {
    let bare = ext.trim_start_matches('.');
    match kind {
        MediaKind::Image => match bare {
            "jpg" | "jpeg" => "image/jpeg".to_string(),
            other => format!("image/{}", other),
        },
        MediaKind::Video => match bare {
            "mp4" | "m4v" => "video/mp4".to_string(),
            "webm" => "video/webm".to_string(),
            "mov" => "video/quicktime".to_string(),
            "ogv" => "video/ogg".to_string(),
            other => format!("video/{}", other),
        },
    }
}

pub fn data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, general_purpose::STANDARD.encode(bytes))
}

/// Split a base64 data URI into its MIME type and decoded bytes.
pub fn decode_data_uri(uri: &str) -> Option<(String, Vec<u8>)> {
    let rest = uri.strip_prefix("data:")?;
    let (header, payload) = rest.split_once(',')?;
    let mime = header.strip_suffix(";base64")?;
    let bytes = general_purpose::STANDARD.decode(payload).ok()?;
    Some((mime.to_string(), bytes))
}

/// Static play-button card labelled with the page number.
pub fn video_placeholder_svg(number: usize) -> String {
    format!(
        concat!(
            r##"<svg xmlns="http://www.w3.org/2000/svg" width="150" height="200" viewBox="0 0 150 200">"##,
            r##"<rect width="150" height="200" fill="#1f1f1f"/>"##,
            r##"<circle cx="75" cy="90" r="30" fill="#3a3a3a"/>"##,
            r##"<polygon points="65,75 65,105 92,90" fill="#ffffff"/>"##,
            r##"<text x="75" y="165" font-family="sans-serif" font-size="18" fill="#cccccc" text-anchor="middle">{}</text>"##,
            "</svg>"
        ),
        number
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TranscodeError;
    use crate::transcode::Transcoder;
    use std::sync::Arc;

    #[derive(Debug)]
    struct FixedTranscoder;

    impl Transcoder for FixedTranscoder {
        fn transcode(&self, _: &[u8], _: TargetFormat, _: f32) -> Result<Vec<u8>, TranscodeError> {
            Ok(b"jpeg-bytes".to_vec())
        }
    }

    #[derive(Debug)]
    struct BrokenTranscoder;

    impl Transcoder for BrokenTranscoder {
        fn transcode(&self, _: &[u8], _: TargetFormat, _: f32) -> Result<Vec<u8>, TranscodeError> {
            Err(TranscodeError::Failed("corrupt heif".to_string()))
        }
    }

    fn image(path: &str, bytes: &[u8]) -> ArchiveEntry {
        ArchiveEntry::in_memory(path, false, bytes.to_vec())
    }

    #[test]
    fn test_mime_mapping() {
        assert_eq!(mime_for(MediaKind::Image, ".jpg"), "image/jpeg");
        assert_eq!(mime_for(MediaKind::Image, ".jpeg"), "image/jpeg");
        assert_eq!(mime_for(MediaKind::Image, ".webp"), "image/webp");
        assert_eq!(mime_for(MediaKind::Video, ".m4v"), "video/mp4");
        assert_eq!(mime_for(MediaKind::Video, ".mov"), "video/quicktime");
        assert_eq!(mime_for(MediaKind::Video, ".ogv"), "video/ogg");
        assert_eq!(mime_for(MediaKind::Video, ".mkv"), "video/mkv");
    }

    #[test]
    fn test_data_uri_roundtrip_strips_envelope() {
        let uri = data_uri("image/png", b"\x89PNG");
        assert!(uri.starts_with("data:image/png;base64,"));
        let (mime, bytes) = decode_data_uri(&uri).unwrap();
        assert_eq!(mime, "image/png");
        assert_eq!(bytes, b"\x89PNG");
        assert!(decode_data_uri("blob:cbx/123").is_none());
    }

    #[test]
    fn test_image_page_uses_same_source_for_thumbnail() {
        let options = LoadOptions::default();
        let caps = Capabilities::none();
        let page = Materializer::new(&options, &caps)
            .materialize(&image("./pages\\01.JPG", b"abc"), 1)
            .unwrap()
            .unwrap();

        assert_eq!(page.entry_path, "pages/01.JPG");
        assert_eq!(page.mime, "image/jpeg");
        assert_eq!(page.source, page.thumbnail);
        assert_eq!(page.source.payload(None).unwrap(), b"abc");
        assert!(page.degradation.is_none());
    }

    #[test]
    fn test_non_media_entry_yields_none() {
        let options = LoadOptions::default();
        let caps = Capabilities::none();
        let materializer = Materializer::new(&options, &caps);
        assert!(materializer.materialize(&image("notes.txt", b"x"), 1).unwrap().is_none());
        assert!(materializer
            .materialize(&image("__MACOSX/._01.jpg", b"x"), 1)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_heic_without_transcoder_falls_back() {
        let options = LoadOptions::default();
        let caps = Capabilities::none();
        let page = Materializer::new(&options, &caps)
            .materialize(&image("cover.heic", b"heic-data"), 1)
            .unwrap()
            .unwrap();

        assert_eq!(page.mime, HEIC_FALLBACK_MIME);
        assert_eq!(page.degradation, Some(Degradation::TranscodeUnavailable));
        assert_eq!(page.source.payload(None).unwrap(), b"heic-data");
    }

    #[test]
    fn test_heic_with_transcoder() {
        let options = LoadOptions::default();
        let caps = Capabilities::none().with_transcoder(Arc::new(FixedTranscoder));
        let page = Materializer::new(&options, &caps)
            .materialize(&image("cover.HEIF", b"heic-data"), 1)
            .unwrap()
            .unwrap();

        assert_eq!(page.mime, "image/jpeg");
        assert_eq!(page.source.payload(None).unwrap(), b"jpeg-bytes");
        assert!(page.degradation.is_none());
    }

    #[test]
    fn test_heic_transcode_failure_is_recoverable() {
        let options = LoadOptions::default();
        let caps = Capabilities::none().with_transcoder(Arc::new(BrokenTranscoder));
        let page = Materializer::new(&options, &caps)
            .materialize(&image("cover.heic", b"heic-data"), 1)
            .unwrap()
            .unwrap();

        assert_eq!(page.mime, HEIC_FALLBACK_MIME);
        assert!(matches!(page.degradation, Some(Degradation::TranscodeFailed(_))));
    }

    #[test]
    fn test_video_prefers_blob_handle() {
        let options = LoadOptions::default();
        let store = Arc::new(BlobStore::new());
        let caps = Capabilities::none().with_blob_store(Arc::clone(&store));
        let page = Materializer::new(&options, &caps)
            .materialize(&image("clip.webm", b"video"), 3)
            .unwrap()
            .unwrap();

        assert_eq!(page.kind, MediaKind::Video);
        assert_eq!(page.mime, "video/webm");
        assert!(page.source.is_blob());
        assert_eq!(store.len(), 1);
        assert_eq!(page.source.payload(Some(store.as_ref())).unwrap(), b"video");

        let (mime, svg) = decode_data_uri(page.thumbnail.uri()).unwrap();
        assert_eq!(mime, "image/svg+xml");
        assert!(String::from_utf8(svg).unwrap().contains(">3</text>"));
    }

    #[test]
    fn test_video_without_blob_store_is_inlined() {
        let options = LoadOptions::default();
        let caps = Capabilities::none();
        let page = Materializer::new(&options, &caps)
            .materialize(&image("clip.mp4", b"video"), 1)
            .unwrap()
            .unwrap();

        assert!(!page.source.is_blob());
        assert!(page.source.uri().starts_with("data:video/mp4;base64,"));
        assert_eq!(page.degradation, Some(Degradation::InlineVideo));
    }

    #[test]
    fn test_oversized_entry_is_rejected() {
        let mut options = LoadOptions::default();
        options.max_entry_bytes = Some(2);
        let caps = Capabilities::none();
        let result = Materializer::new(&options, &caps).materialize(&image("big.png", b"abc"), 1);
        assert!(matches!(result, Err(ComicError::EntryMaterialize { .. })));
    }
}
