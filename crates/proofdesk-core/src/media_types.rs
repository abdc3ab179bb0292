// crates/proofdesk-core/src/media_types.rs
//
// Media items as stored on the record, and the types that flow across the
// channel between proofdesk-media and proofdesk-ui.
// No egui, no ffmpeg, just plain data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::annotation::Annotation;

const IMAGE_EXTS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];
const VIDEO_EXTS: &[&str] = &["mp4", "mov", "avi", "webm", "mkv"];
const PDF_MIME:   &str    = "application/pdf";

/// What a media item can be previewed as.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    #[serde(rename = "pdf")]
    Document,
    /// Arbitrary attachment; stays in the master list but is never shown in
    /// the thumbnail strip.
    Other,
}

impl MediaKind {
    pub fn is_viewable(self) -> bool {
        !matches!(self, MediaKind::Other)
    }

    pub fn label(self) -> &'static str {
        match self {
            MediaKind::Image    => "image",
            MediaKind::Video    => "video",
            MediaKind::Document => "pdf",
            MediaKind::Other    => "file",
        }
    }
}

/// Uploaded file metadata as written to the record's `media_files` array.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaObject {
    pub url:  String,
    #[serde(default)]
    pub name: String,
    /// MIME type.
    #[serde(rename = "type", default)]
    pub mime: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploaded_at:   Option<DateTime<Utc>>,
    /// Poster frame (video) or first-page render (converted document).
    /// Either a storage URL or a `data:` URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail:     Option<String>,
    /// Set on documents that were converted to an image before upload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_type: Option<String>,
}

/// One entry of a record's media list.
///
/// Older records stored bare URL strings; newer ones store full objects. The
/// two shapes are normalised through the accessors below, so callers never
/// match on the variant just to read a URL.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MediaItem {
    Url(String),
    Object(MediaObject),
}

impl MediaItem {
    pub fn url(&self) -> &str {
        match self {
            MediaItem::Url(u)    => u,
            MediaItem::Object(o) => &o.url,
        }
    }

    /// Display name. Bare URLs fall back to their last path segment.
    pub fn name(&self) -> &str {
        match self {
            MediaItem::Object(o) if !o.name.is_empty() => &o.name,
            _ => file_name_of(self.url()),
        }
    }

    pub fn mime(&self) -> Option<&str> {
        match self {
            MediaItem::Object(o) if !o.mime.is_empty() => Some(&o.mime),
            _ => None,
        }
    }

    pub fn thumbnail(&self) -> Option<&str> {
        match self {
            MediaItem::Object(o) => o.thumbnail.as_deref(),
            MediaItem::Url(_)    => None,
        }
    }

    pub fn size(&self) -> Option<u64> {
        match self {
            MediaItem::Object(o) => Some(o.size),
            MediaItem::Url(_)    => None,
        }
    }

    /// Classify by MIME type first, then by the extension of the name and
    /// finally of the URL. A converted document counts as an image.
    ///
    /// ```
    /// use proofdesk_core::media_types::{MediaItem, MediaKind};
    /// let item = MediaItem::Url("https://cdn/x/clip.MP4?token=1".into());
    /// assert_eq!(item.kind(), MediaKind::Video);
    /// assert_eq!(MediaItem::Url("brief.zip".into()).kind(), MediaKind::Other);
    /// ```
    pub fn kind(&self) -> MediaKind {
        match self {
            MediaItem::Url(u) => kind_from_extension(u),
            MediaItem::Object(o) => {
                let converted = o.original_type.as_deref() == Some(PDF_MIME);
                if o.mime.starts_with("image/") || (converted && !o.mime.starts_with("video/")) {
                    MediaKind::Image
                } else if o.mime.starts_with("video/") {
                    MediaKind::Video
                } else if o.mime == PDF_MIME {
                    MediaKind::Document
                } else {
                    match kind_from_extension(&o.name) {
                        MediaKind::Other => kind_from_extension(&o.url),
                        k                => k,
                    }
                }
            }
        }
    }

    pub fn is_viewable(&self) -> bool {
        self.kind().is_viewable()
    }
}

impl From<MediaObject> for MediaItem {
    fn from(o: MediaObject) -> Self {
        MediaItem::Object(o)
    }
}

/// Lowercased extension of a URL or file name, ignoring any query string or
/// fragment.
pub fn extension_of(s: &str) -> Option<String> {
    let path = s.split(['?', '#']).next().unwrap_or(s);
    let last = file_name_of(path);
    let (stem, ext) = last.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

pub fn kind_from_extension(s: &str) -> MediaKind {
    match extension_of(s).as_deref() {
        Some(e) if IMAGE_EXTS.contains(&e) => MediaKind::Image,
        Some(e) if VIDEO_EXTS.contains(&e) => MediaKind::Video,
        Some("pdf")                        => MediaKind::Document,
        _                                  => MediaKind::Other,
    }
}

fn file_name_of(s: &str) -> &str {
    let path = s.split(['?', '#']).next().unwrap_or(s);
    path.rsplit('/').next().unwrap_or(path)
}

/// Results sent from the MediaWorker background threads to the UI.
///
/// Every variant carries the record it belongs to. The UI drops results for
/// a record that is no longer open instead of writing into a closed view.
#[derive(Debug)]
pub enum MediaResult {
    /// One file of a batch finished uploading. `poster_failed` is set when
    /// the item is a video whose poster could not be produced.
    Uploaded       { record_id: String, item: MediaItem, poster_failed: bool },
    UploadRejected { record_id: String, name: String, msg: String },
    BatchDone      { record_id: String, uploaded: usize, failed: usize },
    RecordLoaded   { record_id: String, media: Vec<MediaItem>, annotations: Vec<Annotation> },
    LoadFailed     { record_id: String, msg: String },
    PersistFailed  { record_id: String, what: &'static str, msg: String },
}

impl MediaResult {
    pub fn record_id(&self) -> &str {
        match self {
            MediaResult::Uploaded       { record_id, .. }
            | MediaResult::UploadRejected { record_id, .. }
            | MediaResult::BatchDone      { record_id, .. }
            | MediaResult::RecordLoaded   { record_id, .. }
            | MediaResult::LoadFailed     { record_id, .. }
            | MediaResult::PersistFailed  { record_id, .. } => record_id,
        }
    }
}
