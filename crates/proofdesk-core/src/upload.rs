// crates/proofdesk-core/src/upload.rs
//
// Upload rules that run before any network call: size ceiling, MIME
// inference and the storage key layout.

use uuid::Uuid;

use crate::error::UploadError;
use crate::media_types::extension_of;

/// Client-side ceiling for a single file.
pub const MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

/// Path segment between the API base and the object path in public URLs.
pub const PUBLIC_OBJECT_PREFIX: &str = "/storage/v1/object/public/";

pub fn validate_upload(name: &str, size: u64, limit: u64) -> Result<(), UploadError> {
    if size == 0 {
        return Err(UploadError::Empty { name: name.to_string() });
    }
    if size > limit {
        return Err(UploadError::TooLarge { name: name.to_string(), size, limit });
    }
    Ok(())
}

/// MIME type from the file name. Unknown extensions map to
/// `application/octet-stream`.
pub fn mime_for_name(name: &str) -> &'static str {
    match extension_of(name).as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png")                => "image/png",
        Some("gif")                => "image/gif",
        Some("webp")               => "image/webp",
        Some("mp4")                => "video/mp4",
        Some("mov")                => "video/quicktime",
        Some("avi")                => "video/x-msvideo",
        Some("webm")               => "video/webm",
        Some("mkv")                => "video/x-matroska",
        Some("pdf")                => "application/pdf",
        Some("zip")                => "application/zip",
        Some("txt")                => "text/plain",
        _                          => "application/octet-stream",
    }
}

/// Storage key for one upload: `{record}/{uuid}.{ext}`, with the poster
/// frame stored next to it as `{record}/{uuid}_thumbnail.{ext}`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageKey {
    record_id: String,
    stem:      Uuid,
    ext:       Option<String>,
}

impl StorageKey {
    pub fn new(record_id: &str, file_name: &str) -> Self {
        Self::with_id(record_id, file_name, Uuid::new_v4())
    }

    pub fn with_id(record_id: &str, file_name: &str, stem: Uuid) -> Self {
        Self {
            record_id: record_id.to_string(),
            stem,
            ext:       extension_of(file_name),
        }
    }

    pub fn object_path(&self) -> String {
        match &self.ext {
            Some(ext) => format!("{}/{}.{ext}", self.record_id, self.stem),
            None      => format!("{}/{}", self.record_id, self.stem),
        }
    }

    pub fn thumbnail_path(&self, ext: &str) -> String {
        format!("{}/{}_thumbnail.{ext}", self.record_id, self.stem)
    }
}

/// Public URL for an object path.
///
/// ```
/// use proofdesk_core::upload::public_url;
/// assert_eq!(
///     public_url("https://api.example.com/", "media-files", "t1/a.png"),
///     "https://api.example.com/storage/v1/object/public/media-files/t1/a.png",
/// );
/// ```
pub fn public_url(api_url: &str, bucket: &str, path: &str) -> String {
    format!("{}{PUBLIC_OBJECT_PREFIX}{bucket}/{path}", api_url.trim_end_matches('/'))
}

/// Recover the object path from a public URL in `bucket`. `None` for URLs
/// that do not point into the bucket (external links, data URLs).
pub fn storage_path_from_public_url(url: &str, bucket: &str) -> Option<String> {
    let marker = format!("{PUBLIC_OBJECT_PREFIX}{bucket}/");
    let (_, rest) = url.split_once(&marker)?;
    let path = rest.split(['?', '#']).next().unwrap_or(rest);
    (!path.is_empty()).then(|| path.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn size_limit_is_inclusive() {
        assert!(validate_upload("a.mp4", MAX_UPLOAD_BYTES, MAX_UPLOAD_BYTES).is_ok());
        let err = validate_upload("big.mov", MAX_UPLOAD_BYTES + 1, MAX_UPLOAD_BYTES).unwrap_err();
        assert!(err.to_string().starts_with("File big.mov exceeds size limit"));
        assert_eq!(validate_upload("e.png", 0, 10), Err(UploadError::Empty { name: "e.png".into() }));
    }

    #[test]
    fn mime_lookup() {
        assert_eq!(mime_for_name("Clip.MOV"), "video/quicktime");
        assert_eq!(mime_for_name("photo.jpeg"), "image/jpeg");
        assert_eq!(mime_for_name("README"), "application/octet-stream");
    }

    #[test]
    fn storage_keys_share_stem() {
        let id  = Uuid::from_str("6f9619ff-8b86-d011-b42d-00c04fc964ff").unwrap();
        let key = StorageKey::with_id("task-9", "Cut v2.MP4", id);
        assert_eq!(key.object_path(), "task-9/6f9619ff-8b86-d011-b42d-00c04fc964ff.mp4");
        assert_eq!(key.thumbnail_path("webp"), "task-9/6f9619ff-8b86-d011-b42d-00c04fc964ff_thumbnail.webp");
        assert_eq!(StorageKey::with_id("t", "noext", id).object_path(), format!("t/{id}"));
    }

    #[test]
    fn public_url_round_trip() {
        let url = public_url("https://x.io", "media-files", "t/a.png");
        assert_eq!(storage_path_from_public_url(&url, "media-files").as_deref(), Some("t/a.png"));
        assert_eq!(storage_path_from_public_url(&url, "other"), None);
        assert_eq!(storage_path_from_public_url("data:image/jpeg;base64,AAA", "media-files"), None);
    }
}
