// crates/proofdesk-media/src/remote.rs
//
// HTTP client for the record table and the object storage bucket.
//
// The worker only sees the RecordStore and ObjectStorage traits; HttpBackend
// is the production implementation talking to a PostgREST-style row API and
// a storage API under the same base URL. All calls are blocking and run on
// worker threads, never on the UI thread.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

use proofdesk_core::annotation::Annotation;
use proofdesk_core::media_types::MediaItem;
use proofdesk_core::upload::public_url;

pub const DEFAULT_BUCKET: &str = "media-files";
pub const DEFAULT_TABLE:  &str = "design_tasks";

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("request failed: {0}")]
    Transport(String),

    #[error("unexpected response body: {0}")]
    Json(#[from] serde_json::Error),

    #[error("backend not configured: {0}")]
    Config(&'static str),
}

impl From<ureq::Error> for RemoteError {
    fn from(e: ureq::Error) -> Self {
        match e {
            ureq::Error::Status(status, resp) => RemoteError::Http {
                status,
                body: resp.into_string().unwrap_or_default(),
            },
            ureq::Error::Transport(t) => RemoteError::Transport(t.to_string()),
        }
    }
}

impl From<std::io::Error> for RemoteError {
    fn from(e: std::io::Error) -> Self {
        RemoteError::Transport(e.to_string())
    }
}

// ── Collaborator traits ───────────────────────────────────────────────────────

/// Row-level access to a record's media list and annotations.
pub trait RecordStore: Send + Sync {
    fn load_record(&self, record_id: &str) -> Result<(Vec<MediaItem>, Vec<Annotation>), RemoteError>;
    fn update_media_files(&self, record_id: &str, media: &[MediaItem]) -> Result<(), RemoteError>;
    fn update_annotations(&self, record_id: &str, annotations: &[Annotation]) -> Result<(), RemoteError>;
}

/// Blob storage keyed by object path.
pub trait ObjectStorage: Send + Sync {
    /// Store `bytes` at `path` and return the object's public URL.
    fn upload(&self, path: &str, bytes: &[u8], content_type: &str) -> Result<String, RemoteError>;
    /// Delete objects by path. Missing objects are not an error.
    fn remove(&self, paths: &[String]) -> Result<(), RemoteError>;
    /// Bucket the public URLs point into.
    fn bucket(&self) -> &str;
}

// ── Config ────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub api_url: String,
    pub api_key: String,
    pub bucket:  String,
    pub table:   String,
    /// Per-request timeout, seconds.
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            api_url:      String::new(),
            api_key:      String::new(),
            bucket:       DEFAULT_BUCKET.to_string(),
            table:        DEFAULT_TABLE.to_string(),
            timeout_secs: 30,
        }
    }
}

impl RemoteConfig {
    pub fn is_configured(&self) -> bool {
        !self.api_url.trim().is_empty() && !self.api_key.trim().is_empty()
    }

    fn base(&self) -> &str {
        self.api_url.trim_end_matches('/')
    }

    pub fn record_url(&self, record_id: &str) -> String {
        format!("{}/rest/v1/{}?id=eq.{}", self.base(), self.table, urlencoding::encode(record_id))
    }

    pub fn record_select_url(&self, record_id: &str) -> String {
        format!("{}&select=media_files,annotations", self.record_url(record_id))
    }

    pub fn object_url(&self, path: &str) -> String {
        let encoded: Vec<_> = path.split('/').map(urlencoding::encode).collect();
        format!("{}/storage/v1/object/{}/{}", self.base(), self.bucket, encoded.join("/"))
    }

    pub fn bucket_url(&self) -> String {
        format!("{}/storage/v1/object/{}", self.base(), self.bucket)
    }

    pub fn public_url(&self, path: &str) -> String {
        public_url(&self.api_url, &self.bucket, path)
    }
}

// ── HttpBackend ───────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct RecordRow {
    #[serde(default)]
    media_files: Option<Vec<MediaItem>>,
    #[serde(default)]
    annotations: Option<Vec<Annotation>>,
}

pub struct HttpBackend {
    cfg:   RemoteConfig,
    agent: ureq::Agent,
}

impl HttpBackend {
    pub fn new(cfg: RemoteConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(10))
            .timeout(Duration::from_secs(cfg.timeout_secs.max(1)))
            .build();
        Self { cfg, agent }
    }

    pub fn config(&self) -> &RemoteConfig {
        &self.cfg
    }

    fn check(&self) -> Result<(), RemoteError> {
        if self.cfg.is_configured() {
            Ok(())
        } else {
            Err(RemoteError::Config("api_url and api_key must be set"))
        }
    }

    fn authed(&self, method: &str, url: &str) -> ureq::Request {
        self.agent
            .request(method, url)
            .set("apikey", &self.cfg.api_key)
            .set("Authorization", &format!("Bearer {}", self.cfg.api_key))
    }

    fn patch_column(&self, record_id: &str, body: serde_json::Value) -> Result<(), RemoteError> {
        self.check()?;
        self.authed("PATCH", &self.cfg.record_url(record_id))
            .set("Prefer", "return=minimal")
            .send_json(body)?;
        Ok(())
    }
}

impl RecordStore for HttpBackend {
    fn load_record(&self, record_id: &str) -> Result<(Vec<MediaItem>, Vec<Annotation>), RemoteError> {
        self.check()?;
        let body = self.authed("GET", &self.cfg.record_select_url(record_id))
            .set("Accept", "application/json")
            .call()?
            .into_string()?;
        let rows: Vec<RecordRow> = serde_json::from_str(&body)?;
        let Some(row) = rows.into_iter().next() else {
            return Err(RemoteError::Http { status: 404, body: format!("no record {record_id}") });
        };
        Ok((row.media_files.unwrap_or_default(), row.annotations.unwrap_or_default()))
    }

    fn update_media_files(&self, record_id: &str, media: &[MediaItem]) -> Result<(), RemoteError> {
        self.patch_column(record_id, json!({ "media_files": media }))
    }

    fn update_annotations(&self, record_id: &str, annotations: &[Annotation]) -> Result<(), RemoteError> {
        self.patch_column(record_id, json!({ "annotations": annotations }))
    }
}

impl ObjectStorage for HttpBackend {
    fn upload(&self, path: &str, bytes: &[u8], content_type: &str) -> Result<String, RemoteError> {
        self.check()?;
        self.authed("POST", &self.cfg.object_url(path))
            .set("Content-Type", content_type)
            .set("Cache-Control", "max-age=3600")
            .set("x-upsert", "false")
            .send_bytes(bytes)?;
        Ok(self.cfg.public_url(path))
    }

    fn remove(&self, paths: &[String]) -> Result<(), RemoteError> {
        if paths.is_empty() {
            return Ok(());
        }
        self.check()?;
        self.authed("DELETE", &self.cfg.bucket_url())
            .send_json(json!({ "prefixes": paths }))?;
        Ok(())
    }

    fn bucket(&self) -> &str {
        &self.cfg.bucket
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> RemoteConfig {
        RemoteConfig {
            api_url: "https://db.example.com/".into(),
            api_key: "k".into(),
            ..RemoteConfig::default()
        }
    }

    #[test]
    fn record_urls() {
        let c = cfg();
        assert_eq!(c.record_url("42"), "https://db.example.com/rest/v1/design_tasks?id=eq.42");
        assert_eq!(
            c.record_select_url("a b"),
            "https://db.example.com/rest/v1/design_tasks?id=eq.a%20b&select=media_files,annotations",
        );
    }

    #[test]
    fn object_urls_keep_slashes() {
        let c = cfg();
        assert_eq!(
            c.object_url("t1/clip one.mp4"),
            "https://db.example.com/storage/v1/object/media-files/t1/clip%20one.mp4",
        );
        assert_eq!(c.bucket_url(), "https://db.example.com/storage/v1/object/media-files");
        assert_eq!(
            c.public_url("t1/x.png"),
            "https://db.example.com/storage/v1/object/public/media-files/t1/x.png",
        );
    }

    #[test]
    fn reserved_characters_are_escaped() {
        let c = cfg();
        assert_eq!(
            c.record_url("a&b=c"),
            "https://db.example.com/rest/v1/design_tasks?id=eq.a%26b%3Dc",
        );
        assert_eq!(
            c.object_url("t1/ü#1.png"),
            "https://db.example.com/storage/v1/object/media-files/t1/%C3%BC%231.png",
        );
    }

    #[test]
    fn unconfigured_backend_refuses_before_network() {
        let backend = HttpBackend::new(RemoteConfig::default());
        assert!(!backend.config().is_configured());
        assert!(matches!(backend.load_record("1"), Err(RemoteError::Config(_))));
        assert!(matches!(backend.upload("a/b.png", b"x", "image/png"), Err(RemoteError::Config(_))));
        // Nothing to delete short-circuits even when unconfigured.
        assert!(backend.remove(&[]).is_ok());
    }

    #[test]
    fn record_row_accepts_nulls_and_legacy_urls() {
        let rows: Vec<RecordRow> = serde_json::from_str(
            r#"[{"media_files":["https://x/a.png",{"url":"https://x/b.mp4","name":"b.mp4","type":"video/mp4","size":3}],"annotations":null}]"#,
        ).unwrap();
        let media = rows[0].media_files.clone().unwrap();
        assert_eq!(media.len(), 2);
        assert_eq!(media[0].url(), "https://x/a.png");
        assert_eq!(media[1].name(), "b.mp4");
        assert!(rows[0].annotations.is_none());
    }

    #[test]
    fn config_defaults_fill_missing_fields() {
        let c: RemoteConfig = serde_json::from_str(r#"{"api_url":"https://h"}"#).unwrap();
        assert_eq!(c.bucket, DEFAULT_BUCKET);
        assert_eq!(c.table, DEFAULT_TABLE);
        assert!(!c.is_configured());
    }
}
