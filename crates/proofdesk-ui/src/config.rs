// crates/proofdesk-ui/src/config.rs
//
// AppConfig: backend location, the record to open, and upload tuning.
// Read once at startup from paths::config_file(), then overridden field by
// field from PROOFDESK_* environment variables. A missing file means
// defaults; a malformed one is logged and also means defaults.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use proofdesk_core::upload::MAX_UPLOAD_BYTES;
use proofdesk_media::remote::{RemoteConfig, DEFAULT_BUCKET, DEFAULT_TABLE};
use proofdesk_media::thumbnail::{SamplerConfig, POSTER_MAX_EDGE, POSTER_TIMEOUT};
use proofdesk_media::worker::WorkerSettings;

/// Shortest poster timeout accepted from config; the longest is POSTER_TIMEOUT.
const MIN_POSTER_TIMEOUT_SECS: u64 = 10;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api_url:                String,
    pub api_key:                String,
    pub bucket:                 String,
    pub table:                  String,
    /// Record opened at launch. Empty shows the record picker.
    pub record_id:              String,
    pub max_upload_bytes:       u64,
    pub thumbnail_timeout_secs: u64,
    pub thumbnail_max_edge:     u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url:                String::new(),
            api_key:                String::new(),
            bucket:                 DEFAULT_BUCKET.to_string(),
            table:                  DEFAULT_TABLE.to_string(),
            record_id:              String::new(),
            max_upload_bytes:       MAX_UPLOAD_BYTES,
            thumbnail_timeout_secs: POSTER_TIMEOUT.as_secs(),
            thumbnail_max_edge:     POSTER_MAX_EDGE,
        }
    }
}

impl AppConfig {
    pub fn load() -> Self {
        let path = crate::paths::config_file();
        let mut cfg = match Self::from_file(&path) {
            Ok(Some(cfg)) => {
                tracing::info!("[config] loaded {}", path.display());
                cfg
            }
            Ok(None) => Self::default(),
            Err(e) => {
                tracing::warn!("[config] {e:#}; using defaults");
                Self::default()
            }
        };
        cfg.apply_env(|k| std::env::var(k).ok());
        cfg
    }

    /// `Ok(None)` when the file does not exist.
    pub fn from_file(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let cfg = serde_json::from_str(&text)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(Some(cfg))
    }

    /// Override fields from the environment. `lookup` is `std::env::var` in
    /// production; empty values are ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |k: &str| lookup(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        if let Some(v) = get("PROOFDESK_API_URL") { self.api_url   = v; }
        if let Some(v) = get("PROOFDESK_API_KEY") { self.api_key   = v; }
        if let Some(v) = get("PROOFDESK_BUCKET")  { self.bucket    = v; }
        if let Some(v) = get("PROOFDESK_TABLE")   { self.table     = v; }
        if let Some(v) = get("PROOFDESK_RECORD")  { self.record_id = v; }
    }

    pub fn remote(&self) -> RemoteConfig {
        RemoteConfig {
            api_url: self.api_url.clone(),
            api_key: self.api_key.clone(),
            bucket:  self.bucket.clone(),
            table:   self.table.clone(),
            ..RemoteConfig::default()
        }
    }

    pub fn worker_settings(&self) -> WorkerSettings {
        WorkerSettings {
            max_upload_bytes: self.max_upload_bytes,
            sampler: SamplerConfig {
                timeout:  Duration::from_secs(
                    self.thumbnail_timeout_secs.clamp(MIN_POSTER_TIMEOUT_SECS, POSTER_TIMEOUT.as_secs()),
                ),
                max_edge: self.thumbnail_max_edge.max(1),
                ..SamplerConfig::default()
            },
            ..WorkerSettings::default()
        }
    }
}
