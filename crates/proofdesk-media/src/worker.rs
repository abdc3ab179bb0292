// crates/proofdesk-media/src/worker.rs
//
// MediaWorker: owns the persistence thread and spawns upload batches.
// All public API that proofdesk-ui calls lives here.
//
// Persistence jobs (list/annotation writes, object removal, record loads) go
// through one FIFO thread so two writes for the same record can never land
// out of order. Upload batches get a thread each; inside a batch files are
// processed one after another and a failing file never stops the rest.
//
// A stored upload is appended to its record's media list by the worker
// itself, before the UI hears about it. The list write does not depend on
// that record still being open.

use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use anyhow::{Context, Result};
use chrono::Utc;
use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use parking_lot::Mutex;

use proofdesk_core::media_types::{extension_of, MediaItem, MediaKind, MediaObject, MediaResult};
use proofdesk_core::state::PersistRequest;
use proofdesk_core::upload::{mime_for_name, storage_path_from_public_url, validate_upload, StorageKey, MAX_UPLOAD_BYTES};

use crate::encode::PosterImage;
use crate::remote::{HttpBackend, ObjectStorage, RecordStore};
use crate::thumbnail::{generate_poster, generate_poster_from_bytes, SamplerConfig, ThumbnailError};

// ── Public input types ────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub enum UploadSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

/// One file picked for upload.
#[derive(Clone, Debug)]
pub struct UploadFile {
    pub name:   String,
    pub source: UploadSource,
}

impl UploadFile {
    pub fn from_path(path: PathBuf) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self { name, source: UploadSource::Path(path) }
    }

    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self { name: name.into(), source: UploadSource::Bytes(bytes) }
    }

    fn size(&self) -> Result<u64> {
        match &self.source {
            UploadSource::Path(p) => Ok(fs::metadata(p)
                .with_context(|| format!("Cannot read {}", p.display()))?
                .len()),
            UploadSource::Bytes(b) => Ok(b.len() as u64),
        }
    }

    fn read(&self) -> Result<Vec<u8>> {
        match &self.source {
            UploadSource::Path(p)  => fs::read(p).with_context(|| format!("Cannot read {}", p.display())),
            UploadSource::Bytes(b) => Ok(b.clone()),
        }
    }
}

/// Produces a poster for a video upload. Swappable so batches can be driven
/// without FFmpeg.
pub type PosterFn = Arc<dyn Fn(&UploadFile, &SamplerConfig) -> Result<PosterImage, ThumbnailError> + Send + Sync>;

fn ffmpeg_poster(file: &UploadFile, cfg: &SamplerConfig) -> Result<PosterImage, ThumbnailError> {
    match &file.source {
        UploadSource::Path(p)  => generate_poster(p, cfg),
        UploadSource::Bytes(b) => generate_poster_from_bytes(b, extension_of(&file.name).as_deref(), cfg),
    }
}

#[derive(Clone)]
pub struct WorkerSettings {
    pub max_upload_bytes: u64,
    pub sampler:          SamplerConfig,
    pub poster:           PosterFn,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            max_upload_bytes: MAX_UPLOAD_BYTES,
            sampler:          SamplerConfig::default(),
            poster:           Arc::new(ffmpeg_poster),
        }
    }
}

// ── Internal types ────────────────────────────────────────────────────────────

enum PersistJob {
    Write  { record_id: String, req: PersistRequest },
    Load   { record_id: String },
    Append { record_id: String, item: MediaItem },
    Stop,
}

// ── MediaWorker ───────────────────────────────────────────────────────────────

pub struct MediaWorker {
    /// Shared result channel: upload progress, loads, persistence failures.
    pub rx:   Receiver<MediaResult>,
    tx:       Sender<MediaResult>,
    jobs:     Sender<PersistJob>,
    storage:  Arc<dyn ObjectStorage>,
    settings: WorkerSettings,
    shutdown: Arc<AtomicBool>,
    persist_thread: Mutex<Option<JoinHandle<()>>>,
}

impl MediaWorker {
    pub fn new(backend: HttpBackend, settings: WorkerSettings) -> Self {
        let backend = Arc::new(backend);
        Self::with_backends(backend.clone(), backend, settings)
    }

    pub fn with_backends(
        store:    Arc<dyn RecordStore>,
        storage:  Arc<dyn ObjectStorage>,
        settings: WorkerSettings,
    ) -> Self {
        let (tx, rx)        = bounded(512);
        let (jobs, jobs_rx) = unbounded::<PersistJob>();

        let result_tx   = tx.clone();
        let job_storage = storage.clone();
        let handle = thread::Builder::new()
            .name("persist".into())
            .spawn(move || {
                for job in jobs_rx.iter() {
                    match job {
                        PersistJob::Stop => break,
                        PersistJob::Load { record_id } => {
                            let msg = match store.load_record(&record_id) {
                                Ok((media, annotations)) => {
                                    tracing::debug!(
                                        "[persist] loaded {record_id}: {} media, {} annotations",
                                        media.len(), annotations.len(),
                                    );
                                    MediaResult::RecordLoaded { record_id, media, annotations }
                                }
                                Err(e) => {
                                    tracing::warn!("[persist] load {record_id}: {e}");
                                    MediaResult::LoadFailed { record_id, msg: e.to_string() }
                                }
                            };
                            let _ = result_tx.send(msg);
                        }
                        PersistJob::Append { record_id, item } => {
                            if let Err(e) = append_media(&*store, &record_id, item) {
                                tracing::warn!("[persist] append for {record_id}: {e:#}");
                                let _ = result_tx.send(MediaResult::PersistFailed {
                                    record_id,
                                    what: "media_files",
                                    msg:  format!("{e:#}"),
                                });
                            }
                        }
                        PersistJob::Write { record_id, req } => {
                            let (what, res) = run_persist(&*store, &*job_storage, &record_id, &req);
                            if let Err(e) = res {
                                tracing::warn!("[persist] {what} for {record_id}: {e:#}");
                                let _ = result_tx.send(MediaResult::PersistFailed {
                                    record_id,
                                    what,
                                    msg: format!("{e:#}"),
                                });
                            }
                        }
                    }
                }
            });

        let persist_thread = match handle {
            Ok(h) => Some(h),
            Err(e) => {
                tracing::error!("[persist] could not start persistence thread: {e}");
                None
            }
        };

        Self {
            rx,
            tx,
            jobs,
            storage,
            settings,
            shutdown: Arc::new(AtomicBool::new(false)),
            persist_thread: Mutex::new(persist_thread),
        }
    }

    /// Fetch the record's media list and annotations. Answers with
    /// RecordLoaded or LoadFailed.
    pub fn load_record(&self, record_id: &str) {
        if self.jobs.send(PersistJob::Load { record_id: record_id.to_string() }).is_err() {
            tracing::warn!("[persist] worker stopped, load of {record_id} dropped");
        }
    }

    /// Queue a write-back. Failures come back as PersistFailed and are never
    /// retried.
    pub fn persist(&self, record_id: &str, req: PersistRequest) {
        if self.jobs.send(PersistJob::Write { record_id: record_id.to_string(), req }).is_err() {
            tracing::warn!("[persist] worker stopped, write for {record_id} dropped");
        }
    }

    /// Upload a batch. Each file yields Uploaded or UploadRejected; the batch
    /// ends with BatchDone. Every stored file is appended to `record_id`'s
    /// media list before its Uploaded goes out.
    pub fn upload_batch(&self, record_id: &str, files: Vec<UploadFile>) {
        let tx       = self.tx.clone();
        let jobs     = self.jobs.clone();
        let sd       = self.shutdown.clone();
        let storage  = self.storage.clone();
        let settings = self.settings.clone();
        let record   = record_id.to_string();

        let spawned = thread::Builder::new()
            .name("upload-batch".into())
            .spawn(move || {
                let (mut uploaded, mut failed) = (0, 0);
                for file in &files {
                    if sd.load(Ordering::Relaxed) { return; }
                    match upload_one(&*storage, &settings, &record, file) {
                        Ok((item, poster_failed)) => {
                            uploaded += 1;
                            let job = PersistJob::Append { record_id: record.clone(), item: item.clone() };
                            if jobs.send(job).is_err() {
                                tracing::warn!("[upload] worker stopped, {} not added to {record}", file.name);
                            }
                            let _ = tx.send(MediaResult::Uploaded {
                                record_id: record.clone(),
                                item,
                                poster_failed,
                            });
                        }
                        Err(e) => {
                            failed += 1;
                            tracing::warn!("[upload] {}: {e:#}", file.name);
                            let _ = tx.send(MediaResult::UploadRejected {
                                record_id: record.clone(),
                                name:      file.name.clone(),
                                msg:       e.to_string(),
                            });
                        }
                    }
                }
                tracing::info!("[upload] batch for {record}: {uploaded} ok, {failed} failed");
                let _ = tx.send(MediaResult::BatchDone { record_id: record, uploaded, failed });
            });

        if let Err(e) = spawned {
            tracing::error!("[upload] could not start batch thread: {e}");
        }
    }

    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
        let _ = self.jobs.send(PersistJob::Stop);
        if let Some(h) = self.persist_thread.lock().take() {
            let _ = h.join();
        }
    }
}

// ── Jobs ──────────────────────────────────────────────────────────────────────

fn run_persist(
    store:     &dyn RecordStore,
    storage:   &dyn ObjectStorage,
    record_id: &str,
    req:       &PersistRequest,
) -> (&'static str, Result<()>) {
    match req {
        PersistRequest::MediaFiles(media) => (
            "media_files",
            store.update_media_files(record_id, media).context("update media_files"),
        ),
        PersistRequest::Annotations(list) => (
            "annotations",
            store.update_annotations(record_id, list).context("update annotations"),
        ),
        PersistRequest::RemoveObjects(urls) => {
            // Only objects that live in our bucket; data: URLs and external
            // links have nothing to delete.
            let paths: Vec<String> = urls
                .iter()
                .filter_map(|u| storage_path_from_public_url(u, storage.bucket()))
                .collect();
            tracing::debug!("[persist] removing {} of {} object(s)", paths.len(), urls.len());
            ("storage", storage.remove(&paths).context("remove objects"))
        }
    }
}

/// Add a freshly stored item to the record's current media list. An item
/// already listed (same URL) is left alone.
fn append_media(store: &dyn RecordStore, record_id: &str, item: MediaItem) -> Result<()> {
    let (mut media, _) = store.load_record(record_id).context("reload media_files")?;
    if media.iter().any(|m| m.url() == item.url()) {
        return Ok(());
    }
    media.push(item);
    store.update_media_files(record_id, &media).context("update media_files")
}

/// Validate, store, and describe one file. The poster is best-effort; its
/// failure only sets the returned flag.
fn upload_one(
    storage:   &dyn ObjectStorage,
    settings:  &WorkerSettings,
    record_id: &str,
    file:      &UploadFile,
) -> Result<(MediaItem, bool)> {
    let size = file.size()?;
    validate_upload(&file.name, size, settings.max_upload_bytes)?;

    let bytes = file.read()?;
    let key   = StorageKey::new(record_id, &file.name);
    let mime  = mime_for_name(&file.name);
    let url   = storage
        .upload(&key.object_path(), &bytes, mime)
        .with_context(|| format!("Failed to upload {}", file.name))?;

    let mut object = MediaObject {
        url,
        name:          file.name.clone(),
        mime:          mime.to_string(),
        size,
        uploaded_at:   Some(Utc::now()),
        thumbnail:     None,
        original_type: None,
    };

    let mut poster_failed = false;
    if MediaItem::Object(object.clone()).kind() == MediaKind::Video {
        match (settings.poster)(file, &settings.sampler) {
            Ok(poster) => {
                let path = key.thumbnail_path(poster.codec.extension());
                object.thumbnail = Some(match storage.upload(&path, &poster.bytes, poster.codec.mime()) {
                    Ok(url) => url,
                    Err(e) => {
                        tracing::warn!("[upload] poster store for {} failed, inlining: {e}", file.name);
                        poster.to_data_url()
                    }
                });
            }
            Err(e) => {
                tracing::warn!("[upload] no poster for {}: {e}", file.name);
                poster_failed = true;
            }
        }
    }

    Ok((MediaItem::Object(object), poster_failed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use proofdesk_core::annotation::Annotation;

    use crate::encode::PosterCodec;
    use crate::remote::RemoteError;

    const BUCKET: &str = "media-files";

    #[derive(Default)]
    struct FakeBackend {
        uploads:      Mutex<Vec<(String, String)>>,
        removed:      Mutex<Vec<String>>,
        media_writes: Mutex<Vec<(String, Vec<String>)>>,
        fail_paths:   Vec<&'static str>,
        fail_writes:  bool,
    }

    impl RecordStore for FakeBackend {
        fn load_record(&self, record_id: &str) -> Result<(Vec<MediaItem>, Vec<Annotation>), RemoteError> {
            if record_id == "missing" {
                return Err(RemoteError::Http { status: 404, body: "no record".into() });
            }
            Ok((vec![MediaItem::Url("https://x/a.png".into())], Vec::new()))
        }

        fn update_media_files(&self, record_id: &str, media: &[MediaItem]) -> Result<(), RemoteError> {
            if self.fail_writes {
                return Err(RemoteError::Http { status: 500, body: "boom".into() });
            }
            let urls = media.iter().map(|m| m.url().to_string()).collect();
            self.media_writes.lock().push((record_id.to_string(), urls));
            Ok(())
        }

        fn update_annotations(&self, _: &str, _: &[Annotation]) -> Result<(), RemoteError> {
            Ok(())
        }
    }

    impl ObjectStorage for FakeBackend {
        fn upload(&self, path: &str, _: &[u8], content_type: &str) -> Result<String, RemoteError> {
            if self.fail_paths.iter().any(|p| path.ends_with(p)) {
                return Err(RemoteError::Transport("connection reset".into()));
            }
            self.uploads.lock().push((path.to_string(), content_type.to_string()));
            Ok(format!("https://h/storage/v1/object/public/{BUCKET}/{path}"))
        }

        fn remove(&self, paths: &[String]) -> Result<(), RemoteError> {
            self.removed.lock().extend_from_slice(paths);
            Ok(())
        }

        fn bucket(&self) -> &str {
            BUCKET
        }
    }

    fn fake_poster(ok: bool) -> PosterFn {
        Arc::new(move |_: &UploadFile, _: &SamplerConfig| {
            if ok {
                Ok(PosterImage { codec: PosterCodec::Jpeg, width: 2, height: 2, bytes: vec![0xFF, 0xD8, 0xFF] })
            } else {
                Err(ThumbnailError::Timeout(Duration::from_secs(15)))
            }
        })
    }

    fn worker(backend: Arc<FakeBackend>, poster_ok: bool, limit: u64) -> MediaWorker {
        let settings = WorkerSettings {
            max_upload_bytes: limit,
            poster:           fake_poster(poster_ok),
            ..WorkerSettings::default()
        };
        MediaWorker::with_backends(backend.clone(), backend, settings)
    }

    fn collect_batch(w: &MediaWorker) -> Vec<MediaResult> {
        let mut out = Vec::new();
        loop {
            let r = w.rx.recv_timeout(Duration::from_secs(5)).unwrap();
            let done = matches!(r, MediaResult::BatchDone { .. });
            out.push(r);
            if done { return out; }
        }
    }

    #[test]
    fn batch_continues_past_rejected_files() {
        let backend = Arc::new(FakeBackend { fail_paths: vec![".gif"], ..FakeBackend::default() });
        let w = worker(backend.clone(), true, 10);
        w.upload_batch("t1", vec![
            UploadFile::from_bytes("big.png", vec![1; 11]),
            UploadFile::from_bytes("anim.gif", vec![1; 4]),
            UploadFile::from_bytes("ok.png", vec![1; 4]),
        ]);
        let results = collect_batch(&w);

        assert_eq!(results.len(), 4);
        match &results[0] {
            MediaResult::UploadRejected { name, msg, .. } => {
                assert_eq!(name, "big.png");
                assert!(msg.starts_with("File big.png exceeds size limit"));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(&results[1], MediaResult::UploadRejected { msg, .. } if msg == "Failed to upload anim.gif"));
        match &results[2] {
            MediaResult::Uploaded { item, poster_failed, record_id } => {
                assert_eq!(record_id, "t1");
                assert_eq!(item.name(), "ok.png");
                assert_eq!(item.mime(), Some("image/png"));
                assert_eq!(item.thumbnail(), None);
                assert!(!poster_failed);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(results[3], MediaResult::BatchDone { uploaded: 1, failed: 2, .. }));
        // The oversized file never reached storage.
        assert_eq!(backend.uploads.lock().len(), 1);
        w.shutdown();
    }

    #[test]
    fn video_gets_poster_next_to_original() {
        let backend = Arc::new(FakeBackend::default());
        let w = worker(backend.clone(), true, 1024);
        w.upload_batch("t1", vec![UploadFile::from_bytes("clip.mp4", vec![0; 16])]);
        let results = collect_batch(&w);

        let MediaResult::Uploaded { item, poster_failed, .. } = &results[0] else {
            panic!("expected upload, got {:?}", results[0]);
        };
        assert!(!poster_failed);
        let uploads = backend.uploads.lock();
        assert_eq!(uploads.len(), 2);
        let stem = uploads[0].0.trim_end_matches(".mp4");
        assert_eq!(uploads[1].0, format!("{stem}_thumbnail.jpg"));
        assert_eq!(uploads[1].1, "image/jpeg");
        assert!(item.thumbnail().is_some_and(|t| t.ends_with("_thumbnail.jpg")));
        drop(uploads);
        w.shutdown();
    }

    #[test]
    fn poster_failure_is_not_fatal() {
        let backend = Arc::new(FakeBackend::default());
        let w = worker(backend, false, 1024);
        w.upload_batch("t1", vec![UploadFile::from_bytes("clip.mov", vec![0; 16])]);
        let results = collect_batch(&w);
        assert!(matches!(&results[0], MediaResult::Uploaded { poster_failed: true, item, .. } if item.thumbnail().is_none()));
        assert!(matches!(results[1], MediaResult::BatchDone { uploaded: 1, failed: 0, .. }));
        w.shutdown();
    }

    #[test]
    fn poster_store_failure_falls_back_to_data_url() {
        let backend = Arc::new(FakeBackend { fail_paths: vec!["_thumbnail.jpg"], ..FakeBackend::default() });
        let w = worker(backend, true, 1024);
        w.upload_batch("t1", vec![UploadFile::from_bytes("clip.webm", vec![0; 16])]);
        let results = collect_batch(&w);
        let MediaResult::Uploaded { item, .. } = &results[0] else { panic!() };
        assert!(item.thumbnail().is_some_and(|t| t.starts_with("data:image/jpeg;base64,")));
        w.shutdown();
    }

    #[test]
    fn remove_objects_skips_foreign_urls() {
        let backend = Arc::new(FakeBackend::default());
        let w = worker(backend.clone(), true, 1024);
        w.persist("t1", PersistRequest::RemoveObjects(vec![
            format!("https://h/storage/v1/object/public/{BUCKET}/t1/a.mp4"),
            "data:image/jpeg;base64,AAAA".into(),
            format!("https://h/storage/v1/object/public/{BUCKET}/t1/a_thumbnail.webp"),
        ]));
        w.shutdown();
        assert_eq!(*backend.removed.lock(), vec!["t1/a.mp4".to_string(), "t1/a_thumbnail.webp".to_string()]);
    }

    #[test]
    fn persist_failures_are_reported() {
        let backend = Arc::new(FakeBackend { fail_writes: true, ..FakeBackend::default() });
        let w = worker(backend, true, 1024);
        w.persist("t1", PersistRequest::MediaFiles(Vec::new()));
        let r = w.rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(matches!(r, MediaResult::PersistFailed { what: "media_files", ref msg, .. } if msg.contains("HTTP 500")));
        w.shutdown();
    }

    #[test]
    fn writes_are_applied_in_order() {
        let backend = Arc::new(FakeBackend::default());
        let w = worker(backend.clone(), true, 1024);
        for n in 0..5 {
            w.persist("t1", PersistRequest::MediaFiles(vec![MediaItem::Url("u".into()); n]));
        }
        w.shutdown();
        let lens: Vec<usize> = backend.media_writes.lock().iter().map(|(_, l)| l.len()).collect();
        assert_eq!(lens, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn uploads_land_in_their_own_record_after_switch() {
        let backend = Arc::new(FakeBackend::default());
        let w = worker(backend.clone(), true, 1024);
        w.upload_batch("t1", vec![UploadFile::from_bytes("new.png", vec![1; 4])]);
        // The user opens another record while the batch is in flight.
        w.load_record("t2");
        let results = collect_batch(&w);
        assert!(results.iter().any(|r| matches!(r, MediaResult::Uploaded { record_id, .. } if record_id == "t1")));
        w.shutdown();

        let writes = backend.media_writes.lock();
        assert_eq!(writes.len(), 1);
        let (record, urls) = &writes[0];
        assert_eq!(record, "t1");
        assert_eq!(urls[0], "https://x/a.png");
        assert!(urls[1].contains("/t1/") && urls[1].ends_with(".png"), "{urls:?}");
    }

    #[test]
    fn append_skips_items_already_listed() {
        let backend = FakeBackend::default();
        append_media(&backend, "t1", MediaItem::Url("https://x/a.png".into())).unwrap();
        assert!(backend.media_writes.lock().is_empty());
        append_media(&backend, "t1", MediaItem::Url("https://x/b.png".into())).unwrap();
        assert_eq!(backend.media_writes.lock()[0].1, vec!["https://x/a.png", "https://x/b.png"]);
    }

    #[test]
    fn load_reports_success_and_failure() {
        let backend = Arc::new(FakeBackend::default());
        let w = worker(backend, true, 1024);
        w.load_record("t1");
        w.load_record("missing");
        let first  = w.rx.recv_timeout(Duration::from_secs(5)).unwrap();
        let second = w.rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(matches!(first, MediaResult::RecordLoaded { ref media, .. } if media.len() == 1));
        assert!(matches!(second, MediaResult::LoadFailed { ref record_id, .. } if record_id == "missing"));
        w.shutdown();
    }

    #[test]
    fn upload_from_path_uses_file_name() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("shot.jpg");
        fs::write(&path, [1u8, 2, 3]).unwrap();
        let f = UploadFile::from_path(path);
        assert_eq!(f.name, "shot.jpg");
        assert_eq!(f.size().unwrap(), 3);
        assert_eq!(f.read().unwrap(), vec![1, 2, 3]);
    }
}
