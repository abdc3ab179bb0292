// crates/proofdesk-ui/src/context.rs
//
// AppContext owns the runtime handles that are NOT part of WorkspaceState.
// ProofdeskApp holds one of these plus a WorkspaceState and its panels.
//
//   AppContext
//     ├── media_worker  the upload/persist worker and its result channel
//     └── thumbs        inline poster textures

use std::time::Instant;

use eframe::egui;

use proofdesk_core::state::WorkspaceState;
use proofdesk_media::{MediaResult, MediaWorker};

use crate::modules::ThumbnailCache;

pub struct AppContext {
    pub media_worker: MediaWorker,
    pub thumbs:       ThumbnailCache,
}

impl AppContext {
    pub fn new(media_worker: MediaWorker) -> Self {
        Self { media_worker, thumbs: ThumbnailCache::default() }
    }

    /// Drain every queued worker result into `state`.
    pub fn ingest_media_results(&mut self, state: &mut WorkspaceState, ctx: &egui::Context) {
        let now = Instant::now();
        while let Ok(result) = self.media_worker.rx.try_recv() {
            if apply_result(state, result, now) {
                ctx.request_repaint();
            }
        }
    }
}

/// Fold one worker result into `state`. Returns false when the result was
/// for a record that is no longer open and was dropped.
pub fn apply_result(state: &mut WorkspaceState, result: MediaResult, now: Instant) -> bool {
    if result.record_id() != state.record_id {
        tracing::debug!(
            open = %state.record_id,
            from = %result.record_id(),
            "[app] dropping result for a closed record"
        );
        return false;
    }

    match result {
        MediaResult::Uploaded { item, poster_failed, .. } => {
            if poster_failed {
                tracing::warn!("[upload] {}: no poster, showing placeholder", item.name());
            }
            state.append_uploaded(item);
        }
        MediaResult::UploadRejected { name, msg, .. } => {
            tracing::warn!("[upload] {name}: {msg}");
            state.upload_rejected(&msg, now);
        }
        MediaResult::BatchDone { uploaded, failed, .. } => {
            tracing::info!("[upload] batch done: {uploaded} ok, {failed} failed");
            state.finish_batch(uploaded, failed, now);
        }
        MediaResult::RecordLoaded { media, annotations, .. } => {
            tracing::info!(
                record = %state.record_id,
                media = media.len(),
                annotations = annotations.len(),
                "[app] record loaded"
            );
            state.load(media, annotations);
        }
        MediaResult::LoadFailed { msg, .. } => {
            tracing::warn!(record = %state.record_id, "[app] load failed: {msg}");
            state.load(Vec::new(), Vec::new());
            state.set_status("Failed to load record", true, now);
        }
        MediaResult::PersistFailed { what, msg, .. } => {
            // Local state stays as the user left it; the next write or a
            // reload brings the store back in line.
            tracing::warn!(record = %state.record_id, "[persist] {what}: {msg}");
        }
    }
    true
}
