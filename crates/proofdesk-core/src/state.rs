// crates/proofdesk-core/src/state.rs
// Workspace state for one open record. No egui, no ffmpeg, no network.
//
// The host view owns exactly one WorkspaceState and is the only writer of
// the master media list. Mutations are applied here synchronously, then the
// write-back to the record store is queued on `pending_persist` for app.rs
// to hand to the MediaWorker. A failed write is logged and never rolled
// back; the next successful write or a reload reconciles.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::annotation::{Annotation, CapturedStroke};
use crate::error::ReorderError;
use crate::media_types::{MediaItem, MediaKind};
use crate::reorder::{
    delete_viewable, follow_selection, move_viewable, selection_after_delete, DragState,
    ViewableIndex,
};

pub const MIN_ZOOM:       f32 = 0.5;
pub const MAX_ZOOM:       f32 = 3.0;
pub const WHEEL_ZOOM_IN:  f32 = 1.1;
pub const WHEEL_ZOOM_OUT: f32 = 0.9;
pub const BUTTON_ZOOM:    f32 = 1.2;

/// How long a transient status line stays up.
pub const STATUS_TTL: Duration = Duration::from_secs(3);

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Pan {
    pub x: f32,
    pub y: f32,
}

impl Pan {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

// ── View ──────────────────────────────────────────────────────────────────────

/// Zoom, pan, mode and selection of the media viewer. Mutated only through
/// the named intents below.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewState {
    pub zoom:                f32,
    pub pan:                 Pan,
    pub annotation_mode:     bool,
    /// Viewable index shown in the viewer.
    pub selected:            usize,
    /// Annotation highlighted in the viewer, by id.
    pub selected_annotation: Option<String>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            zoom:                1.0,
            pan:                 Pan::default(),
            annotation_mode:     false,
            selected:            0,
            selected_annotation: None,
        }
    }
}

impl ViewState {
    /// Wheel zoom anchored at `anchor` (pointer offset from the viewer
    /// centre). The pan is adjusted so the point under the pointer stays put.
    /// Ignored in annotation mode; returns whether anything changed.
    pub fn zoom_at(&mut self, zoom_in: bool, anchor: Pan) -> bool {
        if self.annotation_mode {
            return false;
        }
        let factor   = if zoom_in { WHEEL_ZOOM_IN } else { WHEEL_ZOOM_OUT };
        let new_zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        let change   = new_zoom / self.zoom;
        self.pan.x  -= anchor.x * (change - 1.0);
        self.pan.y  -= anchor.y * (change - 1.0);
        self.zoom    = new_zoom;
        true
    }

    pub fn zoom_step(&mut self, zoom_in: bool) {
        let z = if zoom_in { self.zoom * BUTTON_ZOOM } else { self.zoom / BUTTON_ZOOM };
        self.zoom = z.clamp(MIN_ZOOM, MAX_ZOOM);
    }

    /// Drag-pan. Ignored in annotation mode, where the pointer draws.
    pub fn pan_by(&mut self, delta: Pan) -> bool {
        if self.annotation_mode {
            return false;
        }
        self.pan.x += delta.x;
        self.pan.y += delta.y;
        true
    }

    pub fn reset_zoom_pan(&mut self) {
        self.zoom = 1.0;
        self.pan  = Pan::default();
    }

    /// New strokes are captured only in annotation mode while no saved
    /// annotation is highlighted.
    pub fn capture_active(&self) -> bool {
        self.annotation_mode && self.selected_annotation.is_none()
    }
}

// ── Side-effect queue ─────────────────────────────────────────────────────────

/// Write-backs queued by state mutations, drained by app.rs.
#[derive(Clone, Debug, PartialEq)]
pub enum PersistRequest {
    MediaFiles(Vec<MediaItem>),
    Annotations(Vec<Annotation>),
    /// Public URLs of stored objects to delete (original + poster).
    RemoveObjects(Vec<String>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct StatusMessage {
    pub text:     String,
    pub is_error: bool,
    pub shown_at: Instant,
}

impl StatusMessage {
    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.shown_at) >= STATUS_TTL
    }
}

/// Delete awaiting the user's confirmation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingDelete {
    pub viewable_index: usize,
    pub url:            String,
    pub name:           String,
}

// ── Workspace ─────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct WorkspaceState {
    pub record_id:       String,
    media:               Vec<MediaItem>,
    index:               ViewableIndex,
    pub annotations:     Vec<Annotation>,
    pub view:            ViewState,
    pub drag:            DragState,
    pub pending_delete:  Option<PendingDelete>,
    pub status:          Option<StatusMessage>,
    /// True until the first RecordLoaded / LoadFailed arrives.
    pub loading:         bool,
    /// Files of the current upload batch(es) not yet reported back.
    pub uploads_running: usize,
    pub pending_persist: Vec<PersistRequest>,
}

impl WorkspaceState {
    pub fn open(record_id: impl Into<String>) -> Self {
        Self {
            record_id:       record_id.into(),
            media:           Vec::new(),
            index:           ViewableIndex::default(),
            annotations:     Vec::new(),
            view:            ViewState::default(),
            drag:            DragState::default(),
            pending_delete:  None,
            status:          None,
            loading:         true,
            uploads_running: 0,
            pending_persist: Vec::new(),
        }
    }

    /// Replace state with what the store returned.
    pub fn load(&mut self, media: Vec<MediaItem>, annotations: Vec<Annotation>) {
        self.set_media(media);
        self.annotations = annotations;
        self.loading     = false;
    }

    // ── Media list ───────────────────────────────────────────────────────────

    pub fn media(&self) -> &[MediaItem] {
        &self.media
    }

    pub fn mapping(&self) -> &ViewableIndex {
        &self.index
    }

    /// Swap in a new master list and rebuild the viewable mapping. The
    /// selection is clamped into range.
    pub fn set_media(&mut self, media: Vec<MediaItem>) {
        self.media = media;
        self.index = ViewableIndex::build(&self.media);
        let len = self.index.len();
        if len == 0 {
            self.view.selected = 0;
        } else if self.view.selected >= len {
            self.view.selected = len - 1;
        }
    }

    pub fn viewable(&self) -> Vec<&MediaItem> {
        self.index.viewable(&self.media)
    }

    pub fn viewable_len(&self) -> usize {
        self.index.len()
    }

    pub fn has_viewable(&self) -> bool {
        !self.index.is_empty()
    }

    pub fn viewable_item(&self, viewable: usize) -> Option<&MediaItem> {
        self.index.master_index(viewable).and_then(|m| self.media.get(m))
    }

    pub fn selected_item(&self) -> Option<&MediaItem> {
        self.viewable_item(self.view.selected)
    }

    /// 1-based page number annotations are filed under.
    pub fn current_page(&self) -> u32 {
        self.view.selected as u32 + 1
    }

    /// Non-viewable attachments, for the sidebar file list.
    pub fn attachments(&self) -> impl Iterator<Item = &MediaItem> {
        self.media.iter().filter(|m| !m.is_viewable())
    }

    // ── Navigation ───────────────────────────────────────────────────────────

    pub fn select(&mut self, viewable: usize) {
        if viewable < self.index.len() {
            self.view.selected            = viewable;
            self.view.selected_annotation = None;
        }
    }

    pub fn next(&mut self) {
        let len = self.index.len();
        if len == 0 {
            return;
        }
        self.select((self.view.selected + 1) % len);
    }

    pub fn prev(&mut self) {
        let len = self.index.len();
        if len == 0 {
            return;
        }
        self.select(if self.view.selected == 0 { len - 1 } else { self.view.selected - 1 });
    }

    // ── Reorder ──────────────────────────────────────────────────────────────

    /// Begin a thumbnail drag. Refused while drawing annotations.
    pub fn drag_start(&mut self, viewable: usize) -> bool {
        if self.view.annotation_mode || viewable >= self.index.len() {
            return false;
        }
        self.drag.start(viewable);
        true
    }

    /// Complete a drag onto viewable `target`. The new order is applied
    /// immediately and queued for persistence; an invalid gesture changes
    /// nothing.
    pub fn drop_on(&mut self, target: usize) -> Result<(), ReorderError> {
        let Some((dragged, target)) = self.drag.take_drop(target) else {
            return Ok(());
        };
        let reordered = match move_viewable(&self.media, &self.index, dragged, target) {
            Ok(list) => list,
            Err(ReorderError::SameIndex(_)) => return Ok(()),
            Err(e) => {
                tracing::warn!(record = %self.record_id, dragged, target, "[reorder] drop aborted: {e}");
                return Err(e);
            }
        };
        self.view.selected = follow_selection(self.view.selected, dragged, target);
        self.set_media(reordered);
        self.pending_persist.push(PersistRequest::MediaFiles(self.media.clone()));
        tracing::debug!(record = %self.record_id, dragged, target, "[reorder] moved");
        Ok(())
    }

    // ── Delete ───────────────────────────────────────────────────────────────

    pub fn request_delete(&mut self, viewable: usize) {
        let Some(item) = self.viewable_item(viewable) else { return };
        self.pending_delete = Some(PendingDelete {
            viewable_index: viewable,
            url:            item.url().to_string(),
            name:           item.name().to_string(),
        });
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    /// Execute the confirmed delete. Removes the item from the master list,
    /// queues the list write-back and the storage cleanup, and moves the
    /// selection so it stays on a valid item.
    pub fn confirm_delete(&mut self, now: Instant) -> Result<MediaItem, ReorderError> {
        let Some(pending) = self.pending_delete.take() else {
            return Err(ReorderError::IndexOutOfRange { index: 0, len: self.index.len() });
        };
        let deleted = match delete_viewable(
            &self.media,
            &self.index,
            pending.viewable_index,
            Some(&pending.url),
        ) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(record = %self.record_id, url = %pending.url, "[delete] aborted: {e}");
                self.set_status("Failed to delete file", true, now);
                return Err(e);
            }
        };

        let selected = self.view.selected;
        let removed  = deleted.removed;
        self.set_media(deleted.media);
        let at = deleted.viewable.unwrap_or(pending.viewable_index);
        if let Some(sel) = selection_after_delete(selected, at, self.index.len()) {
            self.view.selected = sel;
        }

        let mut objects = vec![removed.url().to_string()];
        if let Some(thumb) = removed.thumbnail() {
            objects.push(thumb.to_string());
        }
        self.pending_persist.push(PersistRequest::RemoveObjects(objects));
        self.pending_persist.push(PersistRequest::MediaFiles(self.media.clone()));
        self.set_status("File deleted successfully", false, now);
        Ok(removed)
    }

    // ── Annotations ──────────────────────────────────────────────────────────

    /// File a captured stroke under the current page with the current view
    /// context, and queue the annotation list write-back.
    pub fn add_annotation(&mut self, stroke: CapturedStroke) -> &Annotation {
        let kind = self.selected_item().map(MediaItem::kind).filter(|k| *k != MediaKind::Other);
        let annotation = Annotation::from_stroke(
            stroke,
            self.current_page(),
            kind,
            self.view.zoom,
            self.view.pan,
        );
        self.annotations.push(annotation);
        self.pending_persist.push(PersistRequest::Annotations(self.annotations.clone()));
        &self.annotations[self.annotations.len() - 1]
    }

    /// Annotations drawn on the page currently shown.
    pub fn annotations_on_current_page(&self) -> impl Iterator<Item = &Annotation> {
        let page = self.current_page();
        self.annotations.iter().filter(move |a| a.page_index.max(1) == page)
    }

    /// Highlight an annotation and jump to its page when that page exists.
    pub fn select_annotation(&mut self, id: Option<String>) {
        let page = id
            .as_deref()
            .and_then(|id| self.annotations.iter().find(|a| a.id == id))
            .map(|a| a.page_index.max(1) as usize - 1);
        if let Some(p) = page.filter(|&p| p < self.index.len()) {
            self.view.selected = p;
        }
        self.view.selected_annotation = id;
    }

    // ── Uploads ──────────────────────────────────────────────────────────────

    pub fn begin_upload(&mut self, files: usize) {
        self.uploads_running += files;
    }

    /// A batch file landed in storage and the worker has already added it to
    /// the stored list. Shown at once; a record reloaded after that write
    /// already lists it.
    pub fn append_uploaded(&mut self, item: MediaItem) {
        self.uploads_running = self.uploads_running.saturating_sub(1);
        if self.media.iter().any(|m| m.url() == item.url()) {
            return;
        }
        let mut media = std::mem::take(&mut self.media);
        media.push(item);
        self.set_media(media);
    }

    pub fn upload_rejected(&mut self, msg: &str, now: Instant) {
        self.uploads_running = self.uploads_running.saturating_sub(1);
        self.set_status(msg, true, now);
    }

    pub fn finish_batch(&mut self, uploaded: usize, failed: usize, now: Instant) {
        match (uploaded, failed) {
            (0, 0) => {}
            (n, 0) => self.set_status(&format!("{n} file(s) uploaded successfully"), false, now),
            (0, f) => self.set_status(&format!("Failed to upload {f} file(s)"), true, now),
            (n, f) => self.set_status(&format!("{n} file(s) uploaded, {f} failed"), false, now),
        }
    }

    // ── Status ───────────────────────────────────────────────────────────────

    pub fn set_status(&mut self, text: &str, is_error: bool, now: Instant) {
        self.status = Some(StatusMessage { text: text.to_string(), is_error, shown_at: now });
    }

    /// Drop the status line once it has been up long enough.
    pub fn expire_status(&mut self, now: Instant) {
        if self.status.as_ref().is_some_and(|s| s.is_expired(now)) {
            self.status = None;
        }
    }

    pub fn take_persist_requests(&mut self) -> Vec<PersistRequest> {
        std::mem::take(&mut self.pending_persist)
    }
}
