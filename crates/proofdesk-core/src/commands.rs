// crates/proofdesk-core/src/commands.rs
//
// Every user intent in the workspace is expressed as a WorkspaceCommand.
// Modules emit these; app.rs processes them after the UI pass.
// Adding a new feature = add a variant here + one match arm in app.rs.

use std::path::PathBuf;

use crate::annotation::CapturedStroke;
use crate::helpers::geometry::{Bounds, Point};
use crate::state::Pan;

#[derive(Debug, Clone)]
pub enum WorkspaceCommand {
    // ── Record ───────────────────────────────────────────────────────────────
    /// Open (or reopen) a record. Loads media and annotations in the background.
    OpenRecord(String),
    Reload,

    // ── Navigation ───────────────────────────────────────────────────────────
    /// Select a viewable index. Clears any highlighted annotation.
    SelectMedia(usize),
    NextMedia,
    PrevMedia,

    // ── View ─────────────────────────────────────────────────────────────────
    /// Wheel zoom. `zoom_in` picks the 1.1 / 0.9 factor; `anchor` is the
    /// pointer position relative to the viewer's centre.
    ZoomAt { zoom_in: bool, anchor: Pan },
    /// Toolbar zoom buttons (×1.2 / ÷1.2).
    ZoomStep { zoom_in: bool },
    PanBy(Pan),
    ResetZoomPan,
    SetAnnotationMode(bool),
    ToggleAnnotationMode,

    // ── Thumbnail strip ──────────────────────────────────────────────────────
    DragStart(usize),
    DragOver(usize),
    /// Pointer left a thumbnail. `pointer` is where it is now, if known.
    DragLeave { index: usize, pointer: Option<Point>, bounds: Bounds },
    Drop(usize),
    DragEnd,
    /// Ask for confirmation before deleting the item at a viewable index.
    RequestDelete(usize),
    ConfirmDelete,
    CancelDelete,

    // ── Annotations ──────────────────────────────────────────────────────────
    SaveAnnotation(CapturedStroke),
    /// Highlight an annotation (and jump to its page), or clear with `None`.
    SelectAnnotation(Option<String>),

    // ── Upload ───────────────────────────────────────────────────────────────
    /// Open the native file picker.
    PickFiles,
    UploadFiles(Vec<PathBuf>),

    // ── Status ───────────────────────────────────────────────────────────────
    DismissStatus,
}
