// crates/proofdesk-core/src/annotation.rs
//
// Freehand annotations: the stored record shape and the capture state
// machine that produces them.
//
// The overlay owns no persistence. It turns pointer events into a single
// path, waits for a comment, and hands a CapturedStroke back to the host,
// which stamps page / zoom / pan onto it and writes the record.
//
//   Idle ──pointer_down (active)──▶ Drawing ──pointer_up (path)──▶ CommentPending
//    ▲                                 │                              │
//    └──────────pointer_up (no path)───┘          save / cancel ──────┘

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::helpers::geometry::{client_to_view_box, Bounds, Point, Size};
use crate::helpers::path::{scale_path, PathBuilder};
use crate::media_types::MediaKind;
use crate::state::Pan;

// ── Stored shape ──────────────────────────────────────────────────────────────

/// One annotation as written to the record's `annotations` array.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    pub id:         String,
    /// `M`/`L` path in the capture surface's coordinate space.
    pub path:       String,
    pub comment:    String,
    /// Capture surface size. 0 means unknown (records written before the
    /// size was stored); such paths are rendered unscaled.
    #[serde(default)]
    pub svg_width:  f64,
    #[serde(default)]
    pub svg_height: f64,
    /// 1-based page / item index the stroke was drawn on.
    #[serde(default = "first_page")]
    pub page_index: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp:  Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<MediaKind>,
    #[serde(default = "unit_zoom")]
    pub zoom:       f32,
    #[serde(default)]
    pub pan:        Pan,
}

fn first_page() -> u32 { 1 }
fn unit_zoom() -> f32 { 1.0 }

impl Annotation {
    /// Stamp a finished stroke with the host's view context.
    pub fn from_stroke(
        stroke:     CapturedStroke,
        page_index: u32,
        media_type: Option<MediaKind>,
        zoom:       f32,
        pan:        Pan,
    ) -> Self {
        Self {
            id:         Uuid::new_v4().to_string(),
            path:       stroke.path,
            comment:    stroke.comment,
            svg_width:  stroke.svg_width,
            svg_height: stroke.svg_height,
            page_index: page_index.max(1),
            timestamp:  Some(Utc::now()),
            media_type,
            zoom,
            pan,
        }
    }

    pub fn capture_size(&self) -> Size {
        Size::new(self.svg_width, self.svg_height)
    }

    /// The path rescaled for a surface of `target` size. Returned unchanged
    /// when either size is unknown.
    pub fn scaled_path(&self, target: Size) -> String {
        let source = self.capture_size();
        if !source.is_valid() || !target.is_valid() {
            return self.path.clone();
        }
        scale_path(
            &self.path,
            target.width  / source.width,
            target.height / source.height,
        )
    }
}

/// Annotations bucketed by page, pages ascending, capture order kept inside
/// each page.
pub fn group_by_page(annotations: &[Annotation]) -> BTreeMap<u32, Vec<&Annotation>> {
    let mut pages: BTreeMap<u32, Vec<&Annotation>> = BTreeMap::new();
    for a in annotations {
        pages.entry(a.page_index.max(1)).or_default().push(a);
    }
    pages
}

// ── Capture ───────────────────────────────────────────────────────────────────

/// What the overlay hands back on save. The comment is trimmed and never
/// empty; the size is the space `path` was captured in.
#[derive(Clone, Debug, PartialEq)]
pub struct CapturedStroke {
    pub path:       String,
    pub comment:    String,
    pub svg_width:  f64,
    pub svg_height: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OverlayPhase {
    #[default]
    Idle,
    Drawing,
    CommentPending,
}

/// An existing annotation ready to paint at the overlay's current size.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderedPath {
    pub id:          String,
    pub d:           String,
    pub highlighted: bool,
}

#[derive(Clone, Debug, Default)]
pub struct AnnotationOverlay {
    /// Declared coordinate space. When absent the measured size is used.
    view_box: Option<Size>,
    /// Last observed on-screen size of the overlay element.
    measured: Size,
    phase:    OverlayPhase,
    path:     PathBuilder,
    comment:  String,
}

impl AnnotationOverlay {
    pub fn new(view_box: Option<Size>) -> Self {
        Self { view_box, ..Self::default() }
    }

    pub fn phase(&self) -> OverlayPhase {
        self.phase
    }

    pub fn set_view_box(&mut self, view_box: Option<Size>) {
        self.view_box = view_box;
    }

    /// Record the overlay's rendered size. Called every frame the overlay is
    /// laid out; only existing-annotation scaling depends on it.
    pub fn observe_size(&mut self, size: Size) {
        self.measured = size;
    }

    pub fn measured_size(&self) -> Size {
        self.measured
    }

    /// The coordinate space strokes are captured in.
    pub fn capture_size(&self) -> Size {
        self.view_box.filter(Size::is_valid).unwrap_or(self.measured)
    }

    /// Begin a stroke. Ignored while inactive or while a comment is pending.
    pub fn pointer_down(&mut self, client: Point, bounds: Bounds, is_active: bool) -> bool {
        if !is_active || self.phase == OverlayPhase::CommentPending {
            return false;
        }
        self.path.clear();
        self.path.push(client_to_view_box(client, bounds, self.view_box));
        self.phase = OverlayPhase::Drawing;
        true
    }

    pub fn pointer_move(&mut self, client: Point, bounds: Bounds, is_active: bool) {
        if !is_active || self.phase != OverlayPhase::Drawing {
            return;
        }
        self.path.push(client_to_view_box(client, bounds, self.view_box));
    }

    /// End the stroke. Also used for pointer-leave. A stroke with no points
    /// drops straight back to idle.
    pub fn pointer_up(&mut self) {
        if self.phase != OverlayPhase::Drawing {
            return;
        }
        self.phase = if self.path.is_empty() {
            OverlayPhase::Idle
        } else {
            OverlayPhase::CommentPending
        };
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    /// Editable comment buffer, bound to the popup's text field.
    pub fn comment_mut(&mut self) -> &mut String {
        &mut self.comment
    }

    /// The in-progress stroke, in capture space.
    pub fn current_path(&self) -> Option<&str> {
        (!self.path.is_empty()).then(|| self.path.as_str())
    }

    pub fn can_save(&self) -> bool {
        self.phase == OverlayPhase::CommentPending
            && !self.path.is_empty()
            && !self.comment.trim().is_empty()
    }

    /// Finish the annotation. Returns `None` and changes nothing when there
    /// is no stroke or the comment is blank. On success the overlay is back
    /// to idle before the stroke is returned.
    pub fn save(&mut self) -> Option<CapturedStroke> {
        if !self.can_save() {
            return None;
        }
        let size    = self.capture_size();
        let comment = self.comment.trim().to_string();
        let path    = self.path.take();
        self.reset();
        Some(CapturedStroke {
            path,
            comment,
            svg_width:  size.width,
            svg_height: size.height,
        })
    }

    pub fn cancel(&mut self) {
        self.reset();
    }

    fn reset(&mut self) {
        self.path.clear();
        self.comment.clear();
        self.phase = OverlayPhase::Idle;
    }

    /// Scale each annotation from its own capture size to the current
    /// measured size.
    pub fn render_existing<'a, I>(&self, annotations: I, highlight: Option<&str>) -> Vec<RenderedPath>
    where
        I: IntoIterator<Item = &'a Annotation>,
    {
        annotations
            .into_iter()
            .map(|a| RenderedPath {
                id:          a.id.clone(),
                d:           a.scaled_path(self.measured),
                highlighted: highlight == Some(a.id.as_str()),
            })
            .collect()
    }
}
