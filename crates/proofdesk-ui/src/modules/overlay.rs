// crates/proofdesk-ui/src/modules/overlay.rs
//
// egui front end for AnnotationOverlay. The state machine lives in
// proofdesk-core; this file only feeds it pointer events, paints paths and
// hosts the comment popup.
//
// The overlay is laid over the media exactly as displayed (zoom included),
// and strokes are captured in the media's natural pixel space (the view
// box), so a saved path lines up with the picture at any display size.

use egui::{Id, Pos2, Rect, Sense, Shape, Stroke, Ui, Vec2};

use proofdesk_core::annotation::{Annotation, AnnotationOverlay, OverlayPhase};
use proofdesk_core::commands::WorkspaceCommand;
use proofdesk_core::helpers::geometry::{Bounds, Point, Size};
use proofdesk_core::helpers::path::polylines;

use crate::theme::{ANNOTATION, ANNOTATION_ALPHA, ANNOTATION_HI, ANNOTATION_W, STROKE_LIVE};

#[derive(Default)]
pub struct OverlayWidget {
    overlay: AnnotationOverlay,
    /// URL of the item the overlay is sitting on. A new item drops any
    /// half-finished stroke.
    item:    Option<String>,
}

impl OverlayWidget {
    pub fn phase(&self) -> OverlayPhase {
        self.overlay.phase()
    }

    pub fn reset(&mut self) {
        self.overlay.cancel();
        self.item = None;
    }

    #[allow(clippy::too_many_arguments)]
    pub fn show<'a>(
        &mut self,
        ui:          &mut Ui,
        rect:        Rect,
        item_url:    &str,
        view_box:    Option<Size>,
        is_active:   bool,
        annotations: impl IntoIterator<Item = &'a Annotation>,
        highlight:   Option<&str>,
        cmd:         &mut Vec<WorkspaceCommand>,
    ) {
        if self.item.as_deref() != Some(item_url) {
            self.overlay.cancel();
            self.item = Some(item_url.to_string());
        }
        if !is_active && self.overlay.phase() != OverlayPhase::Idle {
            self.overlay.cancel();
        }

        self.overlay.set_view_box(view_box);
        self.overlay.observe_size(Size::new(rect.width() as f64, rect.height() as f64));

        let painter = ui.painter_at(rect);

        // ── Existing annotations ─────────────────────────────────────────────
        for path in self.overlay.render_existing(annotations, highlight) {
            let (color, width) = if path.highlighted {
                (ANNOTATION_HI, ANNOTATION_W + 2.0)
            } else {
                (ANNOTATION.gamma_multiply(ANNOTATION_ALPHA), ANNOTATION_W)
            };
            let space = self.overlay.measured_size();
            paint_polylines(&painter, &path.d, rect, space, Stroke::new(width, color));
        }

        if !is_active {
            return;
        }

        // ── Pointer capture ──────────────────────────────────────────────────
        let resp   = ui.interact(rect, Id::new("annotation_overlay"), Sense::drag());
        let bounds = bounds_of(rect);
        let pos    = resp.interact_pointer_pos().or_else(|| ui.ctx().pointer_latest_pos());

        if resp.drag_started() {
            if let Some(p) = pos {
                self.overlay.pointer_down(point_of(p), bounds, true);
            }
        } else if resp.dragged() {
            match pos {
                // Leaving the surface ends the stroke like a release.
                Some(p) if !rect.contains(p) => self.overlay.pointer_up(),
                Some(p) => self.overlay.pointer_move(point_of(p), bounds, true),
                None => {}
            }
        }
        if resp.drag_stopped() {
            self.overlay.pointer_up();
        }
        if resp.hovered() && self.overlay.phase() != OverlayPhase::CommentPending {
            ui.ctx().set_cursor_icon(egui::CursorIcon::Crosshair);
        }

        if let Some(d) = self.overlay.current_path() {
            let space = self.overlay.capture_size();
            paint_polylines(&painter, d, rect, space, Stroke::new(ANNOTATION_W - 1.0, STROKE_LIVE));
        }

        // ── Comment popup ────────────────────────────────────────────────────
        if self.overlay.phase() == OverlayPhase::CommentPending {
            self.comment_popup(ui, rect, cmd);
        }
    }

    fn comment_popup(&mut self, ui: &mut Ui, rect: Rect, cmd: &mut Vec<WorkspaceCommand>) {
        let mut save   = false;
        let mut cancel = false;

        egui::Window::new("Add comment")
            .id(Id::new("annotation_comment"))
            .collapsible(false)
            .resizable(false)
            .fixed_pos(rect.center_top() + Vec2::new(-140.0, 12.0))
            .show(ui.ctx(), |ui| {
                ui.set_width(280.0);
                let edit = ui.add(
                    egui::TextEdit::multiline(self.overlay.comment_mut())
                        .hint_text("What should change here?")
                        .desired_rows(3),
                );
                edit.request_focus();
                ui.horizontal(|ui| {
                    save   = ui.add_enabled(self.overlay.can_save(), egui::Button::new("Save")).clicked();
                    cancel = ui.button("Cancel").clicked();
                });
            });

        if save {
            if let Some(stroke) = self.overlay.save() {
                cmd.push(WorkspaceCommand::SaveAnnotation(stroke));
            }
        } else if cancel || ui.input(|i| i.key_pressed(egui::Key::Escape)) {
            self.overlay.cancel();
        }
    }
}

fn point_of(p: Pos2) -> Point {
    Point::new(p.x as f64, p.y as f64)
}

fn bounds_of(r: Rect) -> Bounds {
    Bounds::new(r.min.x as f64, r.min.y as f64, r.width() as f64, r.height() as f64)
}

/// Map a point in `space` (capture or measured coordinates) onto `rect`.
pub fn to_screen(p: Point, rect: Rect, space: Size) -> Pos2 {
    let (sx, sy) = if space.is_valid() {
        (rect.width() as f64 / space.width, rect.height() as f64 / space.height)
    } else {
        (1.0, 1.0)
    };
    Pos2::new(rect.min.x + (p.x * sx) as f32, rect.min.y + (p.y * sy) as f32)
}

fn paint_polylines(painter: &egui::Painter, d: &str, rect: Rect, space: Size, stroke: Stroke) {
    for line in polylines(d) {
        let pts: Vec<Pos2> = line.into_iter().map(|p| to_screen(p, rect, space)).collect();
        match pts.len() {
            0 => {}
            1 => {
                painter.circle_filled(pts[0], stroke.width / 2.0, stroke.color);
            }
            _ => {
                painter.add(Shape::line(pts, stroke));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn measured_space_maps_one_to_one() {
        let rect = Rect::from_min_size(Pos2::new(10.0, 20.0), Vec2::new(400.0, 300.0));
        let p = to_screen(Point::new(100.0, 50.0), rect, Size::new(400.0, 300.0));
        assert_eq!(p, Pos2::new(110.0, 70.0));
    }

    #[test]
    fn view_box_space_scales_to_rect() {
        let rect = Rect::from_min_size(Pos2::ZERO, Vec2::new(200.0, 100.0));
        let p = to_screen(Point::new(800.0, 400.0), rect, Size::new(1600.0, 800.0));
        assert_eq!(p, Pos2::new(100.0, 50.0));
    }

    #[test]
    fn unknown_space_is_unscaled() {
        let rect = Rect::from_min_size(Pos2::new(5.0, 5.0), Vec2::new(50.0, 50.0));
        assert_eq!(to_screen(Point::new(3.0, 4.0), rect, Size::default()), Pos2::new(8.0, 9.0));
    }
}
