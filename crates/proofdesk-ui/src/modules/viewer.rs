// crates/proofdesk-ui/src/modules/viewer.rs
use super::{kind_icon, ThumbnailCache, WorkspaceModule};
use super::overlay::OverlayWidget;
use proofdesk_core::annotation::OverlayPhase;
use proofdesk_core::commands::WorkspaceCommand;
use proofdesk_core::helpers::geometry::Size;
use proofdesk_core::media_types::{MediaItem, MediaKind};
use proofdesk_core::state::{Pan, WorkspaceState};
use crate::helpers::format::{fit_label, zoom_label};
use crate::theme::{ACCENT, BG_CANVAS, BG_CARD, BG_PANEL, BORDER, TEXT_DIM};
use egui::{Align, Layout, Rect, RichText, Sense, Stroke, Ui, Vec2};

/// Aspect ratio used for media without an intrinsic size (documents,
/// posters still loading).
const PLACEHOLDER_RATIO: f32 = 4.0 / 3.0;

#[derive(Default)]
pub struct ViewerModule {
    pub overlay: OverlayWidget,
}

impl WorkspaceModule for ViewerModule {
    fn name(&self) -> &str { "Viewer" }

    fn ui(&mut self, ui: &mut Ui, state: &WorkspaceState, thumbs: &mut ThumbnailCache, cmd: &mut Vec<WorkspaceCommand>) {
        self.hotkeys(ui, state, cmd);

        ui.vertical(|ui| {
            self.header(ui, state, cmd);
            ui.add_space(4.0);

            let area = ui.available_rect_before_wrap();
            let resp = ui.allocate_rect(area, Sense::click_and_drag());
            ui.painter().rect_filled(area, 4.0, BG_CANVAS);

            if state.loading {
                centered_note(ui, area, "Loading record…");
                return;
            }
            let Some(item) = state.selected_item() else {
                centered_note(ui, area, "No media yet. Upload images, videos or PDFs to start reviewing.");
                return;
            };

            // ── Zoom / pan ───────────────────────────────────────────────────
            // Both are refused in annotation mode, where the pointer draws.
            if !state.view.annotation_mode {
                if resp.hovered() {
                    let dy = ui.input(|i| i.raw_scroll_delta.y);
                    if dy != 0.0 {
                        if let Some(p) = resp.hover_pos() {
                            let a = p - area.center();
                            cmd.push(WorkspaceCommand::ZoomAt { zoom_in: dy > 0.0, anchor: Pan::new(a.x, a.y) });
                        }
                    }
                }
                if resp.dragged() {
                    let d = resp.drag_delta();
                    cmd.push(WorkspaceCommand::PanBy(Pan::new(d.x, d.y)));
                }
                if resp.double_clicked() {
                    cmd.push(WorkspaceCommand::ResetZoomPan);
                }
            }

            // ── Media ────────────────────────────────────────────────────────
            let prev_clip = ui.clip_rect();
            ui.set_clip_rect(area.intersect(prev_clip));

            let (surface, view_box) = draw_media(ui, area, item, state, thumbs);

            self.overlay.show(
                ui,
                surface,
                item.url(),
                view_box,
                state.view.capture_active(),
                state.annotations_on_current_page(),
                state.view.selected_annotation.as_deref(),
                cmd,
            );

            ui.set_clip_rect(prev_clip);
        });
    }
}

impl ViewerModule {
    fn hotkeys(&self, ui: &Ui, state: &WorkspaceState, cmd: &mut Vec<WorkspaceCommand>) {
        if ui.ctx().wants_keyboard_input() {
            return;
        }
        ui.input(|i| {
            if i.key_pressed(egui::Key::ArrowRight) { cmd.push(WorkspaceCommand::NextMedia); }
            if i.key_pressed(egui::Key::ArrowLeft)  { cmd.push(WorkspaceCommand::PrevMedia); }
            if i.key_pressed(egui::Key::Escape)
                && state.view.annotation_mode
                && self.overlay.phase() == OverlayPhase::Idle
            {
                cmd.push(WorkspaceCommand::SetAnnotationMode(false));
            }
        });
    }

    fn header(&self, ui: &mut Ui, state: &WorkspaceState, cmd: &mut Vec<WorkspaceCommand>) {
        let len = state.viewable_len();
        egui::Frame::new()
            .fill(BG_PANEL)
            .inner_margin(egui::Margin { left: 8, right: 8, top: 5, bottom: 5 })
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.add_enabled_ui(len > 1, |ui| {
                        if ui.button("◀").on_hover_text("Previous (←)").clicked() {
                            cmd.push(WorkspaceCommand::PrevMedia);
                        }
                    });
                    let label = if len == 0 {
                        "0 / 0".to_string()
                    } else {
                        format!("{} / {len}", state.view.selected + 1)
                    };
                    ui.label(RichText::new(label).monospace().size(12.0));
                    ui.add_enabled_ui(len > 1, |ui| {
                        if ui.button("▶").on_hover_text("Next (→)").clicked() {
                            cmd.push(WorkspaceCommand::NextMedia);
                        }
                    });
                    if let Some(item) = state.selected_item() {
                        ui.separator();
                        ui.label(RichText::new(fit_label(item.name(), 260.0)).size(12.0).color(TEXT_DIM));
                    }

                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        let mode = state.view.annotation_mode;
                        let toggle = ui.add_enabled(
                            len > 0,
                            egui::Button::new(if mode { "✏ Annotating" } else { "✏ Annotate" }).selected(mode),
                        );
                        if toggle.clicked() {
                            cmd.push(WorkspaceCommand::ToggleAnnotationMode);
                        }
                        ui.separator();
                        if ui.button("⟲").on_hover_text("Reset zoom").clicked() {
                            cmd.push(WorkspaceCommand::ResetZoomPan);
                        }
                        if ui.button("＋").clicked() {
                            cmd.push(WorkspaceCommand::ZoomStep { zoom_in: true });
                        }
                        ui.label(RichText::new(zoom_label(state.view.zoom)).monospace().size(11.0));
                        if ui.button("－").clicked() {
                            cmd.push(WorkspaceCommand::ZoomStep { zoom_in: false });
                        }
                    });
                });
            });
    }
}

/// Paint the selected item and return the rect it occupies on screen plus
/// its natural size when known.
fn draw_media(
    ui:     &mut Ui,
    area:   Rect,
    item:   &MediaItem,
    state:  &WorkspaceState,
    thumbs: &mut ThumbnailCache,
) -> (Rect, Option<Size>) {
    let kind = item.kind();
    if let Some(image) = thumbs.preview(ui.ctx(), item) {
        let natural = image
            .load_for_size(ui.ctx(), area.size())
            .ok()
            .and_then(|poll| poll.size());
        let fitted = fit_rect(natural.unwrap_or(Vec2::new(PLACEHOLDER_RATIO, 1.0)), area);
        let shown  = zoomed_rect(fitted, state.view.zoom, state.view.pan);
        image.paint_at(ui, shown);
        if kind == MediaKind::Video {
            open_link(ui, shown, "▶ Play video", item.url());
        }
        return (shown, natural.map(|s| Size::new(s.x as f64, s.y as f64)));
    }

    // No picture: documents, attachments, videos without a poster.
    let fitted = fit_rect(Vec2::new(PLACEHOLDER_RATIO, 1.0), area.shrink(24.0));
    let shown  = zoomed_rect(fitted, state.view.zoom, state.view.pan);
    let painter = ui.painter();
    painter.rect_filled(shown, 6.0, BG_CARD);
    painter.rect_stroke(shown, 6.0, Stroke::new(1.0, BORDER), egui::StrokeKind::Inside);
    painter.text(
        shown.center() - Vec2::new(0.0, 24.0),
        egui::Align2::CENTER_CENTER,
        kind_icon(kind),
        egui::FontId::proportional(48.0),
        TEXT_DIM,
    );
    painter.text(
        shown.center() + Vec2::new(0.0, 18.0),
        egui::Align2::CENTER_CENTER,
        fit_label(item.name(), shown.width() - 32.0),
        egui::FontId::proportional(13.0),
        TEXT_DIM,
    );
    let label = if kind == MediaKind::Video { "▶ Play video" } else { "Open document" };
    open_link(ui, shown, label, item.url());
    (shown, None)
}

fn open_link(ui: &mut Ui, rect: Rect, label: &str, url: &str) {
    let at = Rect::from_center_size(rect.center_bottom() - Vec2::new(0.0, 22.0), Vec2::new(140.0, 22.0));
    ui.put(at, egui::Hyperlink::from_label_and_url(RichText::new(label).color(ACCENT), url));
}

fn centered_note(ui: &Ui, area: Rect, text: &str) {
    ui.painter().text(
        area.center(),
        egui::Align2::CENTER_CENTER,
        text,
        egui::FontId::proportional(13.0),
        TEXT_DIM,
    );
}

/// Largest rect with `natural`'s aspect ratio centred inside `area`.
pub fn fit_rect(natural: Vec2, area: Rect) -> Rect {
    if natural.x <= 0.0 || natural.y <= 0.0 {
        return area;
    }
    let scale = (area.width() / natural.x).min(area.height() / natural.y);
    Rect::from_center_size(area.center(), natural * scale)
}

/// `fitted` scaled about its centre and shifted by the pan offset.
pub fn zoomed_rect(fitted: Rect, zoom: f32, pan: Pan) -> Rect {
    Rect::from_center_size(fitted.center() + Vec2::new(pan.x, pan.y), fitted.size() * zoom)
}
