// crates/proofdesk-ui/src/modules/strip.rs
//
// Thumbnail strip: one card per viewable item, in viewable order.
// Click selects, drag reorders, right-click or Delete asks to remove.
//
// Only viewable indices leave this file. Translating them to master-list
// positions is WorkspaceState's job, so attachments hidden from the strip
// keep their place in the stored list.
use super::{kind_icon, ThumbnailCache, WorkspaceModule};
use proofdesk_core::commands::WorkspaceCommand;
use proofdesk_core::helpers::geometry::{Bounds, Point};
use proofdesk_core::state::WorkspaceState;
use crate::helpers::format::fit_label;
use crate::theme::{ACCENT, BG_CARD, BG_CARD_HOVER, BG_PANEL, BORDER, DROP_TARGET, TEXT_DIM};
use egui::{Align, Color32, Id, Layout, Rect, RichText, Sense, Stroke, Ui, Vec2};

const CARD_W:  f32 = 112.0;
const CARD_H:  f32 = 96.0;
const THUMB_H: f32 = 63.0;

pub struct StripModule;

impl WorkspaceModule for StripModule {
    fn name(&self) -> &str { "Media" }

    fn ui(&mut self, ui: &mut Ui, state: &WorkspaceState, thumbs: &mut ThumbnailCache, cmd: &mut Vec<WorkspaceCommand>) {
        // ── Hotkeys ──────────────────────────────────────────────────────────
        if !ui.ctx().wants_keyboard_input()
            && state.pending_delete.is_none()
            && state.has_viewable()
            && ui.input(|i| i.key_pressed(egui::Key::Delete))
        {
            cmd.push(WorkspaceCommand::RequestDelete(state.view.selected));
        }

        ui.vertical(|ui| {
            // ── Header ──────────────────────────────────────────────────────
            egui::Frame::new()
                .fill(BG_PANEL)
                .inner_margin(egui::Margin { left: 8, right: 8, top: 4, bottom: 4 })
                .show(ui, |ui| {
                    ui.horizontal(|ui| {
                        ui.label(RichText::new(self.name()).size(12.0).strong());
                        ui.label(RichText::new(format!("{} items", state.viewable_len()))
                            .size(10.0).color(TEXT_DIM));
                        ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                            let busy = state.uploads_running > 0;
                            if ui.add_enabled(!busy, egui::Button::new(RichText::new("＋ Upload").size(11.0))).clicked() {
                                cmd.push(WorkspaceCommand::PickFiles);
                            }
                            if busy {
                                ui.spinner();
                                ui.label(RichText::new(format!("Uploading {}…", state.uploads_running))
                                    .size(10.0).color(TEXT_DIM));
                            }
                        });
                    });
                });

            // ── Cards ───────────────────────────────────────────────────────
            egui::ScrollArea::horizontal().show(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.spacing_mut().item_spacing = egui::vec2(8.0, 0.0);
                    ui.add_space(6.0);
                    for (i, item) in state.viewable().into_iter().enumerate() {
                        self.card(ui, i, item, state, thumbs, cmd);
                    }
                });
            });

            // A release anywhere else abandons the gesture.
            if state.drag.is_dragging()
                && ui.input(|i| i.pointer.any_released())
                && !cmd.iter().any(|c| matches!(c, WorkspaceCommand::Drop(_)))
            {
                cmd.push(WorkspaceCommand::DragEnd);
            }
        });

        confirm_delete(ui, state, cmd);
    }
}

impl StripModule {
    fn card(
        &self,
        ui:     &mut Ui,
        index:  usize,
        item:   &proofdesk_core::media_types::MediaItem,
        state:  &WorkspaceState,
        thumbs: &mut ThumbnailCache,
        cmd:    &mut Vec<WorkspaceCommand>,
    ) {
        let selected  = state.view.selected == index;
        let dragged   = state.drag.dragged_index == Some(index);
        let drop_over = state.drag.drag_over_index == Some(index) && !dragged;

        let (rect, _) = ui.allocate_exact_size(Vec2::new(CARD_W, CARD_H), Sense::hover());
        let resp = ui.interact(rect, Id::new("strip_card").with(index), Sense::click_and_drag());

        // ── Paint ───────────────────────────────────────────────────────────
        let fill   = if resp.hovered() || selected { BG_CARD_HOVER } else { BG_CARD };
        let stroke = if drop_over {
            Stroke::new(2.0, DROP_TARGET)
        } else if selected {
            Stroke::new(1.5, ACCENT)
        } else {
            Stroke::new(1.0, BORDER)
        };
        let painter = ui.painter();
        painter.rect_filled(rect, 5.0, fill);
        painter.rect_stroke(rect, 5.0, stroke, egui::StrokeKind::Inside);

        let thumb_rect = Rect::from_min_size(rect.min + Vec2::new(4.0, 4.0), Vec2::new(CARD_W - 8.0, THUMB_H));
        painter.rect_filled(thumb_rect, 3.0, Color32::from_rgb(16, 17, 22));
        match thumbs.preview(ui.ctx(), item) {
            Some(img) => {
                img.maintain_aspect_ratio(true).fit_to_exact_size(thumb_rect.size()).paint_at(ui, thumb_rect);
            }
            None => {
                ui.painter().text(thumb_rect.center(), egui::Align2::CENTER_CENTER,
                    kind_icon(item.kind()), egui::FontId::proportional(24.0), Color32::from_gray(90));
            }
        }
        ui.painter().text(
            rect.left_bottom() + Vec2::new(6.0, -8.0),
            egui::Align2::LEFT_CENTER,
            format!("{}  {}", index + 1, fit_label(item.name(), CARD_W - 28.0)),
            egui::FontId::proportional(10.0),
            TEXT_DIM,
        );
        if dragged {
            ui.painter().rect_filled(rect, 5.0, Color32::from_black_alpha(120));
        }

        // ── Interact ────────────────────────────────────────────────────────
        if resp.clicked() {
            cmd.push(WorkspaceCommand::SelectMedia(index));
        }
        if resp.drag_started() && !state.view.annotation_mode {
            cmd.push(WorkspaceCommand::DragStart(index));
        }
        if resp.dragged() {
            ui.ctx().set_cursor_icon(egui::CursorIcon::Grabbing);
        }

        if state.drag.is_dragging() {
            let pointer  = ui.ctx().pointer_latest_pos();
            let inside   = pointer.is_some_and(|p| rect.contains(p));
            let is_over  = state.drag.drag_over_index == Some(index);
            if inside && !is_over {
                cmd.push(WorkspaceCommand::DragOver(index));
            } else if !inside && is_over {
                cmd.push(WorkspaceCommand::DragLeave {
                    index,
                    pointer: pointer.map(|p| Point::new(p.x as f64, p.y as f64)),
                    bounds:  Bounds::new(rect.min.x as f64, rect.min.y as f64, rect.width() as f64, rect.height() as f64),
                });
            }
            if inside && ui.input(|i| i.pointer.any_released()) {
                cmd.push(WorkspaceCommand::Drop(index));
            }
        }

        resp.context_menu(|ui| {
            ui.set_min_width(140.0);
            ui.label(RichText::new(fit_label(item.name(), 180.0)).size(10.0).color(TEXT_DIM));
            ui.separator();
            if ui.button("🗑  Delete").clicked() {
                cmd.push(WorkspaceCommand::RequestDelete(index));
                ui.close();
            }
        });
    }
}

/// Confirmation dialog for a pending delete. Nothing is removed until the
/// user confirms here.
fn confirm_delete(ui: &Ui, state: &WorkspaceState, cmd: &mut Vec<WorkspaceCommand>) {
    let Some(pending) = &state.pending_delete else { return };

    egui::Window::new("Delete file?")
        .id(Id::new("confirm_delete"))
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, Vec2::ZERO)
        .show(ui.ctx(), |ui| {
            ui.label(format!("Delete \"{}\"? This cannot be undone.", pending.name));
            ui.add_space(8.0);
            ui.horizontal(|ui| {
                if ui.button(RichText::new("Delete").color(Color32::from_rgb(240, 110, 110))).clicked() {
                    cmd.push(WorkspaceCommand::ConfirmDelete);
                }
                if ui.button("Cancel").clicked() || ui.input(|i| i.key_pressed(egui::Key::Escape)) {
                    cmd.push(WorkspaceCommand::CancelDelete);
                }
            });
        });
}
