// crates/proofdesk-ui/src/modules/sidebar.rs
//
// Right-hand panel: which record is open, its annotations grouped by page,
// and the attachments that never appear in the strip.
use super::{kind_icon, ThumbnailCache, WorkspaceModule};
use proofdesk_core::annotation::group_by_page;
use proofdesk_core::commands::WorkspaceCommand;
use proofdesk_core::state::WorkspaceState;
use crate::helpers::format::{fit_label, format_bytes, format_timestamp};
use crate::theme::{ACCENT, ANNOTATION, BG_CARD, BG_CARD_HOVER, BG_PANEL, BORDER, TEXT_DIM};
use egui::{Align, Layout, RichText, Sense, Stroke, Ui};

#[derive(Default)]
pub struct SidebarModule {
    /// Text field buffer for the record picker.
    record_input: String,
}

impl WorkspaceModule for SidebarModule {
    fn name(&self) -> &str { "Review" }

    fn ui(&mut self, ui: &mut Ui, state: &WorkspaceState, _thumbs: &mut ThumbnailCache, cmd: &mut Vec<WorkspaceCommand>) {
        ui.vertical(|ui| {
            egui::Frame::new()
                .fill(BG_PANEL)
                .inner_margin(egui::Margin { left: 8, right: 8, top: 6, bottom: 6 })
                .show(ui, |ui| {
                    ui.label(RichText::new(self.name()).size(12.0).strong());
                    self.record_picker(ui, state, cmd);
                });

            ui.separator();

            egui::ScrollArea::vertical().auto_shrink([false, false]).show(ui, |ui| {
                annotations(ui, state, cmd);
                ui.add_space(10.0);
                attachments(ui, state);
            });
        });
    }
}

impl SidebarModule {
    fn record_picker(&mut self, ui: &mut Ui, state: &WorkspaceState, cmd: &mut Vec<WorkspaceCommand>) {
        ui.horizontal(|ui| {
            let hint = if state.record_id.is_empty() { "Record id" } else { state.record_id.as_str() };
            let edit = ui.add(
                egui::TextEdit::singleline(&mut self.record_input)
                    .hint_text(hint)
                    .desired_width(110.0),
            );
            let entered = edit.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            let id = self.record_input.trim().to_string();
            if (ui.button("Open").clicked() || entered) && !id.is_empty() {
                cmd.push(WorkspaceCommand::OpenRecord(id));
                self.record_input.clear();
            }
            let can_reload = !state.record_id.is_empty() && !state.loading;
            if ui.add_enabled(can_reload, egui::Button::new("⟳")).on_hover_text("Reload").clicked() {
                cmd.push(WorkspaceCommand::Reload);
            }
        });
        if !state.record_id.is_empty() {
            ui.label(RichText::new(format!("Record {}", state.record_id)).size(10.0).color(TEXT_DIM));
        }
    }
}

fn annotations(ui: &mut Ui, state: &WorkspaceState, cmd: &mut Vec<WorkspaceCommand>) {
    ui.horizontal(|ui| {
        ui.label(RichText::new("Annotations").size(12.0).strong());
        ui.label(RichText::new(state.annotations.len().to_string()).size(10.0).color(TEXT_DIM));
        if state.view.selected_annotation.is_some() {
            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                if ui.small_button("Clear").clicked() {
                    cmd.push(WorkspaceCommand::SelectAnnotation(None));
                }
            });
        }
    });

    if state.annotations.is_empty() {
        ui.label(RichText::new("No annotations yet. Turn on ✏ Annotate and draw on the media.")
            .size(10.0).color(TEXT_DIM));
        return;
    }

    let len = state.viewable_len();
    for (page, list) in group_by_page(&state.annotations) {
        let on_page = page as usize <= len;
        ui.add_space(4.0);
        let header = ui.add(egui::Label::new(
            RichText::new(format!("Page {page}"))
                .size(11.0)
                .color(if state.current_page() == page { ACCENT } else { TEXT_DIM }),
        ).sense(Sense::click()));
        if header.clicked() && on_page {
            cmd.push(WorkspaceCommand::SelectMedia(page as usize - 1));
        }

        for a in list {
            let selected = state.view.selected_annotation.as_deref() == Some(a.id.as_str());
            let resp = egui::Frame::new()
                .fill(if selected { BG_CARD_HOVER } else { BG_CARD })
                .stroke(Stroke::new(1.0, if selected { ANNOTATION } else { BORDER }))
                .corner_radius(egui::CornerRadius::same(4))
                .inner_margin(egui::Margin::same(6))
                .show(ui, |ui| {
                    ui.set_width(ui.available_width());
                    ui.label(RichText::new(&a.comment).size(11.0));
                    let when = format_timestamp(a.timestamp);
                    if !when.is_empty() {
                        ui.label(RichText::new(when).size(9.0).color(TEXT_DIM));
                    }
                })
                .response
                .interact(Sense::click());
            if resp.clicked() {
                let next = if selected { None } else { Some(a.id.clone()) };
                cmd.push(WorkspaceCommand::SelectAnnotation(next));
            }
        }
    }
}

fn attachments(ui: &mut Ui, state: &WorkspaceState) {
    let files: Vec<_> = state.attachments().collect();
    if files.is_empty() {
        return;
    }
    ui.label(RichText::new("Attachments").size(12.0).strong());
    for item in files {
        ui.horizontal(|ui| {
            ui.label(kind_icon(item.kind()));
            ui.hyperlink_to(fit_label(item.name(), 150.0), item.url());
            if let Some(size) = item.size().filter(|s| *s > 0) {
                ui.label(RichText::new(format_bytes(size)).size(9.0).color(TEXT_DIM));
            }
        });
    }
}
