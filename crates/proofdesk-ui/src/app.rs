// src/app.rs (proofdesk-ui)
use std::path::PathBuf;
use std::time::{Duration, Instant};

use eframe::egui;
use rfd::FileDialog;

use proofdesk_core::commands::WorkspaceCommand;
use proofdesk_core::state::WorkspaceState;
use proofdesk_media::{HttpBackend, MediaWorker, UploadFile};

use crate::config::AppConfig;
use crate::context::AppContext;
use crate::modules::{
    WorkspaceModule,
    sidebar::SidebarModule,
    strip::StripModule,
    viewer::ViewerModule,
};
use crate::theme::{configure_style, ACCENT, STATUS_ERR, STATUS_OK};

const MEDIA_EXTS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "mp4", "mov", "avi", "webm", "mkv", "pdf"];

/// Repaint cadence while something is in flight with no input to wake us.
const BUSY_REPAINT: Duration = Duration::from_millis(250);

// ── App ───────────────────────────────────────────────────────────────────────

pub struct ProofdeskApp {
    state:        WorkspaceState,
    context:      AppContext,
    viewer:       ViewerModule,
    strip:        StripModule,
    sidebar:      SidebarModule,
    /// Commands emitted by modules each frame, processed after the UI pass
    pending_cmds: Vec<WorkspaceCommand>,
}

impl ProofdeskApp {
    pub fn new(cc: &eframe::CreationContext<'_>, config: AppConfig) -> Self {
        egui_extras::install_image_loaders(&cc.egui_ctx);
        configure_style(&cc.egui_ctx);
        cc.egui_ctx.options_mut(|o| {
            o.theme_preference = egui::ThemePreference::Dark;
        });

        let media_worker = MediaWorker::new(
            HttpBackend::new(config.remote()),
            config.worker_settings(),
        );
        let mut state = WorkspaceState::open(config.record_id.trim());
        if state.record_id.is_empty() {
            state.loading = false;
        } else {
            media_worker.load_record(&state.record_id);
        }

        Self {
            state,
            context:      AppContext::new(media_worker),
            viewer:       ViewerModule::default(),
            strip:        StripModule,
            sidebar:      SidebarModule::default(),
            pending_cmds: Vec::new(),
        }
    }

    fn process_command(&mut self, cmd: WorkspaceCommand) {
        let now = Instant::now();
        match cmd {
            // ── Record ───────────────────────────────────────────────────────
            WorkspaceCommand::OpenRecord(id) => {
                self.open_record(id);
            }
            WorkspaceCommand::Reload => {
                let id = self.state.record_id.clone();
                self.open_record(id);
            }

            // ── Navigation / view ────────────────────────────────────────────
            WorkspaceCommand::SelectMedia(i) => self.state.select(i),
            WorkspaceCommand::NextMedia      => self.state.next(),
            WorkspaceCommand::PrevMedia      => self.state.prev(),
            WorkspaceCommand::ZoomAt { zoom_in, anchor } => {
                self.state.view.zoom_at(zoom_in, anchor);
            }
            WorkspaceCommand::ZoomStep { zoom_in } => {
                self.state.view.zoom_step(zoom_in);
            }
            WorkspaceCommand::PanBy(delta) => {
                self.state.view.pan_by(delta);
            }
            WorkspaceCommand::ResetZoomPan => {
                self.state.view.reset_zoom_pan();
            }
            WorkspaceCommand::SetAnnotationMode(on) => {
                self.set_annotation_mode(on);
            }
            WorkspaceCommand::ToggleAnnotationMode => {
                let on = !self.state.view.annotation_mode;
                self.set_annotation_mode(on);
            }

            // ── Reorder ──────────────────────────────────────────────────────
            WorkspaceCommand::DragStart(i) => {
                self.state.drag_start(i);
            }
            WorkspaceCommand::DragOver(i) => {
                self.state.drag.over(i);
            }
            WorkspaceCommand::DragLeave { index, pointer, bounds } => {
                self.state.drag.leave(index, pointer, bounds);
            }
            WorkspaceCommand::Drop(target) => {
                // A refused drop is already logged and leaves the order alone.
                let _ = self.state.drop_on(target);
            }
            WorkspaceCommand::DragEnd => {
                self.state.drag.end();
            }

            // ── Delete ───────────────────────────────────────────────────────
            WorkspaceCommand::RequestDelete(i) => {
                self.state.request_delete(i);
            }
            WorkspaceCommand::ConfirmDelete => {
                if let Ok(removed) = self.state.confirm_delete(now) {
                    tracing::info!(record = %self.state.record_id, "[delete] removed {}", removed.name());
                }
            }
            WorkspaceCommand::CancelDelete => {
                self.state.cancel_delete();
            }

            // ── Annotations ──────────────────────────────────────────────────
            WorkspaceCommand::SaveAnnotation(stroke) => {
                let a = self.state.add_annotation(stroke);
                tracing::info!("[annotation] saved {} on page {}", a.id, a.page_index);
            }
            WorkspaceCommand::SelectAnnotation(id) => {
                self.state.select_annotation(id);
            }

            // ── Uploads ──────────────────────────────────────────────────────
            WorkspaceCommand::PickFiles => {
                if let Some(paths) = FileDialog::new()
                    .add_filter("Media", MEDIA_EXTS)
                    .add_filter("All files", &["*"])
                    .pick_files()
                {
                    self.process_command(WorkspaceCommand::UploadFiles(paths));
                }
            }
            WorkspaceCommand::UploadFiles(paths) => {
                self.start_upload(paths, now);
            }

            // ── Status ───────────────────────────────────────────────────────
            WorkspaceCommand::DismissStatus => {
                self.state.status = None;
            }
        }
    }

    /// Swap the workspace to `id`. Anything still queued for the old record
    /// is handed to the worker first; results that come back for it later
    /// are dropped on ingest.
    fn open_record(&mut self, id: String) {
        self.flush_persist();
        self.viewer.overlay.reset();
        self.context.thumbs.clear();
        self.state = WorkspaceState::open(id);
        if self.state.record_id.is_empty() {
            self.state.loading = false;
            return;
        }
        tracing::info!("[app] opening record {}", self.state.record_id);
        self.context.media_worker.load_record(&self.state.record_id);
    }

    fn set_annotation_mode(&mut self, on: bool) {
        if on {
            self.state.drag.end();
        } else {
            self.viewer.overlay.reset();
        }
        self.state.view.annotation_mode = on;
    }

    fn start_upload(&mut self, paths: Vec<PathBuf>, now: Instant) {
        if paths.is_empty() {
            return;
        }
        if self.state.record_id.is_empty() {
            self.state.set_status("Open a record before uploading", true, now);
            return;
        }
        let files: Vec<UploadFile> = paths.into_iter().map(UploadFile::from_path).collect();
        tracing::info!(record = %self.state.record_id, "[upload] starting batch of {}", files.len());
        self.state.begin_upload(files.len());
        self.context.media_worker.upload_batch(&self.state.record_id, files);
    }

    fn flush_persist(&mut self) {
        for req in self.state.take_persist_requests() {
            self.context.media_worker.persist(&self.state.record_id, req);
        }
    }

    fn poll_media(&mut self, ctx: &egui::Context) {
        self.context.ingest_media_results(&mut self.state, ctx);
        self.flush_persist();
        self.state.expire_status(Instant::now());
    }

    fn handle_drag_and_drop(&mut self, ctx: &egui::Context) {
        let paths = dropped_paths(&ctx.input(|i| i.raw.dropped_files.clone()));
        if !paths.is_empty() {
            self.pending_cmds.push(WorkspaceCommand::UploadFiles(paths));
        }
    }

    fn status_line(&mut self, ui: &mut egui::Ui) {
        let Some(status) = &self.state.status else { return };
        let color = if status.is_error { STATUS_ERR } else { STATUS_OK };
        if ui.small_button("✕").clicked() {
            self.pending_cmds.push(WorkspaceCommand::DismissStatus);
        }
        ui.label(egui::RichText::new(&status.text).size(12.0).color(color));
    }
}

/// Local paths among files dropped on the window. Browser-style drops that
/// carry only bytes are skipped.
fn dropped_paths(files: &[egui::DroppedFile]) -> Vec<PathBuf> {
    files.iter().filter_map(|f| f.path.clone()).collect()
}

// ── eframe::App ───────────────────────────────────────────────────────────────

impl eframe::App for ProofdeskApp {
    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.flush_persist();
        self.context.media_worker.shutdown();
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_drag_and_drop(ctx);
        self.poll_media(ctx);

        egui::TopBottomPanel::top("top_panel")
            .exact_height(36.0)
            .show(ctx, |ui| {
                ui.horizontal_centered(|ui| {
                    ui.label(egui::RichText::new("◧ Proofdesk").strong().size(15.0).color(ACCENT));
                    ui.separator();
                    ui.label(egui::RichText::new("Drop files to upload").size(12.0).weak());
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        self.status_line(ui);
                    });
                });
            });

        egui::TopBottomPanel::bottom("strip_panel")
            .resizable(true)
            .min_height(120.0)
            .default_height(140.0)
            .show(ctx, |ui| {
                self.strip.ui(ui, &self.state, &mut self.context.thumbs, &mut self.pending_cmds);
            });

        egui::SidePanel::right("review_panel")
            .resizable(true)
            .default_width(260.0)
            .min_width(200.0)
            .show(ctx, |ui| {
                self.sidebar.ui(ui, &self.state, &mut self.context.thumbs, &mut self.pending_cmds);
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.viewer.ui(ui, &self.state, &mut self.context.thumbs, &mut self.pending_cmds);
        });

        // ── Process commands emitted by modules this frame ────────────────────
        let cmds: Vec<WorkspaceCommand> = self.pending_cmds.drain(..).collect();
        for cmd in cmds {
            self.process_command(cmd);
        }
        self.flush_persist();

        if self.state.loading || self.state.uploads_running > 0 || self.state.status.is_some() {
            ctx.request_repaint_after(BUSY_REPAINT);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_local_drops_become_uploads() {
        let files = vec![
            egui::DroppedFile { path: Some(PathBuf::from("/tmp/a.png")), ..Default::default() },
            egui::DroppedFile { name: "pasted.png".into(), ..Default::default() },
        ];
        assert_eq!(dropped_paths(&files), vec![PathBuf::from("/tmp/a.png")]);
    }

    #[test]
    fn picker_filter_covers_viewable_types() {
        use proofdesk_core::media_types::{kind_from_extension, MediaKind};
        for ext in MEDIA_EXTS {
            assert_ne!(kind_from_extension(&format!("x.{ext}")), MediaKind::Other, "{ext}");
        }
    }
}
