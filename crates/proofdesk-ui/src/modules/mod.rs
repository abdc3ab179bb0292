// crates/proofdesk-ui/src/modules/mod.rs
//
// Module registry. To add a new panel:
//   1. Create modules/mypanel.rs implementing WorkspaceModule
//   2. Add `pub mod mypanel;` below
//   3. Add a field for it on ProofdeskApp and call ui() from update()

pub mod overlay;
pub mod sidebar;
pub mod strip;
pub mod viewer;

use std::collections::{HashMap, HashSet};

use egui::{Context, TextureHandle, Ui};

use proofdesk_core::commands::WorkspaceCommand;
use proofdesk_core::media_types::{MediaItem, MediaKind};
use proofdesk_core::state::WorkspaceState;
use proofdesk_media::encode::decode_data_url;

/// Textures for inline `data:` posters, keyed by the URL itself. Remote
/// images go through egui's own URI loaders and are not held here.
#[derive(Default)]
pub struct ThumbnailCache {
    textures: HashMap<String, TextureHandle>,
    failed:   HashSet<String>,
}

impl ThumbnailCache {
    fn inline(&mut self, ctx: &Context, url: &str) -> Option<TextureHandle> {
        if let Some(tex) = self.textures.get(url) {
            return Some(tex.clone());
        }
        if self.failed.contains(url) {
            return None;
        }
        match decode_data_url(url) {
            Ok(frame) => {
                let tex = ctx.load_texture(
                    format!("poster-{}", self.textures.len()),
                    egui::ColorImage::from_rgba_unmultiplied(
                        [frame.width as usize, frame.height as usize], &frame.data,
                    ),
                    egui::TextureOptions::LINEAR,
                );
                self.textures.insert(url.to_string(), tex.clone());
                Some(tex)
            }
            Err(e) => {
                tracing::warn!("[ui] inline poster: {e}");
                self.failed.insert(url.to_string());
                None
            }
        }
    }

    /// An image widget for `url`, or `None` when there is nothing drawable.
    pub fn image(&mut self, ctx: &Context, url: &str) -> Option<egui::Image<'static>> {
        if url.starts_with("data:") {
            let tex = self.inline(ctx, url)?;
            Some(egui::Image::from_texture(egui::load::SizedTexture::from_handle(&tex)))
        } else {
            Some(egui::Image::from_uri(url.to_string()))
        }
    }

    /// The picture that stands for `item`: the image itself, a video's
    /// poster, nothing for documents and attachments.
    pub fn preview(&mut self, ctx: &Context, item: &MediaItem) -> Option<egui::Image<'static>> {
        match item.kind() {
            MediaKind::Image => self.image(ctx, item.url()),
            MediaKind::Video => item.thumbnail().and_then(|t| self.image(ctx, t)),
            MediaKind::Document | MediaKind::Other => None,
        }
    }

    pub fn clear(&mut self) {
        self.textures.clear();
        self.failed.clear();
    }
}

pub fn kind_icon(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Image    => "🖼",
        MediaKind::Video    => "🎬",
        MediaKind::Document => "📄",
        MediaKind::Other    => "📎",
    }
}

/// Every workspace panel implements this trait.
/// Modules read state and emit commands; they never mutate state directly.
pub trait WorkspaceModule {
    fn name(&self) -> &str;
    fn ui(
        &mut self,
        ui:     &mut Ui,
        state:  &WorkspaceState,
        thumbs: &mut ThumbnailCache,
        cmd:    &mut Vec<WorkspaceCommand>,
    );
}
