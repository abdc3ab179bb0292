// src/theme.rs
use egui::{Color32, Context, CornerRadius, Stroke, Style, Visuals};

// ── Palette ──────────────────────────────────────────────────────────────────
pub const ACCENT:          Color32 = Color32::from_rgb( 86, 156, 255);
pub const ACCENT_DIM:      Color32 = Color32::from_rgb( 46,  96, 170);

pub const BG_CANVAS:       Color32 = Color32::from_rgb( 12,  13,  16);
pub const BG_PANEL:        Color32 = Color32::from_rgb( 22,  23,  28);
pub const BG_CARD:         Color32 = Color32::from_rgb( 32,  34,  41);
pub const BG_CARD_HOVER:   Color32 = Color32::from_rgb( 44,  47,  57);

pub const TEXT:            Color32 = Color32::from_rgb(222, 224, 232);
pub const TEXT_DIM:        Color32 = Color32::from_rgb(126, 130, 146);
pub const BORDER:          Color32 = Color32::from_rgb( 58,  61,  74);

/// Saved annotation strokes.
pub const ANNOTATION:      Color32 = Color32::from_rgb(255, 215,   0);
pub const ANNOTATION_HI:   Color32 = Color32::from_rgb(255,  96,  64);
/// The stroke being drawn.
pub const STROKE_LIVE:     Color32 = Color32::from_rgb(255,  64,  64);
pub const ANNOTATION_W:    f32     = 4.0;
pub const ANNOTATION_ALPHA: f32    = 0.8;

pub const DROP_TARGET:     Color32 = Color32::from_rgb( 86, 156, 255);
pub const STATUS_OK:       Color32 = Color32::from_rgb( 72, 180, 112);
pub const STATUS_ERR:      Color32 = Color32::from_rgb(222,  84,  84);

pub fn configure_style(ctx: &Context) {
    let mut style = Style::default();

    style.spacing.item_spacing     = egui::vec2(6.0, 6.0);
    style.spacing.window_margin    = egui::Margin::same(12);
    style.spacing.button_padding   = egui::vec2(10.0, 5.0);
    style.spacing.scroll.bar_width = 8.0;

    let cr = CornerRadius::same(5);

    let mut v = Visuals::dark();
    v.panel_fill       = BG_PANEL;
    v.window_fill      = BG_CARD;
    v.extreme_bg_color = BG_CANVAS;
    v.window_stroke    = Stroke::new(1.0, BORDER);
    v.selection.bg_fill = ACCENT_DIM;
    v.selection.stroke  = Stroke::new(1.0, ACCENT);
    v.hyperlink_color   = ACCENT;

    for w in [&mut v.widgets.noninteractive, &mut v.widgets.inactive] {
        w.bg_fill       = BG_CARD;
        w.bg_stroke     = Stroke::new(1.0, BORDER);
        w.corner_radius = cr;
    }
    v.widgets.noninteractive.fg_stroke = Stroke::new(1.0, TEXT_DIM);
    v.widgets.inactive.fg_stroke       = Stroke::new(1.0, TEXT);

    v.widgets.hovered.bg_fill       = BG_CARD_HOVER;
    v.widgets.hovered.bg_stroke     = Stroke::new(1.0, ACCENT_DIM);
    v.widgets.hovered.fg_stroke     = Stroke::new(1.5, TEXT);
    v.widgets.hovered.corner_radius = cr;

    v.widgets.active.bg_fill       = ACCENT_DIM;
    v.widgets.active.bg_stroke     = Stroke::new(1.0, ACCENT);
    v.widgets.active.fg_stroke     = Stroke::new(2.0, Color32::WHITE);
    v.widgets.active.corner_radius = cr;

    v.override_text_color = Some(TEXT);
    v.window_corner_radius = cr;

    style.visuals = v;
    ctx.set_style(style);
}
