// crates/proofdesk-ui/src/helpers/format.rs
//
// UI-layer string utilities. Purely about rendering strings; nothing here
// has meaning outside a display context.

use chrono::{DateTime, Local, Utc};

/// Truncates `text` to fit within `max_px` using a per-character width
/// heuristic (11px proportional ≈ 6.5 px/char average). Appends "…" when
/// truncated. Avoids egui font measurement, which requires `&mut Fonts`.
pub fn fit_label(text: &str, max_px: f32) -> String {
    const AVG_CHAR_PX: f32 = 6.5;
    const ELLIPSIS: &str = "…";
    let max_chars = (max_px / AVG_CHAR_PX).max(0.0) as usize;
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    if max_chars == 0 {
        return String::new();
    }
    let keep = max_chars.saturating_sub(1);
    text.chars().take(keep).collect::<String>() + ELLIPSIS
}

/// Human-readable byte count: `512 B`, `1.5 KB`, `12.0 MB`.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit  = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit  += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}

/// Annotation timestamp in local time, e.g. `Mar 04, 14:05`.
pub fn format_timestamp(ts: Option<DateTime<Utc>>) -> String {
    ts.map(|t| t.with_timezone(&Local).format("%b %d, %H:%M").to_string())
        .unwrap_or_default()
}

/// Zoom factor as a percentage label.
pub fn zoom_label(zoom: f32) -> String {
    format!("{:.0}%", zoom * 100.0)
}
