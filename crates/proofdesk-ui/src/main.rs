#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod app;
mod config;
mod context;
mod helpers;
mod modules;
mod paths;
mod theme;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

fn main() -> eframe::Result {
    helpers::log::init();
    ffmpeg_the_third::init().expect("FFmpeg init failed");

    let config = config::AppConfig::load();
    if !config.remote().is_configured() {
        tracing::warn!("[app] no api_url/api_key configured; uploads and saves will fail");
    }

    let native_options = eframe::NativeOptions {
        centered: true,
        viewport: egui::ViewportBuilder::default()
            .with_title("Proofdesk")
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([900.0, 600.0])
            .with_resizable(true),
        ..Default::default()
    };

    eframe::run_native(
        "Proofdesk",
        native_options,
        Box::new(move |cc| Ok(Box::new(app::ProofdeskApp::new(cc, config)))),
    )
}
