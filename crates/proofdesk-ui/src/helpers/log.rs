// crates/proofdesk-ui/src/helpers/log.rs
//
// Unified logging for the whole process.
//
// In release builds with `windows_subsystem = "windows"` (double-click launch)
// there is no console attached, so stderr output is silently discarded.
// Every event therefore also goes to an append-only file in the OS temp
// directory, visible regardless of launch mode.
//
// File: %TEMP%\proofdesk.log (see paths::log_file)
// Filter: PROOFDESK_LOG, same syntax as RUST_LOG. Default `info`.

use std::fs::OpenOptions;
use std::sync::Mutex;

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

pub const FILTER_ENV: &str = "PROOFDESK_LOG";

fn filter() -> EnvFilter {
    EnvFilter::try_from_env(FILTER_ENV).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber. Safe to call more than once; later calls
/// are no-ops.
pub fn init() {
    let path = crate::paths::log_file();
    let file_layer = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .ok()
        .map(|f| fmt::layer().with_ansi(false).with_writer(Mutex::new(f)));

    let stderr_layer = fmt::layer().with_writer(std::io::stderr);

    let installed = tracing_subscriber::registry()
        .with(filter())
        .with(stderr_layer)
        .with(file_layer)
        .try_init();

    if installed.is_ok() {
        tracing::debug!("[log] writing to {}", path.display());
    }
}
