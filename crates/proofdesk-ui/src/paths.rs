// src/paths.rs
// Single source of truth for where Proofdesk keeps its files.

use std::path::PathBuf;

use directories::ProjectDirs;

/// Platform config dir (`~/.config/proofdesk`, `%APPDATA%\Proofdesk\proofdesk\config`,
/// `~/Library/Application Support/com.Proofdesk.proofdesk`). Falls back to the
/// temp dir when no home directory can be resolved.
pub fn app_config_dir() -> PathBuf {
    ProjectDirs::from("com", "Proofdesk", "proofdesk")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .unwrap_or_else(|| std::env::temp_dir().join("proofdesk"))
}

pub fn config_file() -> PathBuf {
    app_config_dir().join("config.json")
}

/// Append-only session log, next to other temp files so it survives
/// console-less launches.
pub fn log_file() -> PathBuf {
    std::env::temp_dir().join("proofdesk.log")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_file_lives_in_app_dir() {
        let file = config_file();
        assert_eq!(file.file_name().and_then(|n| n.to_str()), Some("config.json"));
        assert_eq!(file.parent(), Some(app_config_dir().as_path()));
        assert!(app_config_dir().to_string_lossy().to_lowercase().contains("proofdesk"));
    }
}
