//! Configuration paths and input path resolution

use std::path::{Path, PathBuf};

/// Name used for the configuration directory
const APP_NAME: &str = "smokehouse";

/// Directory the harness was built from
///
/// Default base for module-relative inputs (`smoke/`) and timing data
/// (`.tmp/timing-data`).
pub fn crate_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

/// Get the configuration directory path
///
/// Uses the directories crate for platform-appropriate locations:
/// - Linux: `~/.config/smokehouse/`
/// - macOS: `~/Library/Application Support/smokehouse/`
/// - Windows: `%APPDATA%\smokehouse\`
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the configuration file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}

/// Resolve a user-supplied input path
///
/// Absolute paths are used as-is. Relative paths are tried against `base`
/// first and fall back to the current working directory.
pub fn resolve_input(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }

    let module_relative = base.join(path);
    if module_relative.exists() {
        return module_relative;
    }

    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Replace every non-alphanumeric character with `_`
pub fn sanitize_component(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}
