//! Platform-specific directory paths.
//!
//! Uses XDG on Linux, standard locations on macOS/Windows.

use std::path::PathBuf;

use directories::ProjectDirs;

const QUALIFIER: &str = "dev";
const ORGANIZATION: &str = "tablesync";
const APPLICATION: &str = "tablesync";

/// Get project directories, or None if home directory cannot be determined.
fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION)
}

/// Get the config directory.
///
/// - Linux: `$XDG_CONFIG_HOME/tablesync` or `~/.config/tablesync`
/// - macOS: `~/Library/Application Support/dev.tablesync.tablesync`
/// - Windows: `C:\Users\<User>\AppData\Roaming\tablesync\tablesync\config`
pub fn config_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the cache directory, where logs go.
///
/// - Linux: `$XDG_CACHE_HOME/tablesync` or `~/.cache/tablesync`
/// - macOS: `~/Library/Caches/dev.tablesync.tablesync`
/// - Windows: `C:\Users\<User>\AppData\Local\tablesync\tablesync\cache`
pub fn cache_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.cache_dir().to_path_buf())
}

/// Get the path to the default config file.
pub fn config_file() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.json"))
}

/// Get the path to the log file.
pub fn log_file() -> Option<PathBuf> {
    cache_dir().map(|dir| dir.join("latest.log"))
}
