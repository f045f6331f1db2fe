//! Platform directories for config, data and log files.
//!
//! Resolved through `directories::ProjectDirs`, so Linux follows the XDG Base
//! Directory layout (`~/.config/polaris`, `~/.local/share/polaris`, ...).

use crate::error::ApiError;
use directories::ProjectDirs;
use std::path::PathBuf;

fn project_dirs() -> Result<ProjectDirs, ApiError> {
    ProjectDirs::from("", "polaris", "polaris").ok_or_else(|| {
        ApiError::ConfigError("Could not determine platform directories (HOME not set)".to_string())
    })
}

/// `<config dir>/config.toml`
pub fn global_config_path() -> Option<PathBuf> {
    project_dirs()
        .ok()
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

/// `<data dir>/store`
pub fn default_store_path() -> Result<PathBuf, ApiError> {
    Ok(project_dirs()?.data_dir().join("store"))
}

/// `<state dir>/polaris.log`, falling back to the data dir on platforms
/// without a state directory.
pub fn default_log_path() -> Result<PathBuf, ApiError> {
    let dirs = project_dirs()?;
    let dir = dirs
        .state_dir()
        .unwrap_or_else(|| dirs.data_dir())
        .to_path_buf();
    Ok(dir.join("polaris.log"))
}
