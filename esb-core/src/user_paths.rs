//! Per-user directories used by the esb tool.

use crate::error::{EsbError, Result};
use std::path::PathBuf;

/// Get the user's home directory.
#[must_use = "home directory path should be used"]
pub fn home_dir() -> Result<PathBuf> {
    dirs::home_dir().ok_or_else(|| EsbError::Config("could not determine home directory".into()))
}

/// Get the esb state directory.
///
/// Returns:
/// - Linux/macOS: `~/.esb`
/// - Windows: `%USERPROFILE%\.esb`
#[must_use = "state directory path should be used"]
pub fn esb_state_dir() -> Result<PathBuf> {
    Ok(home_dir()?.join(".esb"))
}

/// Get the default global configuration path: `~/.esb/config.yaml`.
#[must_use = "global configuration path should be used"]
pub fn default_global_config_path() -> Result<PathBuf> {
    Ok(esb_state_dir()?.join("config.yaml"))
}
