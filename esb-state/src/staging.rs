//! Per-(project, environment) staging directories.

use esb_core::{error::Result, file_system::absolutize, user_paths};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::AmbientEnv;

pub const STAGING_DIR_VAR: &str = "ESB_STAGING_DIR";
pub const STAGING_HOME_VAR: &str = "ESB_STAGING_HOME";
const TEMPLATE_OUTPUT_DIR: &str = ".esb";

/// Directory name used for a compose project inside the staging root.
pub fn compose_project_key(compose_project: &str, env: &str) -> String {
    let project = compose_project.trim();
    if !project.is_empty() {
        return project.to_string();
    }
    let env = env.trim();
    if env.is_empty() {
        "esb".to_string()
    } else {
        format!("esb-{}", env.to_lowercase())
    }
}

fn env_key(env: &str) -> String {
    let env = env.trim();
    if env.is_empty() {
        "default".to_string()
    } else {
        env.to_lowercase()
    }
}

/// Staging root. Priority order:
/// 1. `ESB_STAGING_DIR`
/// 2. `ESB_STAGING_HOME/staging`
/// 3. `{template dir}/.esb/staging`
/// 4. `XDG_CACHE_HOME/esb/staging`, else `~/.esb/.cache/staging`
///
/// Relative overrides resolve against `base`.
pub fn staging_root(template_path: Option<&Path>, ambient: &AmbientEnv, base: &Path) -> Result<PathBuf> {
    if let Some(dir) = ambient.non_empty(STAGING_DIR_VAR) {
        return Ok(absolutize(base, Path::new(dir)));
    }
    if let Some(home) = ambient.non_empty(STAGING_HOME_VAR) {
        return Ok(absolutize(base, &Path::new(home).join("staging")));
    }
    if let Some(template_dir) = template_path.and_then(Path::parent) {
        return Ok(absolutize(base, template_dir)
            .join(TEMPLATE_OUTPUT_DIR)
            .join("staging"));
    }
    if let Some(xdg) = ambient.non_empty("XDG_CACHE_HOME") {
        return Ok(PathBuf::from(xdg).join("esb").join("staging"));
    }
    Ok(user_paths::esb_state_dir()?.join(".cache").join("staging"))
}

/// `{root}/{compose project}/{env}/config`, created if absent.
pub fn ensure_config_dir(root: &Path, compose_project: &str, env: &str) -> Result<PathBuf> {
    let dir = root
        .join(compose_project_key(compose_project, env))
        .join(env_key(env))
        .join("config");
    fs::create_dir_all(&dir)?;
    debug!("Staging config dir: {}", dir.display());
    Ok(dir)
}
