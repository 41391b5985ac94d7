use esb_core::{error::Result, file_system};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::{ProjectConfig, GENERATOR_FILE};

/// Search `start` and its ancestors for a directory holding `generator.yml`.
pub fn find_project_dir(start: &Path) -> Option<PathBuf> {
    let found = file_system::find_upward(start, GENERATOR_FILE);
    match &found {
        Some(dir) => debug!("Found {} in {}", GENERATOR_FILE, dir.display()),
        None => debug!("No {} above {}", GENERATOR_FILE, start.display()),
    }
    found
}

/// Load `<dir>/generator.yml`.
pub fn load_project(dir: &Path) -> Result<ProjectConfig> {
    ProjectConfig::load_from_path(&dir.join(GENERATOR_FILE))
}
