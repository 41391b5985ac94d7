//! On-disk build artifact probe.

use esb_core::error::{EsbError, Result};
use esb_core::file_system::contains_file_named;
use std::path::Path;

/// True when the environment's output dir holds a complete generated build: both
/// gateway configs plus at least one function Dockerfile.
pub fn has_build_artifacts(output_env_dir: &Path) -> Result<bool> {
    let config = output_env_dir.join("config");
    if !config.join("functions.yml").is_file() || !config.join("routing.yml").is_file() {
        return Ok(false);
    }
    let functions = output_env_dir.join("functions");
    contains_file_named(&functions, "Dockerfile")
        .map_err(|e| EsbError::unreachable(functions.display().to_string(), e.to_string()))
}
