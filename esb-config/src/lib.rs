//! Configuration for the esb CLI.
//!
//! Two files are involved: the per-project `generator.yml` (environments, paths,
//! parameters) and the per-user global config (registered projects and the active
//! selection).

pub mod global_config;
pub mod loader;
pub mod paths;
pub mod persist;
pub mod project_config;

pub use global_config::{GlobalConfig, ProjectEntry};
pub use loader::{find_project_dir, load_project};
pub use project_config::{
    AppConfig, EnvironmentSpec, Environments, PathsConfig, ProjectConfig, RuntimeMode,
};

/// File name of the per-project declarative config.
pub const GENERATOR_FILE: &str = "generator.yml";
