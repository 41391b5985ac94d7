//! Global configuration shared by every project on the machine.
//!
//! Stored at `~/.esb/config.yaml` (see [`crate::paths::global_config_path`]). It records
//! registered projects, the active project, and the last environment used per project.

use chrono::{DateTime, Utc};
use esb_core::error::Result;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::{persist, GENERATOR_FILE};

pub const CURRENT_VERSION: u32 = 1;

/// A registered project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectEntry {
    /// Absolute project directory.
    pub path: PathBuf,

    /// Unparseable timestamps load as `None` rather than failing the whole file.
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_used: Option<DateTime<Utc>>,
}

fn lenient_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<DateTime<Utc>>, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| {
        DateTime::parse_from_rfc3339(value.trim())
            .ok()
            .map(|ts| ts.with_timezone(&Utc))
    }))
}

impl ProjectEntry {
    pub fn new(path: impl Into<PathBuf>, last_used: Option<DateTime<Utc>>) -> Self {
        Self {
            path: path.into(),
            last_used,
        }
    }

    pub fn generator_path(&self) -> PathBuf {
        self.path.join(GENERATOR_FILE)
    }

    /// The recorded directory still holds a project config.
    pub fn is_valid(&self) -> bool {
        self.generator_path().is_file()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub version: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_project: Option<String>,

    /// Project name → last environment used in that project.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub active_environments: IndexMap<String, String>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub projects: IndexMap<String, ProjectEntry>,

    #[serde(flatten)]
    pub extra: IndexMap<String, serde_yaml_ng::Value>,
}

impl GlobalConfig {
    /// Load from a specific path. A missing file yields an empty config; nothing is
    /// written until the caller saves.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No global config at {}, using defaults", path.display());
            let mut config = Self::default();
            config.normalize();
            return Ok(config);
        }
        let contents = std::fs::read_to_string(path)?;
        let mut config: Self = if contents.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml_ng::from_str(&contents)?
        };
        config.normalize();
        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        let yaml = serde_yaml_ng::to_string(self)?;
        persist::write_locked(path, &yaml)
    }

    pub fn normalize(&mut self) {
        if self.version == 0 {
            self.version = CURRENT_VERSION;
        }
        if self
            .active_project
            .as_deref()
            .is_some_and(|name| name.trim().is_empty())
        {
            self.active_project = None;
        }
    }

    pub fn project_names(&self) -> Vec<String> {
        self.projects.keys().cloned().collect()
    }

    pub fn project(&self, name: &str) -> Option<&ProjectEntry> {
        self.projects.get(name)
    }

    /// Name of the project registered at `dir`, if any.
    pub fn project_for_dir(&self, dir: &Path) -> Option<&str> {
        self.projects
            .iter()
            .find(|(_, entry)| entry.path == dir)
            .map(|(name, _)| name.as_str())
    }

    /// Most recently used project. Ties go to the lexically smaller name; entries
    /// without a timestamp rank below any timestamped entry.
    pub fn most_recent(&self) -> Option<(&str, &ProjectEntry)> {
        self.projects
            .iter()
            .max_by(|(a_name, a), (b_name, b)| {
                a.last_used
                    .cmp(&b.last_used)
                    .then_with(|| b_name.cmp(a_name))
            })
            .map(|(name, entry)| (name.as_str(), entry))
    }

    /// Projects ordered from most to least recently used.
    pub fn projects_by_recency(&self) -> Vec<(&str, &ProjectEntry)> {
        let mut entries: Vec<_> = self
            .projects
            .iter()
            .map(|(name, entry)| (name.as_str(), entry))
            .collect();
        entries.sort_by(|(a_name, a), (b_name, b)| {
            b.last_used.cmp(&a.last_used).then_with(|| a_name.cmp(b_name))
        });
        entries
    }

    /// Register or refresh a project entry.
    pub fn touch_project(&mut self, name: &str, path: &Path, now: DateTime<Utc>) {
        self.projects
            .insert(name.to_string(), ProjectEntry::new(path, Some(now)));
    }

    pub fn set_active(&mut self, project: &str, env: Option<&str>) {
        self.active_project = Some(project.to_string());
        if let Some(env) = env {
            self.active_environments
                .insert(project.to_string(), env.to_string());
        }
    }

    /// Unregister a project and every selection that refers to it.
    pub fn remove_project(&mut self, name: &str) -> Option<ProjectEntry> {
        let removed = self.projects.shift_remove(name)?;
        self.active_environments.shift_remove(name);
        if self.active_project.as_deref() == Some(name) {
            self.active_project = None;
        }
        Some(removed)
    }
}
