//! Per-project `generator.yml`.

use esb_core::error::{EsbError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::persist;

/// Container/virtualization backend used by an environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum RuntimeMode {
    #[default]
    Docker,
    Containerd,
    Firecracker,
}

impl RuntimeMode {
    pub const ALL: [RuntimeMode; 3] = [
        RuntimeMode::Docker,
        RuntimeMode::Containerd,
        RuntimeMode::Firecracker,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RuntimeMode::Docker => "docker",
            RuntimeMode::Containerd => "containerd",
            RuntimeMode::Firecracker => "firecracker",
        }
    }

    /// Suffix of the `docker-compose.<suffix>.yml` file for this mode.
    pub fn compose_suffix(&self) -> &'static str {
        match self {
            RuntimeMode::Docker => "docker",
            RuntimeMode::Containerd => "containerd",
            RuntimeMode::Firecracker => "fc",
        }
    }
}

impl fmt::Display for RuntimeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuntimeMode {
    type Err = EsbError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "docker" => Ok(RuntimeMode::Docker),
            "containerd" => Ok(RuntimeMode::Containerd),
            "firecracker" | "fc" => Ok(RuntimeMode::Firecracker),
            other => Err(EsbError::Validation(format!(
                "unknown runtime mode '{}' (expected docker, containerd or firecracker)",
                other
            ))),
        }
    }
}

impl TryFrom<String> for RuntimeMode {
    type Error = EsbError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvironmentSpec {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<RuntimeMode>,
}

impl EnvironmentSpec {
    pub fn new(name: impl Into<String>, mode: RuntimeMode) -> Self {
        Self {
            name: name.into(),
            mode: Some(mode),
        }
    }

    /// Declared mode, `docker` when the environment was declared by name only.
    pub fn mode(&self) -> RuntimeMode {
        self.mode.unwrap_or_default()
    }
}

/// Ordered list of environments declared by a project.
///
/// Accepts three YAML shapes: a list of `{name, mode}` mappings, a list of bare names,
/// or a `name: mode` mapping. Always written back as a list of mappings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct Environments(Vec<EnvironmentSpec>);

#[derive(Deserialize)]
#[serde(untagged)]
enum EnvironmentEntryRepr {
    Name(String),
    Spec {
        name: String,
        #[serde(default)]
        mode: Option<String>,
    },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EnvironmentsRepr {
    List(Vec<EnvironmentEntryRepr>),
    Map(IndexMap<String, Option<String>>),
}

fn parse_mode<E: serde::de::Error>(raw: Option<String>) -> std::result::Result<Option<RuntimeMode>, E> {
    match raw {
        Some(value) if !value.trim().is_empty() => {
            value.parse().map(Some).map_err(E::custom)
        }
        _ => Ok(None),
    }
}

impl<'de> Deserialize<'de> for Environments {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = Option::<EnvironmentsRepr>::deserialize(deserializer)?;
        let pairs: Vec<(String, Option<String>)> = match raw {
            None => Vec::new(),
            Some(EnvironmentsRepr::Map(map)) => map.into_iter().collect(),
            Some(EnvironmentsRepr::List(list)) => list
                .into_iter()
                .map(|entry| match entry {
                    EnvironmentEntryRepr::Name(name) => (name, None),
                    EnvironmentEntryRepr::Spec { name, mode } => (name, mode),
                })
                .collect(),
        };

        let mut envs = Environments::default();
        for (name, mode) in pairs {
            let name = name.trim().to_string();
            if name.is_empty() || envs.contains(&name) {
                continue;
            }
            envs.0.push(EnvironmentSpec {
                name,
                mode: parse_mode(mode)?,
            });
        }
        Ok(envs)
    }
}

impl Environments {
    pub fn new(specs: Vec<EnvironmentSpec>) -> Self {
        Self(specs)
    }

    pub fn iter(&self) -> impl Iterator<Item = &EnvironmentSpec> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.0.iter().map(|e| e.name.clone()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&EnvironmentSpec> {
        self.0.iter().find(|e| e.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// The only declared environment, if there is exactly one.
    pub fn single(&self) -> Option<&EnvironmentSpec> {
        match self.0.as_slice() {
            [only] => Some(only),
            _ => None,
        }
    }

    pub(crate) fn push(&mut self, spec: EnvironmentSpec) {
        self.0.push(spec);
    }

    pub(crate) fn remove(&mut self, name: &str) -> Option<EnvironmentSpec> {
        let index = self.0.iter().position(|e| e.name == name)?;
        Some(self.0.remove(index))
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tag: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub last_env: String,
}

impl AppConfig {
    pub fn is_default(&self) -> bool {
        self.name.is_empty() && self.tag.is_empty() && self.last_env.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sam_template: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub output_dir: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub functions_yml: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub routing_yml: String,
}

impl PathsConfig {
    pub fn is_default(&self) -> bool {
        self.sam_template.is_empty()
            && self.output_dir.is_empty()
            && self.functions_yml.is_empty()
            && self.routing_yml.is_empty()
    }
}

/// Root of `generator.yml`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default, skip_serializing_if = "AppConfig::is_default")]
    pub app: AppConfig,

    #[serde(default, skip_serializing_if = "Environments::is_empty")]
    pub environments: Environments,

    #[serde(default, skip_serializing_if = "PathsConfig::is_default")]
    pub paths: PathsConfig,

    /// Scalar values are exported to subprocesses; nested values are ignored there.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub parameters: IndexMap<String, serde_yaml_ng::Value>,

    /// Keys owned by other tools (e.g. the generator) that must survive a rewrite.
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_yaml_ng::Value>,
}

impl ProjectConfig {
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            EsbError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml_ng::from_str(&contents)?;
        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        let yaml = serde_yaml_ng::to_string(self)?;
        persist::write_locked(path, &yaml)
    }

    /// Lowercased application name, falling back to `esb`.
    pub fn brand(&self) -> String {
        let name = self.app.name.trim();
        if name.is_empty() {
            "esb".to_string()
        } else {
            name.to_lowercase()
        }
    }

    /// Persisted last-used environment, if any.
    pub fn last_env(&self) -> Option<&str> {
        let value = self.app.last_env.trim();
        (!value.is_empty()).then_some(value)
    }

    pub fn add_environment(&mut self, spec: EnvironmentSpec) -> Result<()> {
        let name = spec.name.trim();
        if name.is_empty() {
            return Err(EsbError::Validation("environment name is required".into()));
        }
        if self.environments.contains(name) {
            return Err(EsbError::Validation(format!(
                "environment '{}' already exists",
                name
            )));
        }
        self.environments.push(EnvironmentSpec {
            name: name.to_string(),
            mode: spec.mode,
        });
        Ok(())
    }

    /// Remove an environment, keeping at least one declared and clearing the last-used
    /// marker when it pointed at the removed one.
    pub fn remove_environment(&mut self, name: &str) -> Result<EnvironmentSpec> {
        if !self.environments.contains(name) {
            return Err(EsbError::not_found(
                "environment",
                name,
                self.environments.names(),
            ));
        }
        if self.environments.len() <= 1 {
            return Err(EsbError::InvalidState(
                "cannot remove the last environment".into(),
            ));
        }
        let removed = self
            .environments
            .remove(name)
            .ok_or_else(|| EsbError::not_found("environment", name, Vec::<String>::new()))?;
        if self.app.last_env == name {
            self.app.last_env.clear();
        }
        Ok(removed)
    }

    pub fn set_last_env(&mut self, name: &str) -> Result<()> {
        if !self.environments.contains(name) {
            return Err(EsbError::not_found(
                "environment",
                name,
                self.environments.names(),
            ));
        }
        self.app.last_env = name.to_string();
        Ok(())
    }
}
