//! Context derivation: everything a command needs to target one environment.

use esb_config::{ProjectConfig, RuntimeMode, GENERATOR_FILE};
use esb_core::error::{EsbError, Result};
use esb_core::file_system::absolutize;
use esb_ports::{NetworkPlan, PortTable};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::{staging, AmbientEnv};

const DEFAULT_OUTPUT_DIR: &str = ".esb";

/// Fully derived runtime parameters for one (project, environment) pair.
///
/// For fixed inputs every field is identical across derivations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Context {
    pub project_dir: PathBuf,
    pub generator_path: PathBuf,
    pub template_path: PathBuf,
    pub output_dir: PathBuf,
    pub output_env_dir: PathBuf,
    pub config_dir: PathBuf,
    pub env: String,
    pub mode: RuntimeMode,
    pub brand: String,
    pub compose_project: String,
    pub network: NetworkPlan,
    pub ports: PortTable,
}

/// Inputs to [`derive_context`].
pub struct ContextRequest<'a> {
    /// Absolute project directory.
    pub project_dir: &'a Path,
    pub config: &'a ProjectConfig,
    pub env: &'a str,
    pub template_override: Option<&'a Path>,
    pub ambient: &'a AmbientEnv,
}

/// Lowercased brand: `app.name`, then `CLI_CMD`, then `esb`.
pub fn brand_name(config: &ProjectConfig, ambient: &AmbientEnv) -> String {
    let name = config.app.name.trim();
    if !name.is_empty() {
        return name.to_lowercase();
    }
    ambient
        .non_empty("CLI_CMD")
        .map(str::to_lowercase)
        .unwrap_or_else(|| "esb".to_string())
}

fn normalize_output_dir(raw: &str) -> &str {
    let trimmed = raw.trim().trim_end_matches(&['/', '\\'][..]);
    if trimmed.is_empty() {
        DEFAULT_OUTPUT_DIR
    } else {
        trimmed
    }
}

fn resolve_mode(config: &ProjectConfig, env: &str, ambient: &AmbientEnv) -> RuntimeMode {
    if let Some(mode) = config.environments.get(env).and_then(|spec| spec.mode) {
        return mode;
    }
    ambient
        .non_empty("ESB_MODE")
        .and_then(|raw| raw.parse().ok())
        .unwrap_or_default()
}

fn resolve_template(req: &ContextRequest<'_>) -> Result<PathBuf> {
    let template = match req.template_override {
        Some(path) => absolutize(req.project_dir, path),
        None => {
            let configured = req.config.paths.sam_template.trim();
            if configured.is_empty() {
                return Err(EsbError::Config(format!(
                    "missing paths.sam_template in {}",
                    req.project_dir.join(GENERATOR_FILE).display()
                )));
            }
            absolutize(req.project_dir, Path::new(configured))
        }
    };
    if !template.is_file() {
        return Err(EsbError::not_found(
            "template",
            template.display().to_string(),
            Vec::<String>::new(),
        ));
    }
    Ok(template)
}

/// Derive the [`Context`] for one environment.
///
/// Fails fast: an undeclared environment, a missing template or an unwritable staging
/// directory return the error and no partial context.
pub fn derive_context(req: &ContextRequest<'_>) -> Result<Context> {
    let env = req.env.trim();
    if !req.config.environments.contains(env) {
        return Err(EsbError::not_found(
            "environment",
            env,
            req.config.environments.names(),
        ));
    }

    let template_path = resolve_template(req)?;
    let output_dir = absolutize(
        req.project_dir,
        Path::new(normalize_output_dir(&req.config.paths.output_dir)),
    );
    let brand = brand_name(req.config, req.ambient);
    let compose_project = format!("{}-{}", brand, env.to_lowercase());

    let root = staging::staging_root(Some(&template_path), req.ambient, req.project_dir)?;
    let config_dir = staging::ensure_config_dir(&root, &compose_project, env)?;

    debug!("Derived context {} ({})", compose_project, template_path.display());

    Ok(Context {
        project_dir: req.project_dir.to_path_buf(),
        generator_path: req.project_dir.join(GENERATOR_FILE),
        output_env_dir: output_dir.join(env),
        output_dir,
        template_path,
        config_dir,
        env: env.to_string(),
        mode: resolve_mode(req.config, env, req.ambient),
        network: NetworkPlan::derive(&brand, env, &compose_project),
        ports: PortTable::default(),
        brand,
        compose_project,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use esb_config::{AppConfig, EnvironmentSpec, Environments, PathsConfig};
    use std::fs;
    use tempfile::TempDir;

    struct Fixture {
        _temp: TempDir,
        dir: PathBuf,
        config: ProjectConfig,
        ambient: AmbientEnv,
    }

    fn demo() -> Fixture {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("demo");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("template.yaml"), "Resources: {}\n").unwrap();

        let config = ProjectConfig {
            app: AppConfig {
                name: "Demo".into(),
                ..Default::default()
            },
            environments: Environments::new(vec![
                EnvironmentSpec::new("default", RuntimeMode::Docker),
                EnvironmentSpec::new("staging", RuntimeMode::Containerd),
            ]),
            paths: PathsConfig {
                sam_template: "template.yaml".into(),
                output_dir: ".esb/".into(),
                ..Default::default()
            },
            ..Default::default()
        };
        let ambient: AmbientEnv = [(
            staging::STAGING_DIR_VAR,
            temp.path().join("staging").display().to_string(),
        )]
        .into_iter()
        .collect();

        Fixture {
            _temp: temp,
            dir,
            config,
            ambient,
        }
    }

    fn derive(f: &Fixture, env: &str) -> Result<Context> {
        derive_context(&ContextRequest {
            project_dir: &f.dir,
            config: &f.config,
            env,
            template_override: None,
            ambient: &f.ambient,
        })
    }

    #[test]
    fn test_demo_staging_scenario() {
        let f = demo();
        let ctx = derive(&f, "staging").unwrap();

        assert_eq!(ctx.compose_project, "demo-staging");
        assert_eq!(ctx.mode, RuntimeMode::Containerd);
        assert_eq!(ctx.network.runtime_subnet.to_string(), "172.128.0.0/16");
        assert_eq!(ctx.network.external_subnet.to_string(), "172.88.0.0/16");
        assert_eq!(ctx.network.lambda_network, "demo_int_staging");
        assert_eq!(ctx.output_dir, f.dir.join(".esb"));
        assert_eq!(ctx.output_env_dir, f.dir.join(".esb/staging"));
        assert!(ctx.config_dir.ends_with("demo-staging/staging/config"));
        assert!(ctx.config_dir.is_dir());
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let f = demo();
        let first = derive(&f, "staging").unwrap();
        let second = derive(&f, "staging").unwrap();
        assert_eq!(first, second);

        let default = derive(&f, "default").unwrap();
        assert_eq!(default.network.external_subnet.to_string(), "172.50.0.0/16");
        assert_eq!(default.network.runtime_subnet.to_string(), "172.20.0.0/16");
        assert_ne!(default.network, first.network);
    }

    #[test]
    fn test_undeclared_environment_lists_candidates() {
        let f = demo();
        let err = derive(&f, "prod").unwrap_err();
        assert_eq!(err.candidates(), ["default", "staging"]);
    }

    #[test]
    fn test_missing_template_fails() {
        let mut f = demo();
        f.config.paths.sam_template = "missing.yaml".into();
        assert!(matches!(
            derive(&f, "default").unwrap_err(),
            EsbError::NotFound { ref what, .. } if what == "template"
        ));

        f.config.paths.sam_template.clear();
        assert!(matches!(derive(&f, "default").unwrap_err(), EsbError::Config(_)));
    }

    #[test]
    fn test_template_override_wins() {
        let f = demo();
        let other = f.dir.join("alt.yaml");
        fs::write(&other, "Resources: {}\n").unwrap();
        let ctx = derive_context(&ContextRequest {
            project_dir: &f.dir,
            config: &f.config,
            env: "default",
            template_override: Some(&other),
            ambient: &f.ambient,
        })
        .unwrap();
        assert_eq!(ctx.template_path, other);
    }

    #[test]
    fn test_brand_fallbacks_and_mode_from_ambient() {
        let mut f = demo();
        f.config.app.name.clear();
        f.config.environments = Environments::new(vec![EnvironmentSpec {
            name: "edge".into(),
            mode: None,
        }]);
        f.ambient.set("CLI_CMD", "Acme");
        f.ambient.set("ESB_MODE", "firecracker");

        let ctx = derive(&f, "edge").unwrap();
        assert_eq!(ctx.brand, "acme");
        assert_eq!(ctx.compose_project, "acme-edge");
        assert_eq!(ctx.mode, RuntimeMode::Firecracker);
    }
}
