//! Environment selection within a project.

use esb_config::ProjectConfig;
use esb_core::error::{EsbError, Result};
use tracing::debug;

use crate::prompt::Prompter;
use crate::selection::{confirm_discard, Resolved};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvironmentSource {
    Flag,
    EnvVar,
    LastUsed,
    Single,
    Interactive,
}

#[derive(Debug, Default, Clone)]
pub struct EnvironmentOptions {
    /// `--env`; must be declared.
    pub flag: Option<String>,
    /// `ESB_ENV`; an undeclared value may be discarded.
    pub env_var: Option<String>,
    /// Last environment recorded for the project in the global config.
    pub global_last: Option<String>,
    pub force: bool,
    /// Display-only commands accept "no environment".
    pub allow_missing: bool,
}

/// Placeholder name carried by the error returned when nothing selects an environment.
pub const NO_ACTIVE_ENVIRONMENT: &str = "(no active environment)";

fn no_active_environment(config: &ProjectConfig) -> EsbError {
    EsbError::not_found(
        "environment",
        NO_ACTIVE_ENVIRONMENT,
        config.environments.names(),
    )
}

/// Pick the environment a command applies to.
///
/// Order: `--env`, `ESB_ENV`, the persisted last-used environment, the only declared
/// environment, an interactive choice. Returns `None` only with `allow_missing`.
pub fn resolve_environment(
    config: &ProjectConfig,
    opts: &EnvironmentOptions,
    prompter: &dyn Prompter,
) -> Result<Resolved<Option<(String, EnvironmentSource)>>> {
    let mut discarded = Vec::new();
    let found = |name: &str, source| Resolved {
        value: Some((name.to_string(), source)),
        discarded: Vec::new(),
    };

    if config.environments.is_empty() {
        if opts.allow_missing {
            return Ok(Resolved {
                value: None,
                discarded,
            });
        }
        return Err(EsbError::InvalidState(
            "no environments declared; add one with `esb env add <name>`".into(),
        ));
    }

    if let Some(flag) = opts.flag.as_deref().map(str::trim) {
        if config.environments.contains(flag) {
            return Ok(found(flag, EnvironmentSource::Flag));
        }
        return Err(EsbError::not_found(
            "environment",
            flag,
            config.environments.names(),
        ));
    }

    if let Some(var) = opts.env_var.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        if config.environments.contains(var) {
            return Ok(found(var, EnvironmentSource::EnvVar));
        }
        confirm_discard(
            "environment",
            var,
            config.environments.names(),
            opts.force,
            prompter,
        )?;
        discarded.push(EsbError::stale("ESB_ENV", var));
    }

    let persisted = config
        .last_env()
        .map(str::to_string)
        .into_iter()
        .chain(opts.global_last.clone());
    for last in persisted {
        if config.environments.contains(&last) {
            let mut resolved = found(&last, EnvironmentSource::LastUsed);
            resolved.discarded = discarded;
            return Ok(resolved);
        }
        debug!("Last-used environment '{}' is no longer declared", last);
        discarded.push(EsbError::stale("last-used environment", last));
    }

    if let Some(only) = config.environments.single() {
        let mut resolved = found(&only.name, EnvironmentSource::Single);
        resolved.discarded = discarded;
        return Ok(resolved);
    }

    let names = config.environments.names();
    if let Some(choice) = prompter.choose_environment(&names)? {
        if config.environments.contains(&choice) {
            let mut resolved = found(&choice, EnvironmentSource::Interactive);
            resolved.discarded = discarded;
            return Ok(resolved);
        }
    }

    if opts.allow_missing {
        return Ok(Resolved {
            value: None,
            discarded,
        });
    }
    Err(no_active_environment(config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::{NonInteractive, Scripted};
    use esb_config::{AppConfig, EnvironmentSpec, Environments, RuntimeMode};

    fn config(names: &[&str], last: &str) -> ProjectConfig {
        ProjectConfig {
            app: AppConfig {
                last_env: last.to_string(),
                ..Default::default()
            },
            environments: Environments::new(
                names
                    .iter()
                    .map(|n| EnvironmentSpec::new(*n, RuntimeMode::Docker))
                    .collect(),
            ),
            ..Default::default()
        }
    }

    fn pick(cfg: &ProjectConfig, opts: &EnvironmentOptions) -> Result<Option<String>> {
        resolve_environment(cfg, opts, &NonInteractive).map(|r| r.value.map(|(name, _)| name))
    }

    #[test]
    fn test_flag_beats_everything() {
        let cfg = config(&["default", "staging"], "default");
        let opts = EnvironmentOptions {
            flag: Some("staging".into()),
            env_var: Some("default".into()),
            ..Default::default()
        };
        assert_eq!(pick(&cfg, &opts).unwrap().as_deref(), Some("staging"));
    }

    #[test]
    fn test_unknown_flag_is_not_found_even_with_force() {
        let cfg = config(&["default", "staging"], "");
        let opts = EnvironmentOptions {
            flag: Some("prod".into()),
            force: true,
            ..Default::default()
        };
        let err = pick(&cfg, &opts).unwrap_err();
        assert_eq!(err.candidates(), ["default", "staging"]);
    }

    #[test]
    fn test_env_var_beats_last_used() {
        let cfg = config(&["default", "staging"], "default");
        let opts = EnvironmentOptions {
            env_var: Some("staging".into()),
            ..Default::default()
        };
        assert_eq!(pick(&cfg, &opts).unwrap().as_deref(), Some("staging"));
    }

    #[test]
    fn test_stale_env_var_with_force_falls_through() {
        let cfg = config(&["default", "staging"], "staging");
        let opts = EnvironmentOptions {
            env_var: Some("removed".into()),
            force: true,
            ..Default::default()
        };
        let resolved = resolve_environment(&cfg, &opts, &NonInteractive).unwrap();
        assert_eq!(
            resolved.value,
            Some(("staging".to_string(), EnvironmentSource::LastUsed))
        );
        assert_eq!(resolved.discarded.len(), 1);

        let strict = EnvironmentOptions {
            force: false,
            ..opts
        };
        assert!(matches!(
            pick(&cfg, &strict).unwrap_err(),
            EsbError::NotFound { .. }
        ));
    }

    #[test]
    fn test_stale_last_env_falls_back_to_global_then_single() {
        let cfg = config(&["default", "staging"], "removed");
        let opts = EnvironmentOptions {
            global_last: Some("default".into()),
            ..Default::default()
        };
        assert_eq!(pick(&cfg, &opts).unwrap().as_deref(), Some("default"));

        let single = config(&["only"], "removed");
        let resolved = resolve_environment(&single, &EnvironmentOptions::default(), &NonInteractive)
            .unwrap();
        assert_eq!(
            resolved.value,
            Some(("only".to_string(), EnvironmentSource::Single))
        );
        assert_eq!(resolved.discarded.len(), 1);
    }

    #[test]
    fn test_interactive_choice_when_ambiguous() {
        let cfg = config(&["default", "staging"], "");
        let resolved = resolve_environment(
            &cfg,
            &EnvironmentOptions::default(),
            &Scripted::choosing("staging"),
        )
        .unwrap();
        assert_eq!(
            resolved.value,
            Some(("staging".to_string(), EnvironmentSource::Interactive))
        );
    }

    #[test]
    fn test_no_active_environment() {
        let cfg = config(&["default", "staging"], "");
        let err = pick(&cfg, &EnvironmentOptions::default()).unwrap_err();
        assert_eq!(err.candidates(), ["default", "staging"]);

        let display_only = EnvironmentOptions {
            allow_missing: true,
            ..Default::default()
        };
        assert_eq!(pick(&cfg, &display_only).unwrap(), None);
    }

    #[test]
    fn test_project_without_environments() {
        let cfg = config(&[], "");
        assert!(matches!(
            pick(&cfg, &EnvironmentOptions::default()).unwrap_err(),
            EsbError::InvalidState(_)
        ));
        let display_only = EnvironmentOptions {
            allow_missing: true,
            ..Default::default()
        };
        assert_eq!(pick(&cfg, &display_only).unwrap(), None);
    }
}
