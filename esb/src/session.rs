//! Per-invocation state shared by every command: global config, ambient snapshot and
//! the resolved project/environment.

use chrono::Utc;
use esb_config::{load_project, paths, GlobalConfig, ProjectConfig, GENERATOR_FILE};
use esb_core::{esb_warning, EsbError};
use esb_messages::{msg, MESSAGES};
use esb_state::{
    derive_context, resolve_environment, resolve_selection, AmbientEnv, Context, ContextRequest,
    EnvironmentOptions, NonInteractive, Prompter, Selection, SelectionOptions,
    NO_ACTIVE_ENVIRONMENT,
};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::cli::Args;
use crate::error::{CliError, CliResult};
use crate::prompt::prompter_for;

pub struct Session {
    pub ambient: AmbientEnv,
    pub global: GlobalConfig,
    pub global_path: PathBuf,
    pub cwd: PathBuf,
    env_flag: Option<String>,
    template: Option<PathBuf>,
    project_flag: Option<String>,
    force: bool,
    prompter: Box<dyn Prompter>,
}

/// A selected project whose `generator.yml` has been loaded.
pub struct OpenProject {
    pub selection: Selection,
    pub config: ProjectConfig,
    /// Key under which the project is (or will be) registered globally.
    pub key: String,
}

impl OpenProject {
    pub fn dir(&self) -> &Path {
        &self.selection.project_dir
    }

    pub fn generator_path(&self) -> PathBuf {
        self.dir().join(GENERATOR_FILE)
    }
}

/// Registration name for a project directory: `app.name`, else the directory name.
pub fn default_project_name(config: &ProjectConfig, dir: &Path) -> String {
    let name = config.app.name.trim();
    if !name.is_empty() {
        return name.to_string();
    }
    dir.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| config.brand())
}

fn no_active_environment(config: &ProjectConfig) -> CliError {
    CliError::user(
        MESSAGES.env_no_active,
        Some(MESSAGES.env_no_active_hint.to_string()),
    )
    .with_candidates(config.environments.names())
}

fn report_discarded(discarded: Vec<EsbError>) {
    for err in discarded {
        match err {
            EsbError::Stale { what, name } => {
                esb_warning!("{}", msg!(MESSAGES.common_stale_discarded, what = what, name = name));
            }
            other => {
                esb_warning!("{}", other);
            }
        }
    }
}

impl Session {
    pub fn from_args(args: &Args) -> CliResult<Self> {
        let ambient = AmbientEnv::capture();
        let global_path = paths::global_config_path(|key| ambient.get(key))?;
        let global = GlobalConfig::load_from_path(&global_path)?;
        let prompter = prompter_for(args.no_interactive, &ambient);
        Ok(Self {
            cwd: std::env::current_dir()?,
            env_flag: args.env.clone(),
            template: args.template.clone(),
            project_flag: args.project.clone(),
            force: args.force,
            ambient,
            global,
            global_path,
            prompter,
        })
    }

    pub fn save_global(&self) -> CliResult<()> {
        self.global.save_to_path(&self.global_path)?;
        Ok(())
    }

    pub fn select(&self) -> CliResult<Selection> {
        let opts = SelectionOptions {
            template: self.template.clone(),
            project_flag: self.project_flag.clone(),
            project_env: self.ambient.non_empty("ESB_PROJECT").map(str::to_string),
            force: self.force,
        };
        let resolved = resolve_selection(&self.cwd, &self.global, &opts, self.prompter.as_ref())?;
        debug!(
            "Selected {} via {:?}",
            resolved.value.project_dir.display(),
            resolved.value.source
        );
        report_discarded(resolved.discarded);
        Ok(resolved.value)
    }

    /// Select a project and load its config; fails when the directory is not a project.
    pub fn open_project(&self) -> CliResult<OpenProject> {
        let selection = self.select()?;
        if !selection.project_dir.join(GENERATOR_FILE).is_file() {
            return Err(CliError::user(
                msg!(
                    MESSAGES.common_not_a_project,
                    dir = selection.project_dir.display().to_string()
                ),
                Some(MESSAGES.common_not_a_project_hint.to_string()),
            ));
        }
        let config = load_project(&selection.project_dir)?;
        let key = selection
            .project_name
            .clone()
            .unwrap_or_else(|| default_project_name(&config, &selection.project_dir));
        Ok(OpenProject {
            selection,
            config,
            key,
        })
    }

    /// Environment for `project`. With `allow_missing`, `None` instead of an error and no
    /// interactive choice.
    pub fn environment(&self, project: &OpenProject, allow_missing: bool) -> CliResult<Option<String>> {
        let opts = EnvironmentOptions {
            flag: self.env_flag.clone(),
            env_var: self.ambient.non_empty("ESB_ENV").map(str::to_string),
            global_last: self.global.active_environments.get(&project.key).cloned(),
            force: self.force,
            allow_missing,
        };
        let prompter: &dyn Prompter = if allow_missing {
            &NonInteractive
        } else {
            self.prompter.as_ref()
        };
        let resolved =
            resolve_environment(&project.config, &opts, prompter).map_err(|err| match err {
                EsbError::NotFound { ref name, .. } if name == NO_ACTIVE_ENVIRONMENT => {
                    no_active_environment(&project.config)
                }
                other => CliError::from(other),
            })?;
        report_discarded(resolved.discarded);
        Ok(resolved.value.map(|(name, source)| {
            debug!("Environment {} via {:?}", name, source);
            name
        }))
    }

    pub fn context(&self, project: &OpenProject, env: &str) -> CliResult<Context> {
        let ctx = derive_context(&ContextRequest {
            project_dir: project.dir(),
            config: &project.config,
            env,
            template_override: project.selection.template_override.as_deref(),
            ambient: &self.ambient,
        })?;
        Ok(ctx)
    }

    /// Project, environment and context in one step, for commands that need all three.
    pub fn resolve(&self) -> CliResult<(OpenProject, Context)> {
        let project = self.open_project()?;
        let env = self
            .environment(&project, false)?
            .ok_or_else(|| no_active_environment(&project.config))?;
        let ctx = self.context(&project, &env)?;
        Ok((project, ctx))
    }

    /// Ask before a destructive step; `None` when prompting is disabled.
    pub fn confirm(&self, prompt: &str) -> CliResult<Option<bool>> {
        Ok(self.prompter.confirm(prompt)?)
    }

    /// Record `project` (and optionally `env`) as the active selection.
    pub fn remember(&mut self, project: &OpenProject, env: Option<&str>) -> CliResult<()> {
        self.global.touch_project(&project.key, project.dir(), Utc::now());
        self.global.set_active(&project.key, env);
        self.save_global()
    }
}
