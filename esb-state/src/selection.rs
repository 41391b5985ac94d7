//! Project selection.
//!
//! Precedence, first match wins:
//! 1. explicit template path (its directory becomes the project)
//! 2. explicit project name (`--project`, then `ESB_PROJECT`)
//! 3. `generator.yml` found searching upward from the working directory
//! 4. persisted active project
//! 5. most recently used registered project that is still valid
//! 6. the working directory itself
//!
//! Persisted values are checked by [`validate_entry`] before they enter the chain, so
//! a stale value is skipped instead of failing the command.

use esb_config::{find_project_dir, GlobalConfig, ProjectEntry};
use esb_core::error::{EsbError, Result};
use esb_core::file_system::absolutize;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::prompt::Prompter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionSource {
    Template,
    ExplicitProject,
    WorkingTree,
    ActiveProject,
    MostRecent,
    CurrentDir,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub project_dir: PathBuf,
    pub template_override: Option<PathBuf>,
    /// Registered name, when the directory belongs to a registered project.
    pub project_name: Option<String>,
    pub source: SelectionSource,
}

/// Outcome of resolution plus any persisted or ambient values that were dropped.
#[derive(Debug)]
pub struct Resolved<T> {
    pub value: T,
    pub discarded: Vec<EsbError>,
}

#[derive(Debug, Default, Clone)]
pub struct SelectionOptions {
    pub template: Option<PathBuf>,
    /// `--project` flag; must match a registered, valid project.
    pub project_flag: Option<String>,
    /// `ESB_PROJECT`; may be discarded with `force` or after confirmation.
    pub project_env: Option<String>,
    pub force: bool,
}

/// A registered project whose directory still holds a config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidProject<'a> {
    pub name: &'a str,
    pub dir: &'a Path,
}

pub fn validate_entry<'a>(name: &'a str, entry: &'a ProjectEntry) -> Option<ValidProject<'a>> {
    entry.is_valid().then_some(ValidProject {
        name,
        dir: entry.path.as_path(),
    })
}

fn valid_project<'a>(global: &'a GlobalConfig, name: &str) -> Option<ValidProject<'a>> {
    let (name, entry) = global.projects.get_key_value(name)?;
    validate_entry(name, entry)
}

fn registered(project: ValidProject<'_>, source: SelectionSource) -> Selection {
    Selection {
        project_dir: project.dir.to_path_buf(),
        template_override: None,
        project_name: Some(project.name.to_string()),
        source,
    }
}

/// Decide whether to drop an ambient or persisted value that failed validation.
///
/// With `force` it is dropped silently. Otherwise the user is asked; a refusal (or no
/// terminal) turns it into a `NotFound` error listing the valid names.
pub(crate) fn confirm_discard(
    what: &str,
    name: &str,
    candidates: Vec<String>,
    force: bool,
    prompter: &dyn Prompter,
) -> Result<()> {
    if force {
        debug!("Discarding {} '{}' (--force)", what, name);
        return Ok(());
    }
    if prompter.confirm_discard(what, name)? {
        return Ok(());
    }
    Err(EsbError::not_found(what, name, candidates))
}

pub fn resolve_selection(
    start_dir: &Path,
    global: &GlobalConfig,
    opts: &SelectionOptions,
    prompter: &dyn Prompter,
) -> Result<Resolved<Selection>> {
    let mut discarded = Vec::new();

    if let Some(template) = &opts.template {
        let template = absolutize(start_dir, template);
        if !template.is_file() {
            return Err(EsbError::not_found(
                "template",
                template.display().to_string(),
                Vec::<String>::new(),
            ));
        }
        let project_dir = template
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| start_dir.to_path_buf());
        return Ok(Resolved {
            value: Selection {
                project_name: global.project_for_dir(&project_dir).map(str::to_string),
                project_dir,
                template_override: Some(template),
                source: SelectionSource::Template,
            },
            discarded,
        });
    }

    if let Some(name) = opts.project_flag.as_deref() {
        return match valid_project(global, name) {
            Some(project) => Ok(Resolved {
                value: registered(project, SelectionSource::ExplicitProject),
                discarded,
            }),
            None => Err(EsbError::not_found("project", name, global.project_names())),
        };
    }

    if let Some(name) = opts.project_env.as_deref() {
        match valid_project(global, name) {
            Some(project) => {
                return Ok(Resolved {
                    value: registered(project, SelectionSource::ExplicitProject),
                    discarded,
                })
            }
            None => {
                confirm_discard("project", name, global.project_names(), opts.force, prompter)?;
                discarded.push(EsbError::stale("ESB_PROJECT", name));
            }
        }
    }

    if let Some(dir) = find_project_dir(start_dir) {
        return Ok(Resolved {
            value: Selection {
                project_name: global.project_for_dir(&dir).map(str::to_string),
                project_dir: dir,
                template_override: None,
                source: SelectionSource::WorkingTree,
            },
            discarded,
        });
    }

    if let Some(name) = global.active_project.as_deref() {
        match valid_project(global, name) {
            Some(project) => {
                return Ok(Resolved {
                    value: registered(project, SelectionSource::ActiveProject),
                    discarded,
                })
            }
            None => {
                debug!("Active project '{}' is stale", name);
                discarded.push(EsbError::stale("active project", name));
            }
        }
    }

    for (name, entry) in global.projects_by_recency() {
        if let Some(project) = validate_entry(name, entry) {
            return Ok(Resolved {
                value: registered(project, SelectionSource::MostRecent),
                discarded,
            });
        }
        if global.active_project.as_deref() != Some(name) {
            discarded.push(EsbError::stale("recent project", name));
        }
    }

    Ok(Resolved {
        value: Selection {
            project_dir: start_dir.to_path_buf(),
            template_override: None,
            project_name: None,
            source: SelectionSource::CurrentDir,
        },
        discarded,
    })
}
