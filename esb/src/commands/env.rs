//! Environment management commands

use colored::Colorize;
use esb_config::{EnvironmentSpec, RuntimeMode};
use esb_core::{esb_println, esb_success};
use esb_messages::{msg, MESSAGES};
use tracing::info;

use crate::cli::EnvSubcommand;
use crate::error::{CliError, CliResult};
use crate::session::{OpenProject, Session};

/// Handle environment commands
pub fn handle_env_command(session: &mut Session, command: &EnvSubcommand) -> CliResult<()> {
    let project = session.open_project()?;
    match command {
        EnvSubcommand::List => handle_list(session, &project),
        EnvSubcommand::Add { spec, mode } => handle_add(project, spec, mode.as_deref()),
        EnvSubcommand::Use { name } => handle_use(session, project, name),
        EnvSubcommand::Remove { name } => handle_remove(session, project, name),
    }
}

/// Parse `name` or `name:mode`; an explicit `--mode` wins over the suffix.
pub fn parse_env_spec(spec: &str, mode_flag: Option<&str>) -> CliResult<EnvironmentSpec> {
    let (name, suffix) = match spec.split_once(':') {
        Some((name, mode)) => (name.trim(), Some(mode)),
        None => (spec.trim(), None),
    };
    if name.is_empty() {
        return Err(CliError::user(
            "environment name is required",
            Some("esb env add <name[:mode]>".to_string()),
        ));
    }
    let mode: RuntimeMode = mode_flag.or(suffix).unwrap_or_default().parse()?;
    Ok(EnvironmentSpec::new(name, mode))
}

fn handle_list(session: &Session, project: &OpenProject) -> CliResult<()> {
    if project.config.environments.is_empty() {
        esb_println!(
            "{}",
            msg!(
                MESSAGES.env_none_declared,
                path = project.generator_path().display().to_string()
            )
        );
        return Ok(());
    }
    let active = session.environment(project, true)?;
    esb_println!("{}", msg!(MESSAGES.env_list_header, project = project.key.as_str()));
    for spec in project.config.environments.iter() {
        let is_active = active.as_deref() == Some(spec.name.as_str());
        let marker = if is_active { "*" } else { " " };
        let name = if is_active {
            spec.name.green().bold()
        } else {
            spec.name.normal()
        };
        esb_println!("  {} {} ({})", marker, name, spec.mode());
    }
    Ok(())
}

fn handle_add(mut project: OpenProject, spec: &str, mode: Option<&str>) -> CliResult<()> {
    let spec = parse_env_spec(spec, mode)?;
    let (name, mode) = (spec.name.clone(), spec.mode());
    project.config.add_environment(spec).map_err(|err| match err {
        esb_core::EsbError::Validation(_) => {
            CliError::user(msg!(MESSAGES.env_already_exists, env = name.as_str()), None)
        }
        other => other.into(),
    })?;
    project.config.save_to_path(&project.generator_path())?;
    info!("Added environment {} to {}", name, project.key);
    esb_success!(
        "{}",
        msg!(MESSAGES.env_added, env = name.as_str(), mode = mode.as_str())
    );
    Ok(())
}

fn handle_use(session: &mut Session, mut project: OpenProject, name: &str) -> CliResult<()> {
    let name = name.trim();
    project.config.set_last_env(name)?;
    project.config.save_to_path(&project.generator_path())?;
    session.remember(&project, Some(name))?;

    let mode = project
        .config
        .environments
        .get(name)
        .map(EnvironmentSpec::mode)
        .unwrap_or_default();
    esb_success!(
        "{}",
        msg!(MESSAGES.env_switched, env = name, mode = mode.as_str())
    );
    Ok(())
}

fn handle_remove(session: &mut Session, mut project: OpenProject, name: &str) -> CliResult<()> {
    let name = name.trim();
    project.config.remove_environment(name).map_err(|err| match err {
        esb_core::EsbError::InvalidState(_) => CliError::user(
            MESSAGES.env_remove_last,
            Some("Add another one first: esb env add <name>".to_string()),
        ),
        other => other.into(),
    })?;
    project.config.save_to_path(&project.generator_path())?;

    let key = project.key.as_str();
    if session.global.active_environments.get(key).map(String::as_str) == Some(name) {
        session.global.active_environments.shift_remove(key);
        session.save_global()?;
    }
    esb_success!("{}", msg!(MESSAGES.env_removed, env = name));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_env_spec() {
        let spec = parse_env_spec("staging:containerd", None).unwrap();
        assert_eq!(spec.name, "staging");
        assert_eq!(spec.mode(), RuntimeMode::Containerd);

        let flagged = parse_env_spec("edge:docker", Some("fc")).unwrap();
        assert_eq!(flagged.mode(), RuntimeMode::Firecracker);

        assert_eq!(parse_env_spec("dev", None).unwrap().mode(), RuntimeMode::Docker);
        assert!(parse_env_spec(":docker", None).is_err());
        assert!(parse_env_spec("dev:vmware", None).is_err());
    }
}
