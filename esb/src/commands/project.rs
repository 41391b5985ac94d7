//! Project registry commands

use chrono::Utc;
use colored::Colorize;
use esb_config::{load_project, GENERATOR_FILE};
use esb_core::file_system::absolutize;
use esb_core::{esb_println, esb_success, EsbError};
use esb_messages::{msg, MESSAGES};
use esb_state::selection::validate_entry;

use crate::cli::ProjectSubcommand;
use crate::error::{CliError, CliResult};
use crate::session::{default_project_name, Session};

pub fn handle_project_command(session: &mut Session, command: &ProjectSubcommand) -> CliResult<()> {
    match command {
        ProjectSubcommand::List => handle_list(session),
        ProjectSubcommand::Add { dir, name } => {
            let dir = dir
                .as_deref()
                .map(|d| absolutize(&session.cwd, d))
                .unwrap_or_else(|| session.cwd.clone());
            handle_add(session, &dir, name.as_deref())
        }
        ProjectSubcommand::Use { name } => handle_use(session, name),
        ProjectSubcommand::Remove { name } => handle_remove(session, name),
        ProjectSubcommand::Recent => handle_recent(session),
    }
}

fn none_registered() -> CliError {
    CliError::user(
        MESSAGES.project_none_registered,
        Some(MESSAGES.project_none_registered_hint.to_string()),
    )
}

fn handle_list(session: &Session) -> CliResult<()> {
    let projects = session.global.projects_by_recency();
    if projects.is_empty() {
        esb_println!("{}", MESSAGES.project_none_registered);
        return Ok(());
    }
    esb_println!("{}", MESSAGES.project_list_header);
    for (name, entry) in projects {
        let active = session.global.active_project.as_deref() == Some(name);
        let marker = if active { "*" } else { " " };
        let last_used = entry
            .last_used
            .map(|ts| ts.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "never".to_string());
        let status = if validate_entry(name, entry).is_some() {
            String::new()
        } else {
            format!(" {}", "(missing)".red())
        };
        esb_println!(
            "  {} {:<20} {:<17} {}{}",
            marker,
            name,
            last_used,
            entry.path.display(),
            status
        );
    }
    Ok(())
}

fn handle_add(session: &mut Session, dir: &std::path::Path, name: Option<&str>) -> CliResult<()> {
    if !dir.join(GENERATOR_FILE).is_file() {
        return Err(CliError::user(
            msg!(MESSAGES.common_not_a_project, dir = dir.display().to_string()),
            None,
        ));
    }
    let config = load_project(dir)?;
    let name = name
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| default_project_name(&config, dir));

    session.global.touch_project(&name, dir, Utc::now());
    if session.global.active_project.is_none() {
        session.global.active_project = Some(name.clone());
    }
    session.save_global()?;
    esb_success!(
        "{}",
        msg!(
            MESSAGES.project_added,
            name = name.as_str(),
            path = dir.display().to_string()
        )
    );
    Ok(())
}

fn handle_use(session: &mut Session, name: &str) -> CliResult<()> {
    let entry = session
        .global
        .project(name)
        .filter(|entry| entry.is_valid())
        .cloned()
        .ok_or_else(|| EsbError::not_found("project", name, session.global.project_names()))?;

    session.global.touch_project(name, &entry.path, Utc::now());
    session.global.set_active(name, None);
    session.save_global()?;
    esb_success!("{}", msg!(MESSAGES.project_switched, name = name));
    Ok(())
}

fn handle_remove(session: &mut Session, name: &str) -> CliResult<()> {
    if session.global.remove_project(name).is_none() {
        return Err(EsbError::not_found("project", name, session.global.project_names()).into());
    }
    session.save_global()?;
    esb_success!("{}", msg!(MESSAGES.project_removed, name = name));
    Ok(())
}

fn handle_recent(session: &Session) -> CliResult<()> {
    let (name, entry) = session.global.most_recent().ok_or_else(none_registered)?;
    esb_println!(
        "{}",
        msg!(
            MESSAGES.project_recent,
            name = name,
            path = entry.path.display().to_string()
        )
    );
    Ok(())
}
