//! `up`, `stop`, `down` and `logs`: run `docker compose` against the environment.

use esb_core::{esb_println, esb_progress, esb_success, esb_warning};
use esb_messages::{msg, MESSAGES};
use esb_provider::command::{probe_timeout, PROBE_TIMEOUT_VAR};
use esb_provider::{
    compose_file, discover_ports, ensure_docker, save_ports, ComposeAction, ComposeCommand,
    ComposePortLookup,
};
use esb_state::{materialize, Context};

use crate::error::{CliError, CliResult};
use crate::session::{OpenProject, Session};

pub(crate) fn require_docker() -> CliResult<()> {
    ensure_docker().map_err(|_| {
        CliError::user(
            MESSAGES.docker_not_installed,
            Some("Install Docker and make sure `docker` is on PATH".to_string()),
        )
    })
}

fn run(session: &Session, action: ComposeAction) -> CliResult<(OpenProject, Context)> {
    let (project, ctx) = session.resolve()?;
    require_docker()?;
    let file = compose_file(&ctx);
    if !file.is_file() {
        return Err(CliError::user(
            msg!(MESSAGES.compose_file_missing, path = file.display().to_string()),
            None,
        ));
    }

    if matches!(action, ComposeAction::Up { .. }) {
        esb_progress!(
            "{}",
            msg!(
                MESSAGES.compose_starting,
                project = ctx.compose_project.as_str(),
                mode = ctx.mode.as_str()
            )
        );
    }
    let overlay = materialize(&ctx, &project.config, &session.ambient);
    ComposeCommand::new(&ctx, &overlay).run(&action)?;
    Ok((project, ctx))
}

/// Record the host ports the runtime picked, next to the staged config.
fn publish_ports(session: &Session, ctx: &Context) {
    let lookup = ComposePortLookup::new(probe_timeout(session.ambient.get(PROBE_TIMEOUT_VAR)));
    let ports = discover_ports(ctx, &lookup);
    if ports.is_empty() {
        return;
    }
    if let Err(err) = save_ports(&ctx.config_dir, &ports) {
        esb_warning!("{}", err);
    }
    esb_println!("{}", MESSAGES.compose_ports_header);
    for (key, port) in &ports {
        esb_println!("  {:<28} {}", key, port);
    }
}

pub fn handle_up(session: &mut Session, build: bool) -> CliResult<()> {
    let (project, ctx) = run(session, ComposeAction::Up { build })?;
    session.remember(&project, None)?;
    publish_ports(session, &ctx);
    esb_success!("{}", msg!(MESSAGES.compose_up_done, env = ctx.env.as_str()));
    Ok(())
}

pub fn handle_stop(session: &Session) -> CliResult<()> {
    let (_, ctx) = run(session, ComposeAction::Stop)?;
    esb_success!("{}", msg!(MESSAGES.compose_stopped, env = ctx.env.as_str()));
    Ok(())
}

pub fn handle_down(session: &Session, volumes: bool) -> CliResult<()> {
    let (_, ctx) = run(session, ComposeAction::Down { volumes })?;
    esb_success!("{}", msg!(MESSAGES.compose_down_done, env = ctx.env.as_str()));
    Ok(())
}

pub fn handle_logs(
    session: &Session,
    service: Option<String>,
    follow: bool,
    tail: Option<usize>,
    timestamps: bool,
) -> CliResult<()> {
    run(
        session,
        ComposeAction::Logs {
            follow,
            tail,
            timestamps,
            service,
        },
    )?;
    Ok(())
}
