//! `esb status`

use colored::{ColoredString, Colorize};
use esb_core::{esb_println, esb_suggest, esb_warning};
use esb_messages::{msg, MESSAGES};
use esb_provider::DockerProbe;
use esb_state::{Detector, State};

use crate::error::CliResult;
use crate::session::Session;

pub fn paint_state(state: State) -> ColoredString {
    match state {
        State::Running => state.as_str().green(),
        State::Stopped => state.as_str().yellow(),
        State::Built => state.as_str().cyan(),
        State::NotInitialized => state.as_str().dimmed(),
        State::Unknown => state.as_str().red(),
    }
}

/// Command that moves an environment forward from `state`.
pub fn next_step(state: State) -> &'static str {
    match state {
        State::NotInitialized => MESSAGES.status_not_initialized_next,
        State::Built => MESSAGES.status_built_next,
        State::Stopped => MESSAGES.status_stopped_next,
        State::Running => MESSAGES.status_running_next,
        State::Unknown => MESSAGES.status_unknown_next,
    }
}

pub fn handle_status(session: &Session) -> CliResult<()> {
    let (_project, ctx) = session.resolve()?;
    let detection = Detector::new(DockerProbe::from_ambient(&session.ambient)).detect(&ctx);

    esb_println!(
        "{}",
        msg!(
            MESSAGES.status_header,
            project = ctx.compose_project.as_str(),
            state = paint_state(detection.state).to_string()
        )
    );
    for container in &detection.containers {
        esb_println!(
            "  {:<32} {:<16} {}",
            container.name,
            container.service,
            container.state
        );
    }
    for warning in &detection.warnings {
        esb_warning!("{}", warning);
    }

    if detection.state != State::Unknown {
        if let Some(err) = &detection.error {
            esb_warning!("{}", err);
        }
    }
    let state = detection.into_result()?;
    esb_suggest!(custom "Next: {}", next_step(state));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_state_has_a_next_step() {
        for state in [
            State::NotInitialized,
            State::Built,
            State::Stopped,
            State::Running,
            State::Unknown,
        ] {
            assert!(next_step(state).starts_with("esb") || state == State::Unknown);
        }
        assert_eq!(next_step(State::Built), "esb up");
    }
}
