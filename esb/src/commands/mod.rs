// Command handlers for esb operations

use crate::cli::{Args, Command};
use crate::error::CliResult;
use crate::session::Session;
use esb_provider::PruneOptions;
use tracing::debug;

pub mod compose;
pub mod env;
pub mod env_vars;
pub mod info;
pub mod project;
pub mod prune;
pub mod status;

/// Main command dispatcher
#[must_use = "command execution results should be handled"]
pub fn execute_command(args: Args) -> CliResult<()> {
    // Completion needs neither config nor a project.
    if let Command::Completion { shell } = &args.command {
        debug!("Generating shell completions for: {}", shell);
        return handle_completion(*shell);
    }

    let mut session = Session::from_args(&args)?;

    match &args.command {
        Command::Info { json } => {
            debug!("Handling info command");
            info::handle_info(&session, *json)
        }
        Command::Status => {
            debug!("Handling status command");
            status::handle_status(&session)
        }
        Command::Env { command } => {
            debug!("Handling env command");
            env::handle_env_command(&mut session, command)
        }
        Command::Project { command } => {
            debug!("Handling project command");
            project::handle_project_command(&mut session, command)
        }
        Command::Up { build } => {
            debug!("Handling up command with build={}", build);
            compose::handle_up(&mut session, *build)
        }
        Command::Stop => {
            debug!("Handling stop command");
            compose::handle_stop(&session)
        }
        Command::Down { volumes } => {
            debug!("Handling down command with volumes={}", volumes);
            compose::handle_down(&session, *volumes)
        }
        Command::Prune {
            volumes,
            all,
            hard,
            yes,
        } => {
            debug!("Handling prune command");
            let opts = PruneOptions {
                volumes: *volumes,
                all_images: *all,
                hard: *hard,
            };
            prune::handle_prune(&session, opts, *yes)
        }
        Command::Logs {
            service,
            follow,
            tail,
            timestamps,
        } => {
            debug!("Handling logs command");
            compose::handle_logs(&session, service.clone(), *follow, *tail, *timestamps)
        }
        Command::EnvVars { dotenv } => {
            debug!("Handling env-vars command");
            env_vars::handle_env_vars(&session, *dotenv)
        }
        Command::Completion { .. } => Ok(()),
    }
}

fn handle_completion(shell: clap_complete::Shell) -> CliResult<()> {
    use clap::CommandFactory;
    use clap_complete::generate;
    use std::io;

    let mut cmd = crate::cli::Args::command();
    generate(shell, &mut cmd, "esb", &mut io::stdout());
    Ok(())
}
