// External crates
use clap::Parser;
use tracing::info;

// Internal imports
use esb_core::{esb_error, esb_error_hint, esb_error_with_details};
use esb_logging::{init_subscriber, LogSettings};
use esb_messages::MESSAGES;

// Local modules
mod cli;
mod commands;
mod error;
mod prompt;
mod session;

use cli::Args;
use commands::execute_command;

fn main() {
    let args = Args::parse();

    // Held for the whole run so buffered file output is flushed on exit.
    let _log_guard = init_subscriber(&LogSettings::from_env().with_debug(args.debug));

    info!("Starting esb {:?}", args.command);

    if let Err(e) = execute_command(args) {
        esb_error!("{}", e);
        let candidates = e.candidates();
        if !candidates.is_empty() {
            esb_error_with_details!(MESSAGES.common_available_label, candidates);
        }
        if let Some(hint) = e.hint() {
            esb_error_hint!("{}", hint);
        }
        std::process::exit(1);
    }
}
