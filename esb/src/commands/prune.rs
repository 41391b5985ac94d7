//! `esb prune`: remove the environment's runtime resources and generated artifacts.

use esb_core::{esb_println, esb_success, esb_warning};
use esb_messages::{msg, MESSAGES};
use esb_provider::{prune, prune_summary, PruneOptions};

use super::compose::require_docker;
use crate::error::{CliError, CliResult};
use crate::session::Session;

pub fn handle_prune(session: &Session, opts: PruneOptions, yes: bool) -> CliResult<()> {
    let (_project, ctx) = session.resolve()?;

    esb_warning!("{}", MESSAGES.prune_warning_header);
    for line in prune_summary(&ctx, &opts) {
        esb_println!("  - {}", line);
    }

    if !yes {
        match session.confirm(MESSAGES.prune_confirm)? {
            Some(true) => {}
            Some(false) => return Err(CliError::user(MESSAGES.prune_aborted, None)),
            None => {
                return Err(CliError::user(
                    MESSAGES.prune_needs_yes,
                    Some(MESSAGES.prune_needs_yes_hint.to_string()),
                ))
            }
        }
    }

    require_docker()?;
    prune(&ctx, &opts)?;
    esb_success!(
        "{}",
        msg!(MESSAGES.prune_done, project = ctx.compose_project.as_str())
    );
    Ok(())
}
