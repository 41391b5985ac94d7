//! `esb env-vars`: print the runtime environment, e.g. `eval "$(esb env-vars)"`.

use esb_core::esb_print;
use esb_state::materialize;

use crate::error::CliResult;
use crate::session::Session;

pub fn handle_env_vars(session: &Session, dotenv: bool) -> CliResult<()> {
    let (project, ctx) = session.resolve()?;
    let overlay = materialize(&ctx, &project.config, &session.ambient);
    if dotenv {
        for (key, value) in overlay.iter() {
            esb_print!("{}={}\n", key, value);
        }
    } else {
        esb_print!("{}", overlay.to_shell_exports());
    }
    Ok(())
}
