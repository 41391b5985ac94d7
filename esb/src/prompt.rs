//! Terminal prompts for the resolvers.

use colored::Colorize;
use dialoguer::{theme::ColorfulTheme, Confirm, Select};
use esb_core::error::{EsbError, Result};
use esb_messages::{msg, MESSAGES};
use esb_state::{AmbientEnv, NonInteractive, Prompter};
use std::io::IsTerminal;

pub const NONINTERACTIVE_VAR: &str = "ESB_NONINTERACTIVE";

fn prompt_error(err: dialoguer::Error) -> EsbError {
    EsbError::Command(format!("prompt failed: {}", err))
}

pub struct TerminalPrompter {
    theme: ColorfulTheme,
}

impl Prompter for TerminalPrompter {
    fn confirm_discard(&self, what: &str, name: &str) -> Result<bool> {
        let template = match what {
            "project" => MESSAGES.project_unset_prompt,
            _ => MESSAGES.env_unset_prompt,
        };
        let prompt = msg!(template, name = name.bright_yellow().to_string());
        Confirm::with_theme(&self.theme)
            .with_prompt(prompt)
            .default(false)
            .interact()
            .map_err(prompt_error)
    }

    fn choose_environment(&self, candidates: &[String]) -> Result<Option<String>> {
        let index = Select::with_theme(&self.theme)
            .with_prompt(MESSAGES.env_select_prompt)
            .items(candidates)
            .default(0)
            .interact_opt()
            .map_err(prompt_error)?;
        Ok(index.and_then(|i| candidates.get(i).cloned()))
    }

    fn confirm(&self, prompt: &str) -> Result<Option<bool>> {
        Confirm::with_theme(&self.theme)
            .with_prompt(prompt)
            .default(false)
            .interact()
            .map(Some)
            .map_err(prompt_error)
    }
}

/// Prompts only when asked to, not disabled, and attached to a terminal.
pub fn prompter_for(no_interactive: bool, ambient: &AmbientEnv) -> Box<dyn Prompter> {
    let disabled = no_interactive
        || ambient
            .non_empty(NONINTERACTIVE_VAR)
            .is_some_and(|v| !matches!(v, "0" | "false"));
    if disabled || !std::io::stdin().is_terminal() || !std::io::stderr().is_terminal() {
        Box::new(NonInteractive)
    } else {
        Box::new(TerminalPrompter {
            theme: ColorfulTheme::default(),
        })
    }
}
