use esb_core::error::Result;

/// Interactive decisions the resolvers may need from the user.
pub trait Prompter {
    /// Ask whether an invalid `what` named `name` may be ignored for this run.
    fn confirm_discard(&self, what: &str, name: &str) -> Result<bool>;

    /// Pick one environment out of several. `None` means no choice was made.
    fn choose_environment(&self, candidates: &[String]) -> Result<Option<String>>;

    /// Yes/no question before a destructive step. `None` means nobody can be asked.
    fn confirm(&self, prompt: &str) -> Result<Option<bool>>;
}

/// Used when no terminal is attached or `--no-interactive` is given.
#[derive(Debug, Default, Clone, Copy)]
pub struct NonInteractive;

impl Prompter for NonInteractive {
    fn confirm_discard(&self, _what: &str, _name: &str) -> Result<bool> {
        Ok(false)
    }

    fn choose_environment(&self, _candidates: &[String]) -> Result<Option<String>> {
        Ok(None)
    }

    fn confirm(&self, _prompt: &str) -> Result<Option<bool>> {
        Ok(None)
    }
}

#[cfg(test)]
pub(crate) struct Scripted {
    pub confirm: bool,
    pub choice: Option<String>,
}

#[cfg(test)]
impl Scripted {
    pub fn confirming(confirm: bool) -> Self {
        Self {
            confirm,
            choice: None,
        }
    }

    pub fn choosing(choice: &str) -> Self {
        Self {
            confirm: false,
            choice: Some(choice.to_string()),
        }
    }
}

#[cfg(test)]
impl Prompter for Scripted {
    fn confirm_discard(&self, _what: &str, _name: &str) -> Result<bool> {
        Ok(self.confirm)
    }

    fn choose_environment(&self, candidates: &[String]) -> Result<Option<String>> {
        Ok(self
            .choice
            .clone()
            .filter(|choice| candidates.contains(choice)))
    }

    fn confirm(&self, _prompt: &str) -> Result<Option<bool>> {
        Ok(Some(self.confirm))
    }
}
