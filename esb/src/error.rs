//! Error type for the esb binary.
//!
//! Library errors keep their candidates and hints; anything else is carried as
//! `anyhow::Error`.

use esb_core::EsbError;
use std::fmt;

#[derive(Debug)]
pub enum CliError {
    Esb(EsbError),
    /// A user-facing failure with an optional next step.
    User {
        message: String,
        candidates: Vec<String>,
        hint: Option<String>,
    },
    Other(anyhow::Error),
}

impl CliError {
    pub fn user(message: impl Into<String>, hint: Option<String>) -> Self {
        CliError::User {
            message: message.into(),
            candidates: Vec::new(),
            hint,
        }
    }

    pub fn with_candidates(mut self, names: Vec<String>) -> Self {
        if let CliError::User { candidates, .. } = &mut self {
            *candidates = names;
        }
        self
    }

    pub fn candidates(&self) -> &[String] {
        match self {
            CliError::Esb(e) => e.candidates(),
            CliError::User { candidates, .. } => candidates,
            CliError::Other(_) => &[],
        }
    }

    pub fn hint(&self) -> Option<String> {
        match self {
            CliError::Esb(e) => e.hint(),
            CliError::User { hint, .. } => hint.clone(),
            CliError::Other(_) => None,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Esb(e) => write!(f, "{}", e),
            CliError::User { message, .. } => write!(f, "{}", message),
            CliError::Other(e) => write!(f, "{:#}", e),
        }
    }
}

impl std::error::Error for CliError {}

impl From<EsbError> for CliError {
    fn from(err: EsbError) -> Self {
        CliError::Esb(err)
    }
}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::Other(err)
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Esb(EsbError::Io(err))
    }
}

pub type CliResult<T> = std::result::Result<T, CliError>;
