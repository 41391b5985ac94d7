use std::fmt::{self, Display, Formatter};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EsbError {
    /// A selector did not match anything registered. Always carries the valid names.
    NotFound {
        what: String,
        name: String,
        candidates: Vec<String>,
    },
    InvalidState(String),
    Unreachable {
        target: String,
        reason: String,
    },
    /// A persisted selection that no longer validates.
    Stale {
        what: String,
        name: String,
    },
    Config(String),
    Validation(String),
    Io(#[from] std::io::Error),
    Serialization(String),
    Command(String),
    Timeout(String),
}

impl EsbError {
    pub fn not_found(
        what: impl Into<String>,
        name: impl Into<String>,
        candidates: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        EsbError::NotFound {
            what: what.into(),
            name: name.into(),
            candidates: candidates.into_iter().map(Into::into).collect(),
        }
    }

    pub fn stale(what: impl Into<String>, name: impl Into<String>) -> Self {
        EsbError::Stale {
            what: what.into(),
            name: name.into(),
        }
    }

    pub fn unreachable(target: impl Into<String>, reason: impl Into<String>) -> Self {
        EsbError::Unreachable {
            target: target.into(),
            reason: reason.into(),
        }
    }

    /// Valid alternatives to show next to the error, if any.
    pub fn candidates(&self) -> &[String] {
        match self {
            EsbError::NotFound { candidates, .. } => candidates,
            _ => &[],
        }
    }

    /// Concrete next-step command for the user.
    pub fn hint(&self) -> Option<String> {
        match self {
            EsbError::NotFound { what, .. } => match what.as_str() {
                "environment" => Some("esb env list".to_string()),
                "project" => Some("esb project list".to_string()),
                "template" => Some("esb info --template <path/to/template.yaml>".to_string()),
                _ => None,
            },
            EsbError::Stale { .. } => {
                Some("Re-run with --force to discard the stale selection".to_string())
            }
            EsbError::Unreachable { .. } | EsbError::Timeout(_) => {
                Some("Check Docker: docker ps".to_string())
            }
            EsbError::Config(msg) if msg.contains("sam_template") => {
                Some("Set paths.sam_template in generator.yml".to_string())
            }
            EsbError::Config(msg) if msg.contains("home directory") => {
                Some("Set HOME, or point ESB_CONFIG_PATH at the global config".to_string())
            }
            EsbError::Config(_) => Some("Check generator.yml, then run: esb info".to_string()),
            EsbError::InvalidState(msg) if msg.contains("no environments") => {
                Some("esb env add <name>".to_string())
            }
            EsbError::InvalidState(_) => Some("esb status".to_string()),
            EsbError::Io(_) => Some("Check that the path exists and is writable".to_string()),
            EsbError::Serialization(_) => {
                Some("Fix the YAML in generator.yml or ~/.esb/config.yaml".to_string())
            }
            EsbError::Command(_) => {
                Some("Re-run with --debug to see the full command line".to_string())
            }
            EsbError::Validation(_) => None,
        }
    }
}

impl Display for EsbError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            EsbError::NotFound { what, name, .. } => write!(f, "{} '{}' not found", what, name),
            EsbError::InvalidState(s) => write!(f, "{}", s),
            EsbError::Unreachable { target, reason } => {
                write!(f, "{} is unreachable: {}", target, reason)
            }
            EsbError::Stale { what, name } => {
                write!(f, "persisted {} '{}' is no longer valid", what, name)
            }
            EsbError::Config(s) => write!(f, "Configuration error: {}", s),
            EsbError::Validation(s) => write!(f, "Validation error: {}", s),
            EsbError::Io(e) => write!(f, "I/O error: {}", e),
            EsbError::Serialization(s) => write!(f, "Serialization error: {}", s),
            EsbError::Command(s) => write!(f, "Command failed: {}", s),
            EsbError::Timeout(s) => write!(f, "Timed out: {}", s),
        }
    }
}

impl From<serde_yaml_ng::Error> for EsbError {
    fn from(err: serde_yaml_ng::Error) -> Self {
        EsbError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for EsbError {
    fn from(err: serde_json::Error) -> Self {
        EsbError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, EsbError>;
