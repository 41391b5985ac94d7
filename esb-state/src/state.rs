use serde::Serialize;
use std::fmt;

/// Lifecycle state of one environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum State {
    NotInitialized,
    Built,
    Stopped,
    Running,
    /// Detection itself failed and no other signal could decide.
    Unknown,
}

impl State {
    pub fn as_str(&self) -> &'static str {
        match self {
            State::NotInitialized => "not_initialized",
            State::Built => "built",
            State::Stopped => "stopped",
            State::Running => "running",
            State::Unknown => "unknown",
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A container reported by the runtime for a compose project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContainerInfo {
    pub name: String,
    pub service: String,
    /// Raw run state as reported by the runtime (`running`, `exited`, ...).
    pub state: String,
}

impl ContainerInfo {
    pub fn new(name: impl Into<String>, service: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            service: service.into(),
            state: state.into(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.state.trim().eq_ignore_ascii_case("running")
    }
}
