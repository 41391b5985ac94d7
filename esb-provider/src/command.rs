//! Docker command abstraction and builder utilities.
//!
//! Read-only queries go through [`DockerCommand::capture`], which carries a deadline so
//! an unresponsive daemon cannot hang a status command.

use esb_core::command_stream::capture_with_deadline;
use esb_core::error::Result;
use std::time::Duration;
use tracing::debug;

pub const PROBE_TIMEOUT_VAR: &str = "ESB_PROBE_TIMEOUT_SECS";
const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Deadline for runtime probes, from `ESB_PROBE_TIMEOUT_SECS` when it parses.
pub fn probe_timeout(raw: Option<&str>) -> Duration {
    raw.and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_PROBE_TIMEOUT)
}

/// Builder for Docker commands with fluent interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DockerCommand {
    subcommand: Option<String>,
    args: Vec<String>,
}

impl DockerCommand {
    pub fn new() -> Self {
        Self {
            subcommand: None,
            args: Vec::new(),
        }
    }

    /// Set the Docker subcommand (e.g., "ps", "image").
    pub fn subcommand<S: Into<String>>(mut self, cmd: S) -> Self {
        self.subcommand = Some(cmd.into());
        self
    }

    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Full argument vector passed to `docker`.
    pub fn to_args(&self) -> Vec<String> {
        self.subcommand
            .iter()
            .cloned()
            .chain(self.args.iter().cloned())
            .collect()
    }

    /// Run and return stdout, failing once `timeout` elapses.
    pub fn capture(self, timeout: Duration) -> Result<String> {
        let args = self.to_args();
        debug!("Executing Docker command: docker {}", args.join(" "));
        capture_with_deadline("docker", &args, timeout)
    }
}

impl Default for DockerCommand {
    fn default() -> Self {
        Self::new()
    }
}
