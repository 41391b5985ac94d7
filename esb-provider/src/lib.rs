//! Container runtime integration: Docker-backed lifecycle probes, `docker compose`
//! invocations, published-port discovery and project-scoped prune.

pub mod command;
pub mod compose;
pub mod ports;
pub mod probe;
pub mod prune;

pub use command::DockerCommand;
pub use compose::{compose_file, ComposeAction, ComposeCommand};
pub use ports::{
    discover_ports, load_ports, save_ports, ComposePortLookup, PortLookup, PortMapping,
};
pub use probe::DockerProbe;
pub use prune::{prune, prune_summary, PruneOptions};

use esb_core::command_stream::is_tool_installed;
use esb_core::error::{EsbError, Result};

/// Fail early when the `docker` CLI is not on `PATH`.
pub fn ensure_docker() -> Result<()> {
    if is_tool_installed("docker") {
        Ok(())
    } else {
        Err(EsbError::unreachable("docker", "docker CLI not found in PATH"))
    }
}
