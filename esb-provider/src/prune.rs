//! Cleanup scoped to one compose project: stopped containers, unused networks, images
//! and optionally volumes, plus the environment's generated artifacts.

use esb_core::error::Result;
use esb_state::Context;
use std::fs;
use std::time::Duration;
use tracing::{debug, info};

use crate::command::DockerCommand;
use crate::probe::PROJECT_LABEL;

/// Image and volume prunes can take a while on a large cache.
const PRUNE_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PruneOptions {
    pub volumes: bool,
    /// Remove every unused image of the project, not only dangling ones.
    pub all_images: bool,
    /// Also delete the project's `generator.yml`.
    pub hard: bool,
}

/// What a prune with `opts` removes, one line per kind of resource.
pub fn prune_summary(ctx: &Context, opts: &PruneOptions) -> Vec<String> {
    let mut lines = vec![
        format!("all stopped containers of {}", ctx.compose_project),
        format!("all networks of {} not used by a container", ctx.compose_project),
    ];
    if opts.all_images {
        lines.push(format!("all images of {} not used by a container", ctx.compose_project));
    } else {
        lines.push(format!("all dangling images of {}", ctx.compose_project));
    }
    if opts.volumes {
        lines.push(format!("all volumes of {} not used by a container", ctx.compose_project));
    }
    lines.push(format!("generated artifacts: {}", ctx.output_env_dir.display()));
    if opts.hard {
        lines.push(ctx.generator_path.display().to_string());
    }
    lines
}

/// Docker invocations for `opts`, in the order they run.
pub fn prune_commands(compose_project: &str, opts: &PruneOptions) -> Vec<DockerCommand> {
    let filter = format!("label={}={}", PROJECT_LABEL, compose_project);
    let mut commands = vec![
        DockerCommand::new()
            .subcommand("container")
            .args(["prune", "-f", "--filter", filter.as_str()]),
        DockerCommand::new()
            .subcommand("network")
            .args(["prune", "-f", "--filter", filter.as_str()]),
    ];
    if opts.volumes {
        commands.push(
            DockerCommand::new()
                .subcommand("volume")
                .args(["prune", "-f", "--all", "--filter", filter.as_str()]),
        );
    }
    let mut images = DockerCommand::new()
        .subcommand("image")
        .args(["prune", "-f", "--filter", filter.as_str()]);
    if opts.all_images {
        images = images.arg("--all");
    }
    commands.push(images);
    commands
}

/// Remove the generated artifacts (and with `hard`, `generator.yml`). Missing paths are
/// not an error.
pub fn remove_generated(ctx: &Context, hard: bool) -> Result<()> {
    if ctx.output_env_dir.exists() {
        fs::remove_dir_all(&ctx.output_env_dir)?;
        debug!("Removed {}", ctx.output_env_dir.display());
    }
    if hard && ctx.generator_path.is_file() {
        fs::remove_file(&ctx.generator_path)?;
        debug!("Removed {}", ctx.generator_path.display());
    }
    Ok(())
}

pub fn prune(ctx: &Context, opts: &PruneOptions) -> Result<()> {
    info!("Pruning {} ({:?})", ctx.compose_project, opts);
    for command in prune_commands(&ctx.compose_project, opts) {
        let output = command.capture(PRUNE_TIMEOUT)?;
        for line in output.lines().filter(|l| !l.trim().is_empty()) {
            debug!("{}", line);
        }
    }
    remove_generated(ctx, opts.hard)
}
