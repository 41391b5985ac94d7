//! `docker compose` invocations for one environment.

use esb_core::command_stream::stream_command_with_env;
use esb_core::error::{EsbError, Result};
use esb_state::{Context, EnvOverlay};
use std::path::PathBuf;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComposeAction {
    Up { build: bool },
    Stop,
    Down { volumes: bool },
    Logs {
        follow: bool,
        tail: Option<usize>,
        timestamps: bool,
        service: Option<String>,
    },
}

impl ComposeAction {
    fn args(&self) -> Vec<String> {
        let mut args = Vec::new();
        match self {
            ComposeAction::Up { build } => {
                args.extend(["up", "-d"].map(String::from));
                if *build {
                    args.push("--build".into());
                }
            }
            ComposeAction::Stop => args.push("stop".into()),
            ComposeAction::Down { volumes } => {
                args.push("down".into());
                if *volumes {
                    args.push("--volumes".into());
                }
            }
            ComposeAction::Logs {
                follow,
                tail,
                timestamps,
                service,
            } => {
                args.push("logs".into());
                if *follow {
                    args.push("--follow".into());
                }
                if let Some(lines) = tail {
                    args.push("--tail".into());
                    args.push(lines.to_string());
                }
                if *timestamps {
                    args.push("--timestamps".into());
                }
                args.extend(service.iter().cloned());
            }
        }
        args
    }
}

/// Compose file for the environment's runtime mode.
pub fn compose_file(ctx: &Context) -> PathBuf {
    ctx.project_dir
        .join(format!("docker-compose.{}.yml", ctx.mode.compose_suffix()))
}

pub struct ComposeCommand<'a> {
    ctx: &'a Context,
    overlay: &'a EnvOverlay,
}

impl<'a> ComposeCommand<'a> {
    pub fn new(ctx: &'a Context, overlay: &'a EnvOverlay) -> Self {
        Self { ctx, overlay }
    }

    /// Arguments to `docker`, namespaced by the compose project.
    pub fn build_args(&self, action: &ComposeAction) -> Vec<String> {
        let mut args = vec![
            "compose".to_string(),
            "-p".to_string(),
            self.ctx.compose_project.clone(),
            "-f".to_string(),
            compose_file(self.ctx).display().to_string(),
        ];
        args.extend(action.args());
        args
    }

    /// Run `action` with the overlay layered on the inherited environment.
    pub fn run(&self, action: &ComposeAction) -> Result<()> {
        let file = compose_file(self.ctx);
        if !file.is_file() {
            return Err(EsbError::not_found(
                "compose file",
                file.display().to_string(),
                Vec::<String>::new(),
            ));
        }
        let args = self.build_args(action);
        info!(
            "docker compose {:?} for {} ({} env vars)",
            action,
            self.ctx.compose_project,
            self.overlay.len()
        );
        debug!("docker {}", args.join(" "));
        stream_command_with_env("docker", &args, &self.overlay.to_pairs())
    }
}
