//! `esb info`: everything derived for the current selection.

use esb_core::{esb_println, esb_warning};
use esb_messages::{msg, MESSAGES};
use esb_ports::LogicalPort;
use esb_provider::{load_ports, DockerProbe};
use esb_state::{Context, Detection, Detector, State};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::debug;

use super::status::paint_state;
use crate::error::{CliError, CliResult};
use crate::session::Session;

#[derive(Serialize)]
struct InfoReport<'a> {
    project: &'a str,
    project_dir: PathBuf,
    env: Option<&'a str>,
    context: Option<&'a Context>,
    state: Option<State>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ports: Option<BTreeMap<String, u16>>,
}

/// Detection problems worth showing: every warning, plus the probe error if there was one.
fn diagnostics(detection: Option<&Detection>) -> (Vec<String>, Option<String>) {
    match detection {
        Some(d) => (d.warnings.clone(), d.error.as_ref().map(ToString::to_string)),
        None => (Vec::new(), None),
    }
}

pub fn handle_info(session: &Session, json: bool) -> CliResult<()> {
    let project = session.open_project()?;
    let env = session.environment(&project, true)?;
    let ctx = env
        .as_deref()
        .map(|env| session.context(&project, env))
        .transpose()?;
    let detection = ctx
        .as_ref()
        .map(|ctx| Detector::new(DockerProbe::from_ambient(&session.ambient)).detect(ctx));
    let state = detection.as_ref().map(|d| d.state);
    let (warnings, error) = diagnostics(detection.as_ref());
    let ports = ctx.as_ref().and_then(|ctx| match load_ports(&ctx.config_dir) {
        Ok(ports) => ports,
        Err(err) => {
            debug!("Ignoring unreadable ports file: {}", err);
            None
        }
    });

    if json {
        let report = InfoReport {
            project: &project.key,
            project_dir: project.dir().to_path_buf(),
            env: env.as_deref(),
            context: ctx.as_ref(),
            state,
            warnings,
            error,
            ports,
        };
        let rendered = serde_json::to_string_pretty(&report)
            .map_err(|e| CliError::from(anyhow::Error::new(e).context("rendering info")))?;
        esb_println!("{}", rendered);
        return Ok(());
    }

    esb_println!(
        "{}",
        msg!(
            MESSAGES.info_header,
            project = project.key.as_str(),
            env = env.as_deref().unwrap_or("-")
        )
    );
    esb_println!("  Directory:        {}", project.dir().display());
    esb_println!("  Config:           {}", project.generator_path().display());

    let Some(ctx) = ctx else {
        esb_println!("  Environments:     {}", project.config.environments.names().join(", "));
        return Ok(());
    };

    esb_println!("  Mode:             {}", ctx.mode);
    esb_println!("  Compose project:  {}", ctx.compose_project);
    esb_println!("  Template:         {}", ctx.template_path.display());
    esb_println!("  Output:           {}", ctx.output_env_dir.display());
    esb_println!("  Staging config:   {}", ctx.config_dir.display());
    esb_println!(
        "  External network: {} ({})",
        ctx.network.external_network,
        ctx.network.external_subnet
    );
    esb_println!(
        "  Runtime network:  {} (node {})",
        ctx.network.runtime_subnet,
        ctx.network.runtime_node_ip
    );
    esb_println!("  Lambda network:   {}", ctx.network.lambda_network);
    esb_println!("  Registry port:    {}", ctx.ports.get(LogicalPort::Registry));
    if let Some(state) = state {
        esb_println!("  State:            {}", paint_state(state));
    }
    for (key, port) in ports.iter().flatten() {
        esb_println!("  {:<17} {}", format!("{}:", key), port);
    }
    for warning in &warnings {
        esb_warning!("{}", warning);
    }
    if let Some(err) = &error {
        esb_warning!("{}", err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use esb_core::EsbError;

    #[test]
    fn test_diagnostics_carry_warnings_and_error() {
        let detection = Detection {
            state: State::Built,
            containers: Vec::new(),
            error: Some(EsbError::unreachable("docker", "daemon not running")),
            warnings: vec!["image listing skipped".to_string()],
        };
        let (warnings, error) = diagnostics(Some(&detection));
        assert_eq!(warnings, ["image listing skipped"]);
        assert_eq!(
            error.as_deref(),
            Some("docker is unreachable: daemon not running")
        );
        assert_eq!(diagnostics(None), (Vec::new(), None));
    }
}
