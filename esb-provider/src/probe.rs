//! Lifecycle probes backed by the Docker CLI.

use esb_core::error::{EsbError, Result};
use esb_state::{artifacts, AmbientEnv, ContainerInfo, Context, LifecycleProbes};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::command::{probe_timeout, DockerCommand, PROBE_TIMEOUT_VAR};

pub(crate) const PROJECT_LABEL: &str = "com.docker.compose.project";
const SERVICE_LABEL: &str = "com.docker.compose.service";

/// One line of `docker ps --format '{{json .}}'`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PsLine {
    #[serde(default)]
    names: String,
    #[serde(default)]
    state: String,
    #[serde(default)]
    labels: String,
}

fn label<'a>(labels: &'a str, key: &str) -> Option<&'a str> {
    labels.split(',').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        (k.trim() == key).then(|| v.trim())
    })
}

/// Parse `docker ps` JSON lines. Blank lines are ignored; a malformed line fails the
/// whole probe.
pub fn parse_ps_output(output: &str) -> Result<Vec<ContainerInfo>> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| -> Result<ContainerInfo> {
            let parsed: PsLine = serde_json::from_str(line)?;
            let service = label(&parsed.labels, SERVICE_LABEL).unwrap_or_default();
            Ok(ContainerInfo::new(parsed.names, service, parsed.state))
        })
        .collect()
}

/// True when any `repository:tag` line is tagged for `env`.
pub fn images_tagged_for(output: &str, env: &str) -> bool {
    let suffix = format!(":{}", env);
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && *line != "<none>:<none>")
        .any(|line| line.ends_with(&suffix))
}

/// Probes the local Docker daemon. Every call carries the same deadline.
#[derive(Debug, Clone)]
pub struct DockerProbe {
    timeout: Duration,
}

impl DockerProbe {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn from_ambient(ambient: &AmbientEnv) -> Self {
        Self::new(probe_timeout(ambient.get(PROBE_TIMEOUT_VAR)))
    }
}

impl LifecycleProbes for DockerProbe {
    fn list_containers(&self, compose_project: &str) -> Result<Vec<ContainerInfo>> {
        let output = DockerCommand::new()
            .subcommand("ps")
            .arg("-a")
            .arg("--filter")
            .arg(format!("label={}={}", PROJECT_LABEL, compose_project))
            .arg("--format")
            .arg("{{json .}}")
            .capture(self.timeout)
            .map_err(into_unreachable)?;
        let containers = parse_ps_output(&output)?;
        debug!("{} containers for {}", containers.len(), compose_project);
        Ok(containers)
    }

    fn has_images(&self, ctx: &Context) -> Result<bool> {
        let output = DockerCommand::new()
            .subcommand("image")
            .args(["ls", "--format", "{{.Repository}}:{{.Tag}}"])
            .capture(self.timeout)
            .map_err(into_unreachable)?;
        Ok(images_tagged_for(&output, &ctx.env))
    }

    fn has_build_artifacts(&self, ctx: &Context) -> Result<bool> {
        artifacts::has_build_artifacts(&ctx.output_env_dir)
    }
}

/// A failed docker query means the runtime could not be asked, whatever the cause.
fn into_unreachable(err: EsbError) -> EsbError {
    match err {
        EsbError::Unreachable { .. } | EsbError::Timeout(_) => err,
        other => EsbError::unreachable("docker", other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ps_output() {
        let output = r#"
{"Names":"demo-staging-gateway-1","State":"running","Labels":"com.docker.compose.project=demo-staging,com.docker.compose.service=gateway"}
{"Names":"demo-staging-agent-1","State":"exited","Labels":"com.docker.compose.service=agent"}

"#;
        let containers = parse_ps_output(output).unwrap();
        assert_eq!(containers.len(), 2);
        assert_eq!(containers[0].service, "gateway");
        assert!(containers[0].is_running());
        assert_eq!(containers[1].name, "demo-staging-agent-1");
        assert!(!containers[1].is_running());
    }

    #[test]
    fn test_parse_ps_output_rejects_garbage() {
        assert!(parse_ps_output("not json").is_err());
        assert!(parse_ps_output("").unwrap().is_empty());
    }

    #[test]
    fn test_missing_service_label_is_empty() {
        let containers = parse_ps_output(r#"{"Names":"x","State":"created"}"#).unwrap();
        assert_eq!(containers[0].service, "");
    }

    #[test]
    fn test_images_tagged_for_env() {
        let output = "demo-gateway:staging\n<none>:<none>\nredis:latest\n";
        assert!(images_tagged_for(output, "staging"));
        assert!(!images_tagged_for(output, "prod"));
        assert!(!images_tagged_for("<none>:<none>\n", "<none>"));
    }

    #[test]
    fn test_command_failures_become_unreachable() {
        let err = into_unreachable(EsbError::Command("exit 1".into()));
        assert!(matches!(err, EsbError::Unreachable { .. }));
        let timeout = into_unreachable(EsbError::Timeout("slow".into()));
        assert!(matches!(timeout, EsbError::Timeout(_)));
    }
}
