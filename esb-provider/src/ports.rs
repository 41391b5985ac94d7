//! Host ports published by a running environment.
//!
//! Most logical ports default to `0`, so the runtime picks an ephemeral host port. After
//! `up` each mapped service is asked for its published port and the result is written to
//! `ports.json` in the staging config directory.

use esb_config::RuntimeMode;
use esb_core::error::Result;
use esb_ports::LogicalPort;
use esb_state::Context;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::command::DockerCommand;
use crate::compose::compose_file;

pub const PORTS_FILE: &str = "ports.json";

/// Where a logical port is published from inside the compose project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortMapping {
    pub port: LogicalPort,
    pub service: &'static str,
    pub container_port: u16,
    /// Modes the mapping applies to. Empty means every mode.
    pub modes: &'static [RuntimeMode],
}

impl PortMapping {
    pub fn applies_to(&self, mode: RuntimeMode) -> bool {
        self.modes.is_empty() || self.modes.contains(&mode)
    }
}

pub const PORT_MAPPINGS: &[PortMapping] = &[
    PortMapping {
        port: LogicalPort::GatewayHttps,
        service: "gateway",
        container_port: 8443,
        modes: &[RuntimeMode::Docker],
    },
    PortMapping {
        port: LogicalPort::GatewayHttps,
        service: "runtime-node",
        container_port: 8443,
        modes: &[RuntimeMode::Containerd],
    },
    PortMapping {
        port: LogicalPort::S3,
        service: "s3-storage",
        container_port: 9000,
        modes: &[],
    },
    PortMapping {
        port: LogicalPort::S3Mgmt,
        service: "s3-storage",
        container_port: 9001,
        modes: &[],
    },
    PortMapping {
        port: LogicalPort::Database,
        service: "database",
        container_port: 8000,
        modes: &[],
    },
    PortMapping {
        port: LogicalPort::VictoriaLogs,
        service: "victorialogs",
        container_port: 9428,
        modes: &[],
    },
    PortMapping {
        port: LogicalPort::Registry,
        service: "registry",
        container_port: 5010,
        modes: &[RuntimeMode::Containerd, RuntimeMode::Docker],
    },
    PortMapping {
        port: LogicalPort::AgentGrpc,
        service: "runtime-node",
        container_port: 50051,
        modes: &[RuntimeMode::Containerd],
    },
];

pub fn mappings_for(mode: RuntimeMode) -> impl Iterator<Item = &'static PortMapping> {
    PORT_MAPPINGS.iter().filter(move |m| m.applies_to(mode))
}

/// Host port from `docker compose port` output such as `0.0.0.0:49153` or `[::]:49153`.
pub fn parse_port_output(output: &str) -> Option<u16> {
    let line = output.lines().map(str::trim).find(|l| !l.is_empty())?;
    let (_, port) = line.rsplit_once(':')?;
    port.trim().parse::<u16>().ok().filter(|p| *p != 0)
}

/// Asks the runtime which host port a service's container port is published on.
pub trait PortLookup {
    fn published_port(&self, ctx: &Context, service: &str, container_port: u16) -> Result<String>;
}

pub struct ComposePortLookup {
    timeout: Duration,
}

impl ComposePortLookup {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl PortLookup for ComposePortLookup {
    fn published_port(&self, ctx: &Context, service: &str, container_port: u16) -> Result<String> {
        DockerCommand::new()
            .subcommand("compose")
            .args(["-p", ctx.compose_project.as_str(), "-f"])
            .arg(compose_file(ctx).display().to_string())
            .args(["port", service])
            .arg(container_port.to_string())
            .capture(self.timeout)
    }
}

/// Published host ports keyed by their environment variable, e.g. `ESB_PORT_S3`.
///
/// Services that are not running or publish nothing are left out.
pub fn discover_ports(ctx: &Context, lookup: &dyn PortLookup) -> BTreeMap<String, u16> {
    let mut ports = BTreeMap::new();
    for mapping in mappings_for(ctx.mode) {
        let key = mapping.port.env_key();
        if ports.contains_key(key) {
            continue;
        }
        match lookup.published_port(ctx, mapping.service, mapping.container_port) {
            Ok(output) => match parse_port_output(&output) {
                Some(port) => {
                    ports.insert(key.to_string(), port);
                }
                None => debug!("{} publishes no port for {}", mapping.service, key),
            },
            Err(err) => debug!("Port lookup for {} failed: {}", mapping.service, err),
        }
    }
    ports
}

pub fn ports_path(config_dir: &Path) -> PathBuf {
    config_dir.join(PORTS_FILE)
}

pub fn save_ports(config_dir: &Path, ports: &BTreeMap<String, u16>) -> Result<PathBuf> {
    fs::create_dir_all(config_dir)?;
    let path = ports_path(config_dir);
    let mut content = serde_json::to_string_pretty(ports)?;
    content.push('\n');
    fs::write(&path, content)?;
    info!("Saved {} discovered ports to {}", ports.len(), path.display());
    Ok(path)
}

/// Ports saved by the last `up`, if any.
pub fn load_ports(config_dir: &Path) -> Result<Option<BTreeMap<String, u16>>> {
    let path = ports_path(config_dir);
    if !path.is_file() {
        return Ok(None);
    }
    let content = fs::read_to_string(&path)?;
    Ok(Some(serde_json::from_str(&content)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use esb_core::error::EsbError;
    use esb_ports::{NetworkPlan, PortTable};
    use std::cell::RefCell;
    use tempfile::TempDir;

    fn ctx(mode: RuntimeMode, config_dir: &Path) -> Context {
        Context {
            project_dir: PathBuf::from("/work/demo"),
            generator_path: PathBuf::from("/work/demo/generator.yml"),
            template_path: PathBuf::from("/work/demo/template.yaml"),
            output_dir: PathBuf::from("/work/demo/.esb"),
            output_env_dir: PathBuf::from("/work/demo/.esb/dev"),
            config_dir: config_dir.to_path_buf(),
            env: "dev".into(),
            mode,
            brand: "demo".into(),
            compose_project: "demo-dev".into(),
            network: NetworkPlan::derive("demo", "dev", "demo-dev"),
            ports: PortTable::default(),
        }
    }

    /// Answers from a fixed table and records what was asked.
    struct FixedLookup {
        answers: Vec<(&'static str, u16, &'static str)>,
        asked: RefCell<Vec<String>>,
    }

    impl PortLookup for FixedLookup {
        fn published_port(&self, _ctx: &Context, service: &str, container_port: u16) -> Result<String> {
            self.asked
                .borrow_mut()
                .push(format!("{}:{}", service, container_port));
            self.answers
                .iter()
                .find(|(s, p, _)| *s == service && *p == container_port)
                .map(|(_, _, out)| out.to_string())
                .ok_or_else(|| EsbError::Command("no such service".into()))
        }
    }

    #[test]
    fn test_parse_port_output() {
        assert_eq!(parse_port_output("0.0.0.0:49153\n"), Some(49153));
        assert_eq!(parse_port_output("[::]:8443\n0.0.0.0:8443\n"), Some(8443));
        assert_eq!(parse_port_output(""), None);
        assert_eq!(parse_port_output("0.0.0.0:0"), None);
        assert_eq!(parse_port_output("garbage"), None);
    }

    #[test]
    fn test_mappings_depend_on_mode() {
        let services = |mode| {
            mappings_for(mode)
                .map(|m| format!("{}:{}", m.service, m.container_port))
                .collect::<Vec<_>>()
        };
        let docker = services(RuntimeMode::Docker);
        assert!(docker.contains(&"gateway:8443".to_string()));
        assert!(!docker.contains(&"runtime-node:50051".to_string()));

        let containerd = services(RuntimeMode::Containerd);
        assert!(containerd.contains(&"runtime-node:8443".to_string()));
        assert!(containerd.contains(&"runtime-node:50051".to_string()));
        assert!(!containerd.contains(&"gateway:8443".to_string()));

        let firecracker = services(RuntimeMode::Firecracker);
        assert!(!firecracker.contains(&"registry:5010".to_string()));
        assert!(firecracker.contains(&"s3-storage:9000".to_string()));
    }

    #[test]
    fn test_discovery_skips_failed_and_unpublished_services() {
        let temp = TempDir::new().unwrap();
        let ctx = ctx(RuntimeMode::Docker, temp.path());
        let lookup = FixedLookup {
            answers: vec![
                ("gateway", 8443, "0.0.0.0:49200\n"),
                ("s3-storage", 9000, "0.0.0.0:49201\n"),
                ("s3-storage", 9001, "\n"),
                ("registry", 5010, "0.0.0.0:5010\n"),
            ],
            asked: RefCell::new(Vec::new()),
        };

        let ports = discover_ports(&ctx, &lookup);
        assert_eq!(ports.get("ESB_PORT_GATEWAY_HTTPS"), Some(&49200));
        assert_eq!(ports.get("ESB_PORT_S3"), Some(&49201));
        assert_eq!(ports.get("ESB_PORT_REGISTRY"), Some(&5010));
        assert!(!ports.contains_key("ESB_PORT_S3_MGMT"));
        assert!(!ports.contains_key("ESB_PORT_DATABASE"));
        assert!(!lookup.asked.borrow().contains(&"runtime-node:8443".to_string()));
    }

    #[test]
    fn test_ports_persist_in_config_dir() {
        let temp = TempDir::new().unwrap();
        let config_dir = temp.path().join("staging").join("config");
        assert!(load_ports(&config_dir).unwrap().is_none());

        let ports = BTreeMap::from([
            ("ESB_PORT_GATEWAY_HTTPS".to_string(), 49200),
            ("ESB_PORT_S3".to_string(), 49201),
        ]);
        let path = save_ports(&config_dir, &ports).unwrap();
        assert_eq!(path, config_dir.join("ports.json"));
        assert_eq!(load_ports(&config_dir).unwrap(), Some(ports));
    }
}
