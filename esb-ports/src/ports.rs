use serde::Serialize;
use std::fmt;

/// Named host ports exposed by an environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LogicalPort {
    GatewayHttps,
    GatewayHttp,
    AgentGrpc,
    S3,
    S3Mgmt,
    Database,
    Registry,
    VictoriaLogs,
}

impl LogicalPort {
    pub const ALL: [LogicalPort; 8] = [
        LogicalPort::GatewayHttps,
        LogicalPort::GatewayHttp,
        LogicalPort::AgentGrpc,
        LogicalPort::S3,
        LogicalPort::S3Mgmt,
        LogicalPort::Database,
        LogicalPort::Registry,
        LogicalPort::VictoriaLogs,
    ];

    /// Environment variable the compose files read this port from.
    pub fn env_key(&self) -> &'static str {
        match self {
            LogicalPort::GatewayHttps => "ESB_PORT_GATEWAY_HTTPS",
            LogicalPort::GatewayHttp => "ESB_PORT_GATEWAY_HTTP",
            LogicalPort::AgentGrpc => "ESB_PORT_AGENT_GRPC",
            LogicalPort::S3 => "ESB_PORT_S3",
            LogicalPort::S3Mgmt => "ESB_PORT_S3_MGMT",
            LogicalPort::Database => "ESB_PORT_DATABASE",
            LogicalPort::Registry => "ESB_PORT_REGISTRY",
            LogicalPort::VictoriaLogs => "ESB_PORT_VICTORIALOGS",
        }
    }

    /// `0` asks the runtime for an ephemeral port, discovered after start. Only the
    /// registry has a fixed well-known port.
    pub fn default_port(&self) -> u16 {
        match self {
            LogicalPort::Registry => 5010,
            _ => 0,
        }
    }
}

impl fmt::Display for LogicalPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogicalPort::GatewayHttps => "gateway-https",
            LogicalPort::GatewayHttp => "gateway-http",
            LogicalPort::AgentGrpc => "agent-grpc",
            LogicalPort::S3 => "s3",
            LogicalPort::S3Mgmt => "s3-mgmt",
            LogicalPort::Database => "database",
            LogicalPort::Registry => "registry",
            LogicalPort::VictoriaLogs => "victorialogs",
        };
        f.write_str(name)
    }
}

/// Host port assignment for every [`LogicalPort`], in a fixed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortTable {
    entries: Vec<(LogicalPort, u16)>,
}

impl Default for PortTable {
    fn default() -> Self {
        Self {
            entries: LogicalPort::ALL
                .iter()
                .map(|port| (*port, port.default_port()))
                .collect(),
        }
    }
}

impl PortTable {
    pub fn get(&self, port: LogicalPort) -> u16 {
        self.entries
            .iter()
            .find(|(p, _)| *p == port)
            .map(|(_, value)| *value)
            .unwrap_or_else(|| port.default_port())
    }

    pub fn iter(&self) -> impl Iterator<Item = (LogicalPort, u16)> + '_ {
        self.entries.iter().copied()
    }
}
