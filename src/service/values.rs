// ABOUTME: Plain value records making up a service description.
// ABOUTME: Port bindings, volumes, and the restart policy with its lenient name normalization.

use std::fmt;
use std::str::FromStr;

/// Transport protocol of a published port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Protocol {
    #[default]
    Tcp,
    Udp,
    Sctp,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Tcp => "tcp",
            Protocol::Udp => "udp",
            Protocol::Sctp => "sctp",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tcp" => Ok(Protocol::Tcp),
            "udp" => Ok(Protocol::Udp),
            "sctp" => Ok(Protocol::Sctp),
            other => Err(format!("unknown protocol: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortBinding {
    pub host_port: u16,
    pub container_port: u16,
    pub protocol: Protocol,
    pub host_ip: Option<String>,
}

impl PortBinding {
    pub fn new(host_port: u16, container_port: u16) -> Self {
        Self {
            host_port,
            container_port,
            protocol: Protocol::Tcp,
            host_ip: None,
        }
    }

    /// Key used by the engine for exposed ports and port bindings, e.g. `80/tcp`.
    pub fn port_key(&self) -> String {
        format!("{}/{}", self.container_port, self.protocol)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Volume {
    pub host_path: String,
    pub container_path: String,
}

impl Volume {
    pub fn new(host_path: impl Into<String>, container_path: impl Into<String>) -> Self {
        Self {
            host_path: host_path.into(),
            container_path: container_path.into(),
        }
    }

    /// `host:container`, the bind form the engine expects.
    pub fn bind(&self) -> String {
        format!("{}:{}", self.host_path, self.container_path)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RestartPolicyName {
    Always,
    #[default]
    OnFailure,
    No,
    UnlessStopped,
}

impl RestartPolicyName {
    pub fn as_str(&self) -> &'static str {
        match self {
            RestartPolicyName::Always => "always",
            RestartPolicyName::OnFailure => "on-failure",
            RestartPolicyName::No => "no",
            RestartPolicyName::UnlessStopped => "unless-stopped",
        }
    }

    /// Maps any unrecognized name to `on-failure`.
    pub fn normalize(name: &str) -> Self {
        match name {
            "always" => RestartPolicyName::Always,
            "on-failure" => RestartPolicyName::OnFailure,
            "no" => RestartPolicyName::No,
            "unless-stopped" => RestartPolicyName::UnlessStopped,
            other => {
                tracing::warn!("unknown restart policy '{other}', using on-failure");
                RestartPolicyName::OnFailure
            }
        }
    }
}

impl fmt::Display for RestartPolicyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const DEFAULT_MAX_RETRY_COUNT: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RestartPolicy {
    pub name: RestartPolicyName,
    pub max_retry_count: Option<u32>,
}

impl RestartPolicy {
    pub fn new(name: &str, max_retry_count: Option<u32>) -> Self {
        Self {
            name: RestartPolicyName::normalize(name),
            max_retry_count,
        }
    }

    /// Retry count as sent to the engine; only `on-failure` carries one.
    pub fn effective_max_retry_count(&self) -> Option<u32> {
        (self.name == RestartPolicyName::OnFailure)
            .then(|| self.max_retry_count.unwrap_or(DEFAULT_MAX_RETRY_COUNT))
    }
}

impl fmt::Display for RestartPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.effective_max_retry_count() {
            Some(n) => write!(f, "{}:{n}", self.name),
            None => write!(f, "{}", self.name),
        }
    }
}
