// ABOUTME: Port binding and bind mount entries as written in the config file.
// ABOUTME: Accepts compact strings ("8080:80/udp", "/data:/data") or detailed maps.

use crate::service::{ConfigError, PortBinding, Protocol, Volume};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum PortBindingEntry {
    /// `[host_ip:]host_port:container_port[/protocol]`
    Simple(String),
    Detailed {
        host_port: u16,
        container_port: u16,
        #[serde(default)]
        protocol: Option<String>,
        #[serde(default)]
        host_ip: Option<String>,
    },
}

impl PortBindingEntry {
    pub fn to_binding(&self) -> Result<PortBinding, ConfigError> {
        match self {
            PortBindingEntry::Simple(s) => parse_port_binding(s),
            PortBindingEntry::Detailed {
                host_port,
                container_port,
                protocol,
                host_ip,
            } => Ok(PortBinding {
                host_port: *host_port,
                container_port: *container_port,
                protocol: match protocol {
                    Some(p) => p
                        .parse()
                        .map_err(|_| ConfigError::InvalidPortBinding(p.clone()))?,
                    None => Protocol::Tcp,
                },
                host_ip: host_ip.clone(),
            }),
        }
    }
}

fn parse_port_binding(spec: &str) -> Result<PortBinding, ConfigError> {
    let invalid = || ConfigError::InvalidPortBinding(spec.to_string());

    let (ports, protocol) = match spec.split_once('/') {
        Some((ports, proto)) => (ports, proto.parse::<Protocol>().map_err(|_| invalid())?),
        None => (spec, Protocol::Tcp),
    };

    let parts: Vec<&str> = ports.split(':').collect();
    let (host_ip, host_port, container_port) = match parts.as_slice() {
        [host, container] => (None, *host, *container),
        [ip, host, container] if !ip.is_empty() => (Some(ip.to_string()), *host, *container),
        _ => return Err(invalid()),
    };

    Ok(PortBinding {
        host_port: host_port.parse().map_err(|_| invalid())?,
        container_port: container_port.parse().map_err(|_| invalid())?,
        protocol,
        host_ip,
    })
}

/// `host_path:container_path`
pub fn parse_bind(spec: &str) -> Result<Volume, ConfigError> {
    match spec.split_once(':') {
        Some((host, container)) if !host.is_empty() && !container.is_empty() => {
            Ok(Volume::new(host, container))
        }
        _ => Err(ConfigError::InvalidVolume(spec.to_string())),
    }
}
