// ABOUTME: Read-only snapshots of containers as reported by the engine.
// ABOUTME: Records are re-fetched on every query and never mutated.

use crate::types::ContainerId;
use chrono::{DateTime, Utc};

/// One published or exposed port of a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortRecord {
    pub host_ip: Option<String>,
    pub container_port: u16,
    /// Public (host) port; absent for ports that are only exposed.
    pub host_port: Option<u16>,
    pub protocol: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerRecord {
    pub id: ContainerId,
    /// Names as reported by the engine, each with a leading `/`.
    pub names: Vec<String>,
    pub image: String,
    pub ports: Vec<PortRecord>,
    /// Human status text, e.g. `Up 5 minutes` or `Exited (0) 2 hours ago`.
    pub status: String,
    pub created: DateTime<Utc>,
}

impl ContainerRecord {
    /// True when the status text marks the container as stopped.
    pub fn is_exited(&self) -> bool {
        self.status.starts_with("Exit ") || self.status.starts_with("Exited")
    }

    /// True when any port entry publishes `port` with `protocol`.
    pub fn publishes(&self, port: u16, protocol: &str) -> bool {
        self.ports
            .iter()
            .any(|p| p.host_port == Some(port) && p.protocol == protocol)
    }

    /// Names joined for display, without the leading slashes.
    pub fn display_names(&self) -> String {
        self.names
            .iter()
            .map(|n| n.trim_start_matches('/'))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Tag portion of the image the container runs; untagged images run `latest`.
    pub fn image_tag(&self) -> &str {
        match self.image.rsplit_once(':') {
            Some((_, tag)) if !tag.contains('/') => tag,
            _ => "latest",
        }
    }
}

/// Which containers a list query returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ListFilter {
    pub include_stopped: bool,
}

impl ListFilter {
    pub fn running() -> Self {
        Self {
            include_stopped: false,
        }
    }
}
