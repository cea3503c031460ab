// ABOUTME: Chooses how a service's existing containers are identified on a host.
// ABOUTME: Published-port lookup when the service binds ports, name pattern otherwise.

use crate::runtime::{ContainerError, ContainerOps, ContainerRecord, Discovery};
use crate::service::{Protocol, ServiceSpec};

/// How to find the containers currently serving a service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryStrategy {
    /// Containers named after the service, with or without a generated suffix.
    ByName(String),

    /// Running containers publishing the service's first host port.
    ByPublicPort { port: u16, protocol: Protocol },
}

impl DiscoveryStrategy {
    /// Name lookup when there are no bindings or the container shares the host network;
    /// otherwise the first binding's host port. Later bindings are ignored.
    pub fn for_service(spec: &ServiceSpec) -> Self {
        match spec.port_bindings().first() {
            Some(binding) if spec.network_mode() != "host" => DiscoveryStrategy::ByPublicPort {
                port: binding.host_port,
                protocol: binding.protocol,
            },
            _ => DiscoveryStrategy::ByName(spec.name().to_string()),
        }
    }

    /// Running containers matched by this strategy.
    pub async fn find<R: ContainerOps + ?Sized>(
        &self,
        runtime: &R,
    ) -> Result<Vec<ContainerRecord>, ContainerError> {
        match self {
            DiscoveryStrategy::ByName(name) => runtime.find_by_name(name, false).await,
            DiscoveryStrategy::ByPublicPort { port, protocol } => {
                runtime.find_by_public_port(*port, protocol.as_str()).await
            }
        }
    }
}

impl std::fmt::Display for DiscoveryStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiscoveryStrategy::ByName(name) => write!(f, "name {name}"),
            DiscoveryStrategy::ByPublicPort { port, protocol } => {
                write!(f, "public port {port}/{protocol}")
            }
        }
    }
}
