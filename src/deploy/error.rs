// ABOUTME: Error types for rollout, health validation, cleanup, and auxiliary commands.
// ABOUTME: Every engine failure names the host and the operation it interrupted.

use crate::runtime::{CliError, ContainerError};
use crate::service::ConfigError;

/// Errors that abort work on a host.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error("invalid service configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("{host}: failed to discover containers: {source}")]
    Discovery {
        host: String,
        #[source]
        source: ContainerError,
    },

    #[error("{host}: failed to stop container {container}: {source}")]
    Stop {
        host: String,
        container: String,
        #[source]
        source: ContainerError,
    },

    #[error("{host}: failed to create container {name}: {source}")]
    Create {
        host: String,
        name: String,
        #[source]
        source: ContainerError,
    },

    #[error("{host}: failed to start container {container}: {source}")]
    Start {
        host: String,
        container: String,
        #[source]
        source: ContainerError,
    },

    #[error("{host}: failed to query container state while probing: {source}")]
    Probe {
        host: String,
        #[source]
        source: ContainerError,
    },

    #[error("{host}: new container did not answer on port {port} after {attempts} attempts")]
    HealthValidationFailed { host: String, port: u16, attempts: u32 },

    #[error("{host}: failed to remove container {container}: {source}")]
    Cleanup {
        host: String,
        container: String,
        #[source]
        source: ContainerError,
    },

    #[error("{host}: failed to restart container {container}: {source}")]
    Restart {
        host: String,
        container: String,
        #[source]
        source: ContainerError,
    },

    #[error("{host}: {operation} failed: {source}")]
    Streaming {
        host: String,
        operation: &'static str,
        #[source]
        source: CliError,
    },

    #[error("{host}: no running container found for {service}")]
    NoContainer { host: String, service: String },
}

/// Coarse classification for callers that branch on failure type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployErrorKind {
    /// The service description is invalid; retrying will not help.
    Configuration,
    /// An engine or CLI operation failed.
    Backend,
    /// The new container never became healthy.
    HealthValidation,
    /// Nothing matched the service on the host.
    NotFound,
}

impl DeployError {
    pub fn kind(&self) -> DeployErrorKind {
        match self {
            DeployError::Config(_) => DeployErrorKind::Configuration,
            DeployError::HealthValidationFailed { .. } => DeployErrorKind::HealthValidation,
            DeployError::NoContainer { .. } => DeployErrorKind::NotFound,
            DeployError::Discovery { .. }
            | DeployError::Stop { .. }
            | DeployError::Create { .. }
            | DeployError::Start { .. }
            | DeployError::Probe { .. }
            | DeployError::Cleanup { .. }
            | DeployError::Restart { .. }
            | DeployError::Streaming { .. } => DeployErrorKind::Backend,
        }
    }
}
