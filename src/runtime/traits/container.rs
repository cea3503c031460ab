// ABOUTME: Lifecycle capability group served by the engine's management API.
// ABOUTME: Create, inspect, list, start, stop, remove, and restart containers.

use super::sealed::Sealed;
use crate::runtime::error::ConnectError;
use crate::runtime::record::{ContainerRecord, ListFilter};
use crate::service::CreatePayload;
use crate::types::ContainerId;
use async_trait::async_trait;
use std::time::Duration;

/// Container lifecycle operations.
#[async_trait]
pub trait ContainerOps: Sealed + Send + Sync {
    /// Create a container named `name`; the host config travels inside `config`.
    async fn create(&self, name: &str, config: &CreatePayload)
    -> Result<ContainerId, ContainerError>;

    /// Full inspect record, used for diagnostics only.
    async fn inspect(&self, id: &ContainerId) -> Result<serde_json::Value, ContainerError>;

    /// Fresh query; no ordering is guaranteed.
    async fn list(&self, filter: ListFilter) -> Result<Vec<ContainerRecord>, ContainerError>;

    async fn start(&self, id: &ContainerId) -> Result<(), ContainerError>;

    async fn stop(&self, id: &ContainerId, timeout: Duration) -> Result<(), ContainerError>;

    async fn remove(&self, id: &ContainerId) -> Result<(), ContainerError>;

    async fn restart(&self, id: &ContainerId) -> Result<(), ContainerError>;
}

/// Errors from lifecycle operations.
#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    #[error("container not found: {0}")]
    NotFound(String),

    #[error("container not running: {0}")]
    NotRunning(String),

    #[error("container already exists: {0}")]
    AlreadyExists(String),

    #[error("image not found: {0}")]
    ImageNotFound(String),

    #[error("invalid container configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("engine error: {0}")]
    Runtime(String),
}

impl ContainerError {
    /// The container is already gone or already stopped.
    pub fn is_tolerable_on_stop(&self) -> bool {
        matches!(self, ContainerError::NotFound(_) | ContainerError::NotRunning(_))
    }
}
