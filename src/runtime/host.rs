// ABOUTME: Per-host engine facade that routes each call to the right adapter.
// ABOUTME: Lifecycle goes through the management API, streaming through the CLI.

use super::bollard::ManagementApi;
use super::cli::{DEFAULT_CLI_PATH, EngineCli};
use super::connection::ConnectionParams;
use super::record::{ContainerRecord, ListFilter};
use super::traits::sealed::Sealed;
use super::traits::{CliError, ContainerError, ContainerOps, SessionExit, StreamingOps};
use crate::service::CreatePayload;
use crate::tunnel::{SshTunnels, TunnelOpener};
use crate::types::{ContainerId, ImageRef};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;

/// One engine host. Adapters are built on first use and reused afterwards.
pub struct HostFacade {
    params: ConnectionParams,
    cli_path: String,
    tunnels: Arc<dyn TunnelOpener>,
    api: OnceCell<ManagementApi>,
    cli: OnceCell<EngineCli>,
}

impl HostFacade {
    pub fn new(params: ConnectionParams) -> Self {
        Self::with_cli_path(params, DEFAULT_CLI_PATH)
    }

    pub fn with_cli_path(params: ConnectionParams, cli_path: impl Into<String>) -> Self {
        Self {
            params,
            cli_path: cli_path.into(),
            tunnels: Arc::new(SshTunnels),
            api: OnceCell::new(),
            cli: OnceCell::new(),
        }
    }

    /// Opener used by CLI calls on tunneled hosts.
    pub fn with_tunnels(mut self, tunnels: Arc<dyn TunnelOpener>) -> Self {
        self.tunnels = tunnels;
        self
    }

    pub fn params(&self) -> &ConnectionParams {
        &self.params
    }

    pub fn hostname(&self) -> &str {
        &self.params.hostname
    }

    async fn api(&self) -> Result<&ManagementApi, ContainerError> {
        self.api
            .get_or_try_init(|| async { ManagementApi::connect(&self.params) })
            .await
            .map_err(ContainerError::from)
    }

    async fn cli(&self) -> &EngineCli {
        self.cli
            .get_or_init(|| async {
                EngineCli::new(self.cli_path.clone(), self.params.clone())
                    .with_tunnels(Arc::clone(&self.tunnels))
            })
            .await
    }
}

impl std::fmt::Debug for HostFacade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostFacade")
            .field("params", &self.params)
            .field("api_ready", &self.api.initialized())
            .finish()
    }
}

impl Sealed for HostFacade {}

#[async_trait]
impl ContainerOps for HostFacade {
    async fn create(
        &self,
        name: &str,
        config: &CreatePayload,
    ) -> Result<ContainerId, ContainerError> {
        self.api().await?.create(name, config).await
    }

    async fn inspect(&self, id: &ContainerId) -> Result<serde_json::Value, ContainerError> {
        self.api().await?.inspect(id).await
    }

    async fn list(&self, filter: ListFilter) -> Result<Vec<ContainerRecord>, ContainerError> {
        self.api().await?.list(filter).await
    }

    async fn start(&self, id: &ContainerId) -> Result<(), ContainerError> {
        self.api().await?.start(id).await
    }

    async fn stop(&self, id: &ContainerId, timeout: Duration) -> Result<(), ContainerError> {
        self.api().await?.stop(id, timeout).await
    }

    async fn remove(&self, id: &ContainerId) -> Result<(), ContainerError> {
        self.api().await?.remove(id).await
    }

    async fn restart(&self, id: &ContainerId) -> Result<(), ContainerError> {
        self.api().await?.restart(id).await
    }
}

#[async_trait]
impl StreamingOps for HostFacade {
    async fn pull(&self, image: &ImageRef) -> Result<(), CliError> {
        self.cli().await.pull(image).await
    }

    async fn follow_logs(&self, id: &ContainerId) -> Result<(), CliError> {
        self.cli().await.follow_logs(id).await
    }

    async fn attach(&self, id: &ContainerId) -> Result<(), CliError> {
        self.cli().await.attach(id).await
    }

    async fn exec(&self, id: &ContainerId, command: &[String]) -> Result<(), CliError> {
        self.cli().await.exec(id, command).await
    }

    async fn interactive_exec(
        &self,
        id: &ContainerId,
        command: &[String],
    ) -> Result<SessionExit, CliError> {
        self.cli().await.interactive_exec(id, command).await
    }
}
