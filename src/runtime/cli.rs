// ABOUTME: CLI adapter that serves streaming and interactive operations via the engine binary.
// ABOUTME: Opens a fresh tunnel per invocation when the host is configured for one.

use super::connection::ConnectionParams;
use super::traits::sealed::Sealed;
use super::traits::{CliError, SessionExit, StreamingOps};
use crate::tunnel::{SshTunnels, TunnelOpener};
use crate::types::{ContainerId, ImageRef};
use async_trait::async_trait;
use std::process::ExitStatus;
use std::sync::Arc;
use tokio::process::Command;

pub const DEFAULT_CLI_PATH: &str = "docker";

/// Exit status the engine CLI uses for its own failures, as opposed to the command it ran.
const CLI_FAILURE_STATUS: i32 = 125;

/// Runs the engine CLI with inherited stdio against one host.
#[derive(Clone)]
pub struct EngineCli {
    program: String,
    params: ConnectionParams,
    tunnels: Arc<dyn TunnelOpener>,
}

impl std::fmt::Debug for EngineCli {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineCli")
            .field("program", &self.program)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl EngineCli {
    pub fn new(program: impl Into<String>, params: ConnectionParams) -> Self {
        Self {
            program: program.into(),
            params,
            tunnels: Arc::new(SshTunnels),
        }
    }

    /// Replaces how tunnels are opened for hosts that use one.
    pub fn with_tunnels(mut self, tunnels: Arc<dyn TunnelOpener>) -> Self {
        self.tunnels = tunnels;
        self
    }

    /// Full argument list: host, TLS flags, then the verb and its arguments.
    pub fn argv(&self, tunnel_endpoint: Option<&str>, verb_args: &[String]) -> Vec<String> {
        let mut argv = vec![self.params.cli_host_flag(tunnel_endpoint)];
        argv.extend(self.params.tls.cli_flags());
        argv.extend(verb_args.iter().cloned());
        argv
    }

    /// Runs one invocation, wrapping it in a tunnel when configured.
    async fn run(&self, verb_args: Vec<String>) -> Result<ExitStatus, CliError> {
        let Some(ref tunnel) = self.params.tunnel else {
            return self.spawn(None, &verb_args).await;
        };

        let tunnel = self.tunnels.open(tunnel, &self.params.hostname).await?;
        let result = self.spawn(Some(tunnel.local_endpoint()), &verb_args).await;
        if let Err(e) = tunnel.close().await {
            tracing::warn!("failed to close tunnel to {}: {e}", self.params.hostname);
        }
        result
    }

    async fn spawn(
        &self,
        tunnel_endpoint: Option<&str>,
        verb_args: &[String],
    ) -> Result<ExitStatus, CliError> {
        let argv = self.argv(tunnel_endpoint, verb_args);
        tracing::debug!("running {} {}", self.program, argv.join(" "));

        Command::new(&self.program)
            .args(&argv)
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|source| CliError::Spawn {
                program: self.program.clone(),
                source,
            })
    }

    async fn run_checked(&self, verb_args: Vec<String>) -> Result<(), CliError> {
        let verb = verb_args.first().cloned().unwrap_or_default();
        let status = self.run(verb_args).await?;
        if status.success() {
            Ok(())
        } else {
            Err(CliError::NonZeroExit {
                verb,
                code: status.code(),
            })
        }
    }
}

fn strings<const N: usize>(args: [&str; N]) -> Vec<String> {
    args.iter().map(|s| s.to_string()).collect()
}

impl Sealed for EngineCli {}

#[async_trait]
impl StreamingOps for EngineCli {
    async fn pull(&self, image: &ImageRef) -> Result<(), CliError> {
        tracing::info!("pulling {image} on {}", self.params.hostname);
        self.run_checked(strings(["pull", &image.to_string()])).await
    }

    async fn follow_logs(&self, id: &ContainerId) -> Result<(), CliError> {
        tracing::info!("tailing the logs of {}", id.short());
        self.run_checked(strings(["logs", "-f", id.as_str()])).await
    }

    async fn attach(&self, id: &ContainerId) -> Result<(), CliError> {
        self.run_checked(strings(["attach", id.as_str()])).await
    }

    async fn exec(&self, id: &ContainerId, command: &[String]) -> Result<(), CliError> {
        let mut args = strings(["exec", id.as_str()]);
        args.extend(command.iter().cloned());
        self.run_checked(args).await
    }

    async fn interactive_exec(
        &self,
        id: &ContainerId,
        command: &[String],
    ) -> Result<SessionExit, CliError> {
        let mut args = strings(["exec", "-it", id.as_str()]);
        args.extend(command.iter().cloned());

        let status = self.run(args).await?;
        match status.code() {
            Some(CLI_FAILURE_STATUS) => Err(CliError::SessionFailed {
                code: CLI_FAILURE_STATUS,
            }),
            code => Ok(SessionExit { code }),
        }
    }
}
