// ABOUTME: SSH tunnels from a local Unix socket to a remote engine socket.
// ABOUTME: Used only by CLI-backed operations; each invocation gets its own tunnel.

mod client;
mod error;
mod forward;
#[cfg(test)]
pub(crate) mod testing;

pub use client::TunnelSession;
pub use error::{Error, Result};

use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

pub const DEFAULT_SSH_PORT: u16 = 22;
pub const DEFAULT_REMOTE_SOCKET: &str = "/var/run/docker.sock";

/// How to reach a host's engine socket over SSH.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TunnelConfig {
    /// Login user; the local `USER` when unset.
    pub user: Option<String>,
    pub port: u16,
    /// Level of tunnel open/close events.
    pub log_level: Level,
    /// SSH keepalive interval.
    pub heartbeat: Option<Duration>,
    pub remote_socket: String,
    pub key_path: Option<PathBuf>,
    /// Accept and record unknown host keys.
    pub trust_first_connection: bool,
    /// Defaults to `~/.ssh/known_hosts`.
    pub known_hosts_path: Option<PathBuf>,
}

impl Default for TunnelConfig {
    fn default() -> Self {
        Self {
            user: None,
            port: DEFAULT_SSH_PORT,
            log_level: Level::DEBUG,
            heartbeat: None,
            remote_socket: DEFAULT_REMOTE_SOCKET.to_string(),
            key_path: None,
            trust_first_connection: false,
            known_hosts_path: None,
        }
    }
}

impl TunnelConfig {
    pub(crate) fn effective_user(&self) -> String {
        self.user
            .clone()
            .or_else(|| std::env::var("USER").ok())
            .unwrap_or_else(|| "root".to_string())
    }
}

/// An open tunnel as seen by the code that runs through it.
#[async_trait]
pub trait Tunnel: Send {
    /// `unix://` endpoint the engine CLI should target.
    fn local_endpoint(&self) -> &str;

    async fn close(self: Box<Self>) -> Result<()>;
}

/// Opens one tunnel per engine CLI invocation.
#[async_trait]
pub trait TunnelOpener: Send + Sync {
    async fn open(&self, config: &TunnelConfig, hostname: &str) -> Result<Box<dyn Tunnel>>;
}

/// Opens real SSH tunnels.
#[derive(Debug, Default, Clone, Copy)]
pub struct SshTunnels;

#[async_trait]
impl TunnelOpener for SshTunnels {
    async fn open(&self, config: &TunnelConfig, hostname: &str) -> Result<Box<dyn Tunnel>> {
        Ok(Box::new(TunnelSession::open(config, hostname).await?))
    }
}

#[async_trait]
impl Tunnel for TunnelSession {
    fn local_endpoint(&self) -> &str {
        TunnelSession::local_endpoint(self)
    }

    async fn close(self: Box<Self>) -> Result<()> {
        TunnelSession::close(*self).await
    }
}
