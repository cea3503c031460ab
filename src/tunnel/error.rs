// ABOUTME: Errors raised while opening or closing an SSH tunnel to an engine socket.
// ABOUTME: Covers connection, authentication, host key, and forwarding failures.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("SSH connection to {host}:{port} failed: {reason}")]
    Connection {
        host: String,
        port: u16,
        reason: String,
    },

    #[error("host key for {0} was rejected by known_hosts")]
    HostKeyRejected(String),

    #[error("SSH authentication as {user} failed: no key was accepted")]
    AuthenticationFailed { user: String },

    #[error("no SSH credentials available: {0}")]
    NoCredentials(String),

    #[error("failed to load key from {path}: {reason}")]
    KeyLoad { path: PathBuf, reason: String },

    #[error("failed to forward {remote_socket}: {reason}")]
    Forward {
        remote_socket: String,
        reason: String,
    },

    #[error("SSH protocol error: {0}")]
    Protocol(#[from] russh::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
