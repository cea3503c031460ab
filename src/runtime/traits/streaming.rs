// ABOUTME: Streaming and interactive capability group served by the engine CLI.
// ABOUTME: Pull, follow logs, attach, exec, and interactive exec with inherited stdio.

use super::sealed::Sealed;
use crate::tunnel;
use crate::types::{ContainerId, ImageRef};
use async_trait::async_trait;

/// Outcome of an interactive session.
///
/// `code` is the exit status of the last command run inside the session. A
/// non-zero value is not a failure of the session itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionExit {
    pub code: Option<i32>,
}

impl SessionExit {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Operations that stream output to, or take input from, the operator's terminal.
#[async_trait]
pub trait StreamingOps: Sealed + Send + Sync {
    async fn pull(&self, image: &ImageRef) -> Result<(), CliError>;

    /// Follows logs until the stream ends or the process is interrupted.
    async fn follow_logs(&self, id: &ContainerId) -> Result<(), CliError>;

    async fn attach(&self, id: &ContainerId) -> Result<(), CliError>;

    async fn exec(&self, id: &ContainerId, command: &[String]) -> Result<(), CliError>;

    async fn interactive_exec(
        &self,
        id: &ContainerId,
        command: &[String],
    ) -> Result<SessionExit, CliError>;
}

/// Errors from CLI-backed operations.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{verb}` exited with status {}", display_code(.code))]
    NonZeroExit { verb: String, code: Option<i32> },

    #[error("could not establish session: engine CLI exited with status {code}")]
    SessionFailed { code: i32 },

    #[error("tunnel error: {0}")]
    Tunnel(#[from] tunnel::Error),
}

fn display_code(code: &Option<i32>) -> String {
    code.map(|c| c.to_string())
        .unwrap_or_else(|| "unknown (terminated by signal)".to_string())
}
