// ABOUTME: Connection errors for the management API client, using SNAFU.
// ABOUTME: Raised when a client cannot be built from the host's connection parameters.

use snafu::Snafu;
use std::path::PathBuf;

/// Failure to build a management API client.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ConnectError {
    #[snafu(display(
        "TLS to {address} needs a CA certificate, client certificate, and client key; missing {missing}"
    ))]
    IncompleteTls { address: String, missing: String },

    #[snafu(display("TLS file {} is not readable: {source}", path.display()))]
    TlsFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("failed to create engine client for {address}: {source}"))]
    Client {
        address: String,
        source: bollard::errors::Error,
    },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectErrorKind {
    /// The connection parameters are incomplete or point at unreadable files.
    Configuration,
    /// The client library rejected the connection.
    Client,
}

impl ConnectError {
    pub fn kind(&self) -> ConnectErrorKind {
        match self {
            ConnectError::IncompleteTls { .. } | ConnectError::TlsFile { .. } => {
                ConnectErrorKind::Configuration
            }
            ConnectError::Client { .. } => ConnectErrorKind::Client,
        }
    }
}
