// ABOUTME: Engine access for one host: capability traits, adapters, and discovery.
// ABOUTME: The management API serves lifecycle calls; the CLI serves streaming ones.

mod bollard;
mod cli;
mod connection;
mod discovery;
mod error;
mod host;
mod record;
#[cfg(test)]
pub(crate) mod testing;
mod traits;

pub use self::bollard::ManagementApi;
pub use cli::{DEFAULT_CLI_PATH, EngineCli};
pub use connection::{ConnectionParams, PLAIN_PORT, TLS_PORT, TlsSettings};
pub use discovery::{Discovery, name_matches};
pub use error::{ConnectError, ConnectErrorKind};
pub use host::HostFacade;
pub use record::{ContainerRecord, ListFilter, PortRecord};
pub use traits::{CliError, ContainerError, ContainerOps, SessionExit, StreamingOps};
