// ABOUTME: Capability traits for talking to a container engine.
// ABOUTME: Lifecycle goes through ContainerOps, streaming and interactive work through StreamingOps.

mod container;
pub(crate) mod sealed;
mod streaming;

pub use container::{ContainerError, ContainerOps};
pub use streaming::{CliError, SessionExit, StreamingOps};
