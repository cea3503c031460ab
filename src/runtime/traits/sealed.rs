// ABOUTME: Sealed supertrait for the engine capability traits.
// ABOUTME: Only adapters inside this crate may implement ContainerOps or StreamingOps.

/// Implemented by the crate's engine adapters and test doubles.
pub trait Sealed {}
