// ABOUTME: Per-host rollout parameterized by its state marker.
// ABOUTME: Holds the service description and the host the rollout targets.

use super::state::{Initialized, Started, Validated};
use super::strategy::DiscoveryStrategy;
use crate::service::ServiceSpec;
use crate::types::ContainerId;

/// A rollout of one service to one host.
///
/// The state parameter `S` carries what earlier steps produced, so a
/// container id exists exactly when a transition has created one.
#[derive(Debug)]
pub struct Rollout<'a, S> {
    pub(crate) spec: &'a ServiceSpec,
    pub(crate) host: String,
    pub(crate) strategy: DiscoveryStrategy,
    pub(crate) state: S,
}

impl<'a> Rollout<'a, Initialized> {
    pub fn new(spec: &'a ServiceSpec, host: impl Into<String>) -> Self {
        Rollout {
            spec,
            host: host.into(),
            strategy: DiscoveryStrategy::for_service(spec),
            state: Initialized,
        }
    }
}

impl<S> Rollout<'_, S> {
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn strategy(&self) -> &DiscoveryStrategy {
        &self.strategy
    }

    pub fn state(&self) -> &S {
        &self.state
    }
}

impl Rollout<'_, Started> {
    pub fn new_container(&self) -> &ContainerId {
        &self.state.container
    }
}

impl Rollout<'_, Validated> {
    pub fn new_container(&self) -> &ContainerId {
        &self.state.container
    }
}

/// What a completed rollout did on its host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolloutReport {
    pub host: String,
    pub container: ContainerId,
    pub container_name: String,
    /// Old containers left stopped.
    pub stopped: Vec<ContainerId>,
    /// Attempt that passed validation; `None` when validation was skipped.
    pub health_attempts: Option<u32>,
}
