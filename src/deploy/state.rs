// ABOUTME: Rollout state types for the type state pattern.
// ABOUTME: Each state carries the data the next transition needs.

use crate::runtime::ContainerRecord;
use crate::types::ContainerId;

/// Nothing inspected yet.
/// Available actions: `discover_old()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Initialized;

/// Containers currently serving the service are known.
/// Available actions: `stop_old()`
#[derive(Debug, Clone)]
pub struct Discovered {
    pub(crate) old: Vec<ContainerRecord>,
}

/// Old containers are stopped (but kept).
/// Available actions: `start_new()`
#[derive(Debug, Clone)]
pub struct OldStopped {
    pub(crate) stopped: Vec<ContainerId>,
}

/// Replacement container created and started.
/// Available actions: `health_check()`, `skip_health_check()`
#[derive(Debug, Clone)]
pub struct Started {
    pub(crate) stopped: Vec<ContainerId>,
    pub(crate) container: ContainerId,
    pub(crate) name: String,
}

/// Replacement passed validation (or validation was skipped).
/// Available actions: `finish()`
#[derive(Debug, Clone)]
pub struct Validated {
    pub(crate) stopped: Vec<ContainerId>,
    pub(crate) container: ContainerId,
    pub(crate) name: String,
    pub(crate) attempts: Option<u32>,
}

impl Discovered {
    pub fn old(&self) -> &[ContainerRecord] {
        &self.old
    }
}

impl Started {
    pub fn container(&self) -> &ContainerId {
        &self.container
    }
}
