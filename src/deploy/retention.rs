// ABOUTME: Retention pass that bounds how many stopped containers a service keeps per host.
// ABOUTME: The newest stopped containers are retained; older ones are removed.

use super::error::DeployError;
use crate::runtime::{ContainerError, ContainerOps, Discovery};
use crate::types::ContainerId;

/// Stopped containers kept for manual recovery.
pub const DEFAULT_KEEP: usize = 2;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupResult {
    pub retained: Vec<ContainerId>,
    pub removed: Vec<ContainerId>,
}

/// Removes all but the `keep` newest stopped containers of `service` on `host`.
///
/// Containers that vanish mid-pass are counted as removed.
pub async fn prune_stopped<R: ContainerOps + ?Sized>(
    runtime: &R,
    host: &str,
    service: &str,
    keep: usize,
) -> Result<CleanupResult, DeployError> {
    let stopped = runtime
        .find_stopped_by_name(service)
        .await
        .map_err(|source| DeployError::Discovery {
            host: host.to_string(),
            source,
        })?;

    let mut result = CleanupResult::default();
    for (index, container) in stopped.into_iter().enumerate() {
        if index < keep {
            result.retained.push(container.id);
            continue;
        }

        tracing::info!(
            "{host}: removing stopped container {} ({})",
            container.id.short(),
            container.display_names()
        );
        match runtime.remove(&container.id).await {
            Ok(()) => {}
            Err(ContainerError::NotFound(_)) => {
                tracing::debug!("{host}: container {} already gone", container.id.short());
            }
            Err(source) => {
                return Err(DeployError::Cleanup {
                    host: host.to_string(),
                    container: container.id.to_string(),
                    source,
                });
            }
        }
        result.removed.push(container.id);
    }

    Ok(result)
}
