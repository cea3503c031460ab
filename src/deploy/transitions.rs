// ABOUTME: State transition methods for a per-host rollout.
// ABOUTME: Each method consumes the rollout and returns the next state on success.

use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::diagnostics::{Diagnostics, Warning};
use crate::runtime::ContainerOps;
use crate::service::RestartPolicy;
use crate::types::ServiceName;

use super::error::DeployError;
use super::health::{HealthChecker, HealthPolicy, HealthProbe};
use super::rollout::{Rollout, RolloutReport};
use super::state::{Discovered, Initialized, OldStopped, Started, Validated};

pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(30);

// =============================================================================
// Internal Helpers
// =============================================================================

impl<'a, S> Rollout<'a, S> {
    fn transition<T>(self, state: T) -> Rollout<'a, T> {
        Rollout {
            spec: self.spec,
            host: self.host,
            strategy: self.strategy,
            state,
        }
    }
}

/// `<service>-<14 lowercase hex digits>`.
pub fn container_name(service: &ServiceName) -> String {
    static SEQUENCE: AtomicU64 = AtomicU64::new(0);

    let mut hasher = RandomState::new().build_hasher();
    hasher.write_u64(SEQUENCE.fetch_add(1, Ordering::Relaxed));
    hasher.write_u32(std::process::id());
    hasher.write_u128(
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default(),
    );
    format!("{service}-{:014x}", hasher.finish() & 0x00ff_ffff_ffff_ffff)
}

// =============================================================================
// Initialized -> Discovered
// =============================================================================

impl<'a> Rollout<'a, Initialized> {
    /// Find the running containers currently serving the service.
    #[must_use = "rollout state must be used"]
    pub async fn discover_old<R: ContainerOps + ?Sized>(
        self,
        runtime: &R,
    ) -> Result<Rollout<'a, Discovered>, DeployError> {
        let old = self
            .strategy
            .find(runtime)
            .await
            .map_err(|source| DeployError::Discovery {
                host: self.host.clone(),
                source,
            })?;

        tracing::info!(
            "{}: found {} running container(s) by {}",
            self.host,
            old.len(),
            self.strategy
        );
        Ok(self.transition(Discovered { old }))
    }
}

// =============================================================================
// Discovered -> OldStopped
// =============================================================================

impl<'a> Rollout<'a, Discovered> {
    /// Stop each old container. Containers already gone or stopped are skipped.
    #[must_use = "rollout state must be used"]
    pub async fn stop_old<R: ContainerOps + ?Sized>(
        self,
        runtime: &R,
        timeout: Duration,
        diag: &mut Diagnostics,
    ) -> Result<Rollout<'a, OldStopped>, DeployError> {
        let mut stopped = Vec::with_capacity(self.state.old.len());

        for container in &self.state.old {
            tracing::info!(
                "{}: stopping {} ({})",
                self.host,
                container.id.short(),
                container.display_names()
            );
            match runtime.stop(&container.id, timeout).await {
                Ok(()) => stopped.push(container.id.clone()),
                Err(e) if e.is_tolerable_on_stop() => {
                    diag.warn(Warning::tolerated(format!(
                        "{}: skipping {}: {e}",
                        self.host,
                        container.id.short()
                    )));
                }
                Err(source) => {
                    tracing::error!("{}: stop of {} failed", self.host, container.id.short());
                    return Err(DeployError::Stop {
                        host: self.host.clone(),
                        container: container.id.to_string(),
                        source,
                    });
                }
            }
        }

        Ok(self.transition(OldStopped { stopped }))
    }
}

// =============================================================================
// OldStopped -> Started
// =============================================================================

impl<'a> Rollout<'a, OldStopped> {
    /// Compile the service for this host, then create and start the replacement.
    #[must_use = "rollout state must be used"]
    pub async fn start_new<R: ContainerOps + ?Sized>(
        self,
        runtime: &R,
        restart_policy: Option<&RestartPolicy>,
        diag: &mut Diagnostics,
    ) -> Result<Rollout<'a, Started>, DeployError> {
        let payload = self.spec.compile(&self.host, restart_policy).await?;
        let name = container_name(self.spec.name());

        tracing::info!("{}: creating {name} from {}", self.host, self.spec.image());
        let container = runtime
            .create(&name, &payload)
            .await
            .map_err(|source| DeployError::Create {
                host: self.host.clone(),
                name: name.clone(),
                source,
            })?;

        runtime
            .start(&container)
            .await
            .map_err(|source| DeployError::Start {
                host: self.host.clone(),
                container: container.to_string(),
                source,
            })?;
        tracing::info!("{}: started {name} ({})", self.host, container.short());

        match runtime.inspect(&container).await {
            Ok(details) => tracing::debug!("{}: {name} inspected: {details}", self.host),
            Err(e) => diag.warn(Warning::inspect_failed(format!(
                "{}: could not inspect {name}: {e}",
                self.host
            ))),
        }

        let stopped = self.state.stopped.clone();
        Ok(self.transition(Started {
            stopped,
            container,
            name,
        }))
    }
}

// =============================================================================
// Started -> Validated
// =============================================================================

impl<'a> Rollout<'a, Started> {
    /// Wait for the new container to answer its health endpoint.
    #[must_use = "rollout state must be used"]
    pub async fn health_check<R: ContainerOps + ?Sized, P: HealthProbe>(
        self,
        runtime: &R,
        checker: &HealthChecker<P>,
        policy: &HealthPolicy,
        diag: &mut Diagnostics,
    ) -> Result<Rollout<'a, Validated>, DeployError> {
        let attempts = checker
            .wait_until_healthy(runtime, &self.state.container, policy, diag)
            .await
            .inspect_err(|e| tracing::error!("{e}"))?;

        tracing::info!(
            "{}: {} healthy after {attempts} attempt(s)",
            self.host,
            self.state.name
        );
        Ok(self.validated(Some(attempts)))
    }

    /// Accept the new container without probing it.
    #[must_use = "rollout state must be used"]
    pub fn skip_health_check(self) -> Rollout<'a, Validated> {
        tracing::info!("{}: health check skipped for {}", self.host, self.state.name);
        self.validated(None)
    }

    fn validated(self, attempts: Option<u32>) -> Rollout<'a, Validated> {
        let Started {
            stopped,
            container,
            name,
        } = self.state.clone();
        self.transition(Validated {
            stopped,
            container,
            name,
            attempts,
        })
    }
}

// =============================================================================
// Validated - Terminal State
// =============================================================================

impl Rollout<'_, Validated> {
    pub fn finish(self) -> RolloutReport {
        RolloutReport {
            host: self.host,
            container: self.state.container,
            container_name: self.state.name,
            stopped: self.state.stopped,
            health_attempts: self.state.attempts,
        }
    }
}
