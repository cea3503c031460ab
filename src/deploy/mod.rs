// ABOUTME: Rolling deployment of one service to one host using the type state pattern.
// ABOUTME: Also hosts health validation, retention, and auxiliary per-host operations.

mod error;
pub mod health;
mod interactive;
mod retention;
mod rollout;
mod state;
mod strategy;
mod transitions;

pub use error::{DeployError, DeployErrorKind};
pub use health::{HealthChecker, HealthPolicy, HealthProbe, HttpProbe, ProbeOutcome};
pub use interactive::{
    current_container, enter_container, launch_console, pull_image, restart_container, tail_logs,
};
pub use retention::{CleanupResult, DEFAULT_KEEP, prune_stopped};
pub use rollout::{Rollout, RolloutReport};
pub use state::{Discovered, Initialized, OldStopped, Started, Validated};
pub use strategy::DiscoveryStrategy;
pub use transitions::{DEFAULT_STOP_TIMEOUT, container_name};

use crate::diagnostics::Diagnostics;
use crate::runtime::ContainerOps;
use crate::service::{RestartPolicy, ServiceSpec};
use std::time::Duration;

/// Knobs for one host's rollout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploySettings {
    pub stop_timeout: Duration,
    pub restart_policy: Option<RestartPolicy>,
    /// `None` skips health validation.
    pub health: Option<HealthPolicy>,
    /// Pause after validation so load balancers notice the new container.
    pub rolling_wait: Option<Duration>,
}

impl Default for DeploySettings {
    fn default() -> Self {
        Self {
            stop_timeout: DEFAULT_STOP_TIMEOUT,
            restart_policy: None,
            health: None,
            rolling_wait: None,
        }
    }
}

/// Runs discover, stop, start, and validate against one host. The first failure aborts.
///
/// Old containers stay stopped whatever happens afterwards; there is no automatic rollback.
pub async fn deploy_host<R: ContainerOps + ?Sized, P: HealthProbe>(
    runtime: &R,
    host: &str,
    spec: &ServiceSpec,
    probe: P,
    settings: &DeploySettings,
    diag: &mut Diagnostics,
) -> Result<RolloutReport, DeployError> {
    tracing::info!("{host}: deploying {} ({})", spec.name(), spec.image());

    let started = Rollout::new(spec, host)
        .discover_old(runtime)
        .await?
        .stop_old(runtime, settings.stop_timeout, diag)
        .await?
        .start_new(runtime, settings.restart_policy.as_ref(), diag)
        .await?;

    let validated = match &settings.health {
        Some(policy) => {
            let checker = HealthChecker::new(host, probe);
            started.health_check(runtime, &checker, policy, diag).await?
        }
        None => started.skip_health_check(),
    };

    if let Some(wait) = settings.rolling_wait.filter(|w| !w.is_zero()) {
        tracing::info!("{host}: waiting {wait:?} before moving on");
        tokio::time::sleep(wait).await;
    }

    Ok(validated.finish())
}

#[cfg(test)]
mod tests {
    use super::health::testing::ScriptedProbe;
    use super::*;
    use crate::runtime::testing::{Call, FakeEngine, record};
    use crate::service::PortBinding;
    use crate::types::{ImageRef, ServiceName};
    use tokio::time::Instant;

    fn spec() -> ServiceSpec {
        ServiceSpec::builder(
            ServiceName::new("web").unwrap(),
            ImageRef::parse("nginx:1.26").unwrap(),
        )
        .port_binding(PortBinding::new(8080, 80))
        .build()
        .unwrap()
    }

    fn settings() -> DeploySettings {
        DeploySettings {
            health: Some(HealthPolicy::new(8080, "/health")),
            rolling_wait: Some(Duration::from_secs(20)),
            ..Default::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn deploy_stops_old_then_starts_and_validates_new() {
        let engine = FakeEngine::new(vec![record("old", "/web", "Up 1 day", 10)]);
        let mut diag = Diagnostics::default();

        let start = Instant::now();
        let report = deploy_host(
            &engine,
            "docker1",
            &spec(),
            ScriptedProbe::healthy_after(1),
            &settings(),
            &mut diag,
        )
        .await
        .unwrap();

        assert_eq!(report.stopped, [crate::types::ContainerId::new("old")]);
        assert_eq!(report.health_attempts, Some(2));
        // One probe interval plus the rolling wait.
        assert_eq!(start.elapsed(), Duration::from_secs(25));

        let calls = engine.calls();
        let stop_at = calls.iter().position(|c| matches!(c, Call::Stop(..)));
        let create_at = calls.iter().position(|c| matches!(c, Call::Create { .. }));
        assert!(stop_at < create_at);
        assert!(engine.container("old").unwrap().is_exited());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_validation_leaves_old_stopped_and_new_running() {
        let engine = FakeEngine::new(vec![record("old", "/web", "Up 1 day", 10)]);
        let mut diag = Diagnostics::default();

        let err = deploy_host(
            &engine,
            "docker1",
            &spec(),
            ScriptedProbe::never_healthy(),
            &settings(),
            &mut diag,
        )
        .await
        .unwrap_err();

        assert_eq!(err.kind(), DeployErrorKind::HealthValidation);
        assert!(engine.container("old").unwrap().is_exited());
        assert!(engine.container("new1").is_some());
        assert!(engine.removed_ids().is_empty());
    }
}
