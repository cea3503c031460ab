// ABOUTME: Health validation of a newly started container.
// ABOUTME: Polls engine state and an HTTP endpoint until healthy or attempts run out.

use super::error::DeployError;
use crate::diagnostics::{Diagnostics, Warning};
use crate::runtime::{ContainerOps, Discovery};
use crate::types::ContainerId;
use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::Empty;
use hyper_util::rt::TokioIo;
use std::time::Duration;
use tokio::net::TcpStream;

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_MAX_ATTEMPTS: u32 = 12;
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Result of one HTTP probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Healthy,
    /// Answered with a non-2xx status.
    Status(u16),
    /// Connection failed or timed out.
    Unreachable(String),
}

/// Checks one endpoint once.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    async fn check(&self, host: &str, port: u16, endpoint: &str) -> ProbeOutcome;
}

/// `GET http://<host>:<port><endpoint>` over HTTP/1.1; only the status code matters.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    timeout: Duration,
}

impl HttpProbe {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    async fn request(host: &str, port: u16, endpoint: &str) -> Result<u16, String> {
        let authority = format!("{host}:{port}");
        let stream = TcpStream::connect(&authority)
            .await
            .map_err(|e| format!("connect to {authority}: {e}"))?;

        let (mut sender, conn) = hyper::client::conn::http1::handshake(TokioIo::new(stream))
            .await
            .map_err(|e| format!("HTTP handshake with {authority}: {e}"))?;
        tokio::spawn(async move {
            if let Err(e) = conn.await {
                tracing::debug!("health probe connection closed: {e}");
            }
        });

        let req = hyper::Request::builder()
            .method("GET")
            .uri(endpoint)
            .header("Host", &authority)
            .body(Empty::<Bytes>::new())
            .map_err(|e| format!("invalid health endpoint {endpoint}: {e}"))?;

        let resp = sender
            .send_request(req)
            .await
            .map_err(|e| format!("GET {endpoint} on {authority}: {e}"))?;
        Ok(resp.status().as_u16())
    }
}

impl Default for HttpProbe {
    fn default() -> Self {
        Self::new(DEFAULT_PROBE_TIMEOUT)
    }
}

#[async_trait]
impl HealthProbe for HttpProbe {
    async fn check(&self, host: &str, port: u16, endpoint: &str) -> ProbeOutcome {
        match tokio::time::timeout(self.timeout, Self::request(host, port, endpoint)).await {
            Ok(Ok(status)) if (200..300).contains(&status) => ProbeOutcome::Healthy,
            Ok(Ok(status)) => ProbeOutcome::Status(status),
            Ok(Err(reason)) => ProbeOutcome::Unreachable(reason),
            Err(_) => ProbeOutcome::Unreachable(format!("timed out after {:?}", self.timeout)),
        }
    }
}

/// Where and how patiently to probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthPolicy {
    pub port: u16,
    pub endpoint: String,
    pub interval: Duration,
    pub max_attempts: u32,
}

impl HealthPolicy {
    pub fn new(port: u16, endpoint: impl Into<String>) -> Self {
        Self {
            port,
            endpoint: endpoint.into(),
            interval: DEFAULT_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// Validates containers on one host.
#[derive(Debug)]
pub struct HealthChecker<P = HttpProbe> {
    host: String,
    probe: P,
}

impl<P: HealthProbe> HealthChecker<P> {
    pub fn new(host: impl Into<String>, probe: P) -> Self {
        Self {
            host: host.into(),
            probe,
        }
    }

    /// True when `id` is running and the endpoint answers 2xx.
    ///
    /// Failed probes are recorded in `diag`. Engine query failures propagate.
    pub async fn probe<R: ContainerOps + ?Sized>(
        &self,
        runtime: &R,
        id: &ContainerId,
        port: u16,
        endpoint: &str,
        diag: &mut Diagnostics,
    ) -> Result<bool, DeployError> {
        let running = runtime
            .find_by_id(id)
            .await
            .map_err(|source| DeployError::Probe {
                host: self.host.clone(),
                source,
            })?;

        if running.is_none() {
            diag.warn(Warning::probe_failure(format!(
                "{}: container {} is not running",
                self.host,
                id.short()
            )));
            return Ok(false);
        }

        match self.probe.check(&self.host, port, endpoint).await {
            ProbeOutcome::Healthy => Ok(true),
            ProbeOutcome::Status(status) => {
                diag.warn(Warning::probe_failure(format!(
                    "{}: {endpoint} on port {port} answered {status}",
                    self.host
                )));
                Ok(false)
            }
            ProbeOutcome::Unreachable(reason) => {
                diag.warn(Warning::probe_failure(format!("{}: {reason}", self.host)));
                Ok(false)
            }
        }
    }

    /// Probes up to `policy.max_attempts` times, sleeping `policy.interval` between attempts.
    ///
    /// Returns the attempt number that succeeded.
    pub async fn wait_until_healthy<R: ContainerOps + ?Sized>(
        &self,
        runtime: &R,
        id: &ContainerId,
        policy: &HealthPolicy,
        diag: &mut Diagnostics,
    ) -> Result<u32, DeployError> {
        for attempt in 1..=policy.max_attempts {
            if attempt > 1 {
                tokio::time::sleep(policy.interval).await;
            }
            tracing::info!(
                "{}: health check attempt {attempt}/{} for {}",
                self.host,
                policy.max_attempts,
                id.short()
            );
            if self
                .probe(runtime, id, policy.port, &policy.endpoint, diag)
                .await?
            {
                return Ok(attempt);
            }
        }

        Err(DeployError::HealthValidationFailed {
            host: self.host.clone(),
            port: policy.port,
            attempts: policy.max_attempts,
        })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    /// Probe that replays scripted outcomes, then keeps answering with the last one.
    pub struct ScriptedProbe {
        outcomes: Mutex<VecDeque<ProbeOutcome>>,
        calls: Mutex<Vec<(String, u16, String)>>,
    }

    impl ScriptedProbe {
        pub fn new(outcomes: impl IntoIterator<Item = ProbeOutcome>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes.into_iter().collect()),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn healthy_after(failures: usize) -> Self {
            let mut outcomes = vec![ProbeOutcome::Unreachable("connection refused".into()); failures];
            outcomes.push(ProbeOutcome::Healthy);
            Self::new(outcomes)
        }

        pub fn never_healthy() -> Self {
            Self::new([ProbeOutcome::Status(503)])
        }

        pub fn calls(&self) -> Vec<(String, u16, String)> {
            self.calls.lock().clone()
        }
    }

    #[async_trait]
    impl HealthProbe for ScriptedProbe {
        async fn check(&self, host: &str, port: u16, endpoint: &str) -> ProbeOutcome {
            self.calls
                .lock()
                .push((host.to_string(), port, endpoint.to_string()));
            let mut outcomes = self.outcomes.lock();
            if outcomes.len() > 1 {
                outcomes.pop_front().unwrap_or(ProbeOutcome::Healthy)
            } else {
                outcomes.front().cloned().unwrap_or(ProbeOutcome::Healthy)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::ScriptedProbe;
    use super::*;
    use crate::diagnostics::WarningKind;
    use crate::runtime::ContainerError;
    use crate::runtime::testing::{FakeEngine, Op, record};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::time::Instant;

    fn policy() -> HealthPolicy {
        HealthPolicy::new(8080, "/health")
    }

    fn running_engine() -> FakeEngine {
        FakeEngine::new(vec![record("new1", "/web-0123456789abcd", "Up 1 second", 10)])
    }

    #[tokio::test(start_paused = true)]
    async fn success_on_third_attempt_sleeps_twice() {
        let engine = running_engine();
        let checker = HealthChecker::new("docker1", ScriptedProbe::healthy_after(2));
        let mut diag = Diagnostics::default();

        let start = Instant::now();
        let attempt = checker
            .wait_until_healthy(&engine, &ContainerId::new("new1"), &policy(), &mut diag)
            .await
            .unwrap();

        assert_eq!(attempt, 3);
        assert_eq!(start.elapsed(), Duration::from_secs(10));
        assert_eq!(diag.count(WarningKind::ProbeFailure), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn immediate_success_does_not_sleep() {
        let engine = running_engine();
        let checker = HealthChecker::new("docker1", ScriptedProbe::healthy_after(0));
        let mut diag = Diagnostics::default();

        let start = Instant::now();
        let attempt = checker
            .wait_until_healthy(&engine, &ContainerId::new("new1"), &policy(), &mut diag)
            .await
            .unwrap();

        assert_eq!(attempt, 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert!(!diag.has_warnings());
    }

    #[tokio::test(start_paused = true)]
    async fn exhaustion_makes_exactly_max_attempts() {
        let engine = running_engine();
        let checker = HealthChecker::new("docker1", ScriptedProbe::never_healthy());
        let mut diag = Diagnostics::default();

        let start = Instant::now();
        let err = checker
            .wait_until_healthy(&engine, &ContainerId::new("new1"), &policy(), &mut diag)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DeployError::HealthValidationFailed { port: 8080, attempts: 12, .. }
        ));
        assert_eq!(checker.probe.calls().len(), 12);
        assert_eq!(start.elapsed(), Duration::from_secs(55));
    }

    #[tokio::test(start_paused = true)]
    async fn container_not_running_is_not_healthy_and_skips_http() {
        let engine = FakeEngine::new(vec![record("new1", "/web", "Exited (1) 1 second ago", 10)]);
        let checker = HealthChecker::new("docker1", ScriptedProbe::healthy_after(0));
        let mut diag = Diagnostics::default();

        let healthy = checker
            .probe(&engine, &ContainerId::new("new1"), 8080, "/health", &mut diag)
            .await
            .unwrap();

        assert!(!healthy);
        assert!(checker.probe.calls().is_empty());
        assert_eq!(diag.count(WarningKind::ProbeFailure), 1);
    }

    #[tokio::test]
    async fn engine_failure_propagates() {
        let engine = running_engine();
        engine.fail_on(Op::List, |_| Some(ContainerError::Runtime("daemon gone".into())));
        let checker = HealthChecker::new("docker1", ScriptedProbe::healthy_after(0));
        let mut diag = Diagnostics::default();

        let err = checker
            .probe(&engine, &ContainerId::new("new1"), 8080, "/health", &mut diag)
            .await
            .unwrap_err();
        assert!(matches!(err, DeployError::Probe { .. }));
    }

    #[tokio::test]
    async fn probe_targets_host_port_and_endpoint() {
        let engine = running_engine();
        let checker = HealthChecker::new("docker1", ScriptedProbe::healthy_after(0));
        let mut diag = Diagnostics::default();

        checker
            .probe(&engine, &ContainerId::new("new1"), 9000, "/status", &mut diag)
            .await
            .unwrap();
        assert_eq!(
            checker.probe.calls(),
            [("docker1".to_string(), 9000, "/status".to_string())]
        );
    }

    async fn serve_once(status_line: &'static str) -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            let response = format!("{status_line}\r\ncontent-length: 0\r\n\r\n");
            socket.write_all(response.as_bytes()).await.unwrap();
        });
        port
    }

    #[tokio::test]
    async fn http_probe_accepts_2xx() {
        let port = serve_once("HTTP/1.1 204 No Content").await;
        let outcome = HttpProbe::default().check("127.0.0.1", port, "/health").await;
        assert_eq!(outcome, ProbeOutcome::Healthy);
    }

    #[tokio::test]
    async fn http_probe_reports_other_statuses() {
        let port = serve_once("HTTP/1.1 503 Service Unavailable").await;
        let outcome = HttpProbe::default().check("127.0.0.1", port, "/health").await;
        assert_eq!(outcome, ProbeOutcome::Status(503));
    }

    #[tokio::test]
    async fn http_probe_reports_refused_connections() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let outcome = HttpProbe::default().check("127.0.0.1", port, "/health").await;
        assert!(matches!(outcome, ProbeOutcome::Unreachable(_)));
    }
}
