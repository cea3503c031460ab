// ABOUTME: Integration tests for compiling service descriptions into engine payloads.
// ABOUTME: Placeholder interpolation runs against a stub resolver so no DNS is involved.

use async_trait::async_trait;
use cohort::service::*;
use cohort::types::{ImageRef, ServiceName};
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

struct StubResolver {
    lookups: AtomicUsize,
}

#[async_trait]
impl HostResolver for StubResolver {
    async fn resolve(&self, hostname: &str) -> Result<IpAddr, ConfigError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        match hostname {
            "h1" => Ok(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 5))),
            other => Err(ConfigError::Resolve {
                hostname: other.to_string(),
                reason: "unknown host".to_string(),
            }),
        }
    }
}

fn builder() -> ServiceSpecBuilder {
    ServiceSpec::builder(
        ServiceName::new("web").unwrap(),
        ImageRef::parse("registry:5000/web:v3").unwrap(),
    )
}

#[tokio::test]
async fn placeholders_are_interpolated_per_host() {
    let resolver = Arc::new(StubResolver {
        lookups: AtomicUsize::new(0),
    });
    let spec = builder()
        .env("ADDR", "%ENGINE_HOST_IP%:%ENGINE_HOSTNAME%")
        .env("PLAIN", "value")
        .resolver(resolver.clone())
        .build()
        .unwrap();

    let first = spec.compile("h1", None).await.unwrap();
    let second = spec.compile("h1", None).await.unwrap();

    assert_eq!(
        first.env,
        Some(vec!["ADDR=10.0.0.5:h1".to_string(), "PLAIN=value".to_string()])
    );
    assert_eq!(first.env, second.env);
    assert_eq!(resolver.lookups.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn unresolvable_host_fails_compilation() {
    let spec = builder()
        .env("ADDR", "%ENGINE_HOST_IP%")
        .resolver(Arc::new(StubResolver {
            lookups: AtomicUsize::new(0),
        }))
        .build()
        .unwrap();

    assert!(matches!(
        spec.compile("nowhere", None).await,
        Err(ConfigError::Resolve { .. })
    ));
}

#[tokio::test]
async fn hostname_only_placeholder_skips_lookup() {
    let resolver = Arc::new(StubResolver {
        lookups: AtomicUsize::new(0),
    });
    let spec = builder()
        .env("HOST", "%ENGINE_HOSTNAME%")
        .resolver(resolver.clone())
        .build()
        .unwrap();

    let payload = spec.compile("docker7", None).await.unwrap();
    assert_eq!(payload.env, Some(vec!["HOST=docker7".to_string()]));
    assert_eq!(resolver.lookups.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn computed_values_see_the_target_host() {
    let spec = builder()
        .env("UPPER", EnvValue::computed(|h| h.to_uppercase()))
        .container_hostname(HostValue::target_host())
        .build()
        .unwrap();

    let payload = spec.compile("docker1", None).await.unwrap();
    assert_eq!(payload.env, Some(vec!["UPPER=DOCKER1".to_string()]));
    assert_eq!(payload.hostname.as_deref(), Some("docker1"));
}

#[tokio::test]
async fn bindings_on_one_container_port_accumulate() {
    let spec = builder()
        .port_binding(PortBinding::new(8080, 80))
        .port_binding(PortBinding {
            host_ip: Some("127.0.0.1".to_string()),
            ..PortBinding::new(9090, 80)
        })
        .build()
        .unwrap();

    let payload = spec.compile("docker1", None).await.unwrap();
    let host_config = payload.host_config.unwrap();
    let bindings = &host_config.port_bindings["80/tcp"];
    assert_eq!(bindings.len(), 2);
    assert_eq!(bindings[0].host_port, "8080");
    assert_eq!(bindings[1].host_ip.as_deref(), Some("127.0.0.1"));
    assert_eq!(payload.exposed_ports.unwrap().len(), 1);
}

#[tokio::test]
async fn volumes_become_binds_and_container_paths() {
    let spec = builder()
        .volume(Volume::new("/srv/data", "/data"))
        .build()
        .unwrap();

    let payload = spec.compile("docker1", None).await.unwrap();
    assert!(payload.volumes.unwrap().contains_key("/data"));
    assert_eq!(payload.host_config.unwrap().binds, ["/srv/data:/data"]);
}

#[test]
fn restart_policy_is_normalized_into_host_config() {
    let spec = builder().build().unwrap();
    let policy = RestartPolicy::new("bogus", None);

    let host_config = spec.compile_host_config(Some(&policy));
    let restart = host_config.restart_policy.unwrap();
    assert_eq!(restart.name, "on-failure");
    assert_eq!(restart.maximum_retry_count, Some(DEFAULT_MAX_RETRY_COUNT));
}

#[tokio::test]
async fn console_payload_is_interactive_without_restart_policy() {
    let spec = builder()
        .command(vec!["bin/server".to_string()])
        .build()
        .unwrap();

    let payload = spec.compile_console("docker1").await.unwrap();
    assert_eq!(payload.cmd, Some(vec!["/bin/bash".to_string()]));
    assert_eq!(payload.attach_stdin, Some(true));
    assert_eq!(payload.open_stdin, Some(true));
    assert!(payload.host_config.unwrap().restart_policy.is_none());
}

#[test]
fn memory_bounds_are_the_unsigned_64_bit_range() {
    assert!(builder().memory(i128::from(u64::MAX)).build().is_ok());
    assert!(matches!(
        builder().memory(i128::from(u64::MAX) + 1).build(),
        Err(ConfigError::OutOfRange { field: "memory", .. })
    ));
    assert!(matches!(
        builder().memory(-1).build(),
        Err(ConfigError::OutOfRange { field: "memory", .. })
    ));
}

#[tokio::test]
async fn zero_limits_are_left_out() {
    let payload = builder().build().unwrap().compile("docker1", None).await.unwrap();
    assert_eq!(payload.memory, None);
    assert_eq!(payload.cpu_shares, None);
    assert_eq!(payload.image, "registry:5000/web:v3");
}

#[tokio::test]
async fn default_resolver_looks_up_on_the_runtime() {
    let spec = builder().env("ADDR", "%ENGINE_HOST_IP%").build().unwrap();

    let payload = spec.compile("127.0.0.1", None).await.unwrap();
    assert_eq!(payload.env, Some(vec!["ADDR=127.0.0.1".to_string()]));
}
