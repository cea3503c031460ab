// ABOUTME: Declarative description of the container a service runs.
// ABOUTME: Built once per invocation and compiled into engine payloads per target host.

mod compile;
mod error;
mod payload;
mod resolve;
mod values;

pub use compile::{HOST_IP_PLACEHOLDER, HOSTNAME_PLACEHOLDER};
pub use error::ConfigError;
pub use payload::{
    CreatePayload, EmptyObject, HostConfigPayload, HostPortPayload, RestartPolicyPayload,
};
pub use resolve::{HostResolver, SystemResolver};
pub use values::{
    DEFAULT_MAX_RETRY_COUNT, PortBinding, Protocol, RestartPolicy, RestartPolicyName, Volume,
};

use crate::types::{ImageRef, ServiceName};
use resolve::CachedResolver;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A value computed from the target hostname.
pub type HostFn = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Environment variable value.
#[derive(Clone)]
pub enum EnvValue {
    /// Placeholders are substituted at compile time.
    Literal(String),
    Computed(HostFn),
}

impl EnvValue {
    pub fn computed(f: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        EnvValue::Computed(Arc::new(f))
    }
}

impl fmt::Debug for EnvValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvValue::Literal(s) => f.debug_tuple("Literal").field(s).finish(),
            EnvValue::Computed(_) => f.write_str("Computed(<fn>)"),
        }
    }
}

impl From<&str> for EnvValue {
    fn from(value: &str) -> Self {
        EnvValue::Literal(value.to_string())
    }
}

impl From<String> for EnvValue {
    fn from(value: String) -> Self {
        EnvValue::Literal(value)
    }
}

/// Container hostname, fixed or derived from the target host.
#[derive(Clone)]
pub enum HostValue {
    Literal(String),
    Computed(HostFn),
}

impl HostValue {
    pub fn computed(f: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        HostValue::Computed(Arc::new(f))
    }

    /// Use the target hostname itself.
    pub fn target_host() -> Self {
        Self::computed(|hostname| hostname.to_string())
    }

    pub fn evaluate(&self, hostname: &str) -> String {
        match self {
            HostValue::Literal(s) => s.clone(),
            HostValue::Computed(f) => f(hostname),
        }
    }
}

impl fmt::Debug for HostValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostValue::Literal(s) => f.debug_tuple("Literal").field(s).finish(),
            HostValue::Computed(_) => f.write_str("Computed(<fn>)"),
        }
    }
}

pub const DEFAULT_NETWORK_MODE: &str = "bridge";

/// Desired state of a service's container. Read-only once built.
#[derive(Debug)]
pub struct ServiceSpec {
    name: ServiceName,
    image: ImageRef,
    command: Option<Vec<String>>,
    env: Vec<(String, EnvValue)>,
    labels: BTreeMap<String, String>,
    volumes: Vec<Volume>,
    port_bindings: Vec<PortBinding>,
    cap_adds: Vec<String>,
    cap_drops: Vec<String>,
    network_mode: String,
    pid_mode: Option<String>,
    ipc_mode: Option<String>,
    dns: Option<Vec<String>>,
    extra_hosts: Option<Vec<String>>,
    memory: u64,
    cpu_shares: u64,
    security_opt: Vec<String>,
    container_hostname: Option<HostValue>,
    resolver: CachedResolver,
}

impl ServiceSpec {
    pub fn builder(name: ServiceName, image: ImageRef) -> ServiceSpecBuilder {
        ServiceSpecBuilder::new(name, image)
    }

    pub fn name(&self) -> &ServiceName {
        &self.name
    }

    pub fn image(&self) -> &ImageRef {
        &self.image
    }

    pub fn port_bindings(&self) -> &[PortBinding] {
        &self.port_bindings
    }

    pub fn volumes(&self) -> &[Volume] {
        &self.volumes
    }

    pub fn network_mode(&self) -> &str {
        &self.network_mode
    }

    pub fn memory(&self) -> u64 {
        self.memory
    }

    pub fn cpu_shares(&self) -> u64 {
        self.cpu_shares
    }

    pub fn cap_adds(&self) -> &[String] {
        &self.cap_adds
    }

    pub fn cap_drops(&self) -> &[String] {
        &self.cap_drops
    }
}

/// Collects service settings; range checks run in [`ServiceSpecBuilder::build`].
pub struct ServiceSpecBuilder {
    name: ServiceName,
    image: ImageRef,
    command: Option<Vec<String>>,
    env: Vec<(String, EnvValue)>,
    labels: BTreeMap<String, String>,
    volumes: Vec<Volume>,
    port_bindings: Vec<PortBinding>,
    cap_adds: Vec<String>,
    cap_drops: Vec<String>,
    network_mode: String,
    pid_mode: Option<String>,
    ipc_mode: Option<String>,
    dns: Option<Vec<String>>,
    extra_hosts: Option<Vec<String>>,
    memory: i128,
    cpu_shares: i128,
    security_opt: Vec<String>,
    container_hostname: Option<HostValue>,
    resolver: Arc<dyn HostResolver>,
}

impl ServiceSpecBuilder {
    fn new(name: ServiceName, image: ImageRef) -> Self {
        Self {
            name,
            image,
            command: None,
            env: Vec::new(),
            labels: BTreeMap::new(),
            volumes: Vec::new(),
            port_bindings: Vec::new(),
            cap_adds: Vec::new(),
            cap_drops: Vec::new(),
            network_mode: DEFAULT_NETWORK_MODE.to_string(),
            pid_mode: None,
            ipc_mode: None,
            dns: None,
            extra_hosts: None,
            memory: 0,
            cpu_shares: 0,
            security_opt: Vec::new(),
            container_hostname: None,
            resolver: Arc::new(SystemResolver),
        }
    }

    pub fn command(mut self, command: Vec<String>) -> Self {
        self.command = Some(command);
        self
    }

    /// Later values for the same key replace earlier ones in place.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<EnvValue>) -> Self {
        let key = key.into();
        let value = value.into();
        match self.env.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.env.push((key, value)),
        }
        self
    }

    pub fn label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    pub fn volume(mut self, volume: Volume) -> Self {
        self.volumes.push(volume);
        self
    }

    pub fn port_binding(mut self, binding: PortBinding) -> Self {
        self.port_bindings.push(binding);
        self
    }

    pub fn cap_adds(mut self, caps: Vec<String>) -> Self {
        self.cap_adds = caps;
        self
    }

    pub fn cap_drops(mut self, caps: Vec<String>) -> Self {
        self.cap_drops = caps;
        self
    }

    pub fn network_mode(mut self, mode: impl Into<String>) -> Self {
        self.network_mode = mode.into();
        self
    }

    pub fn pid_mode(mut self, mode: impl Into<String>) -> Self {
        self.pid_mode = Some(mode.into());
        self
    }

    pub fn ipc_mode(mut self, mode: impl Into<String>) -> Self {
        self.ipc_mode = Some(mode.into());
        self
    }

    pub fn dns(mut self, servers: Vec<String>) -> Self {
        self.dns = Some(servers);
        self
    }

    pub fn extra_hosts(mut self, hosts: Vec<String>) -> Self {
        self.extra_hosts = Some(hosts);
        self
    }

    /// Memory limit in bytes; must fit in an unsigned 64-bit integer.
    pub fn memory(mut self, bytes: i128) -> Self {
        self.memory = bytes;
        self
    }

    /// CPU share weight; must fit in an unsigned 64-bit integer.
    pub fn cpu_shares(mut self, shares: i128) -> Self {
        self.cpu_shares = shares;
        self
    }

    pub fn security_opt(mut self, opt: impl Into<String>) -> Self {
        self.security_opt.push(opt.into());
        self
    }

    pub fn container_hostname(mut self, hostname: HostValue) -> Self {
        self.container_hostname = Some(hostname);
        self
    }

    pub fn resolver(mut self, resolver: Arc<dyn HostResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn build(self) -> Result<ServiceSpec, ConfigError> {
        let memory = unsigned_64("memory", self.memory)?;
        let cpu_shares = unsigned_64("cpu_shares", self.cpu_shares)?;

        Ok(ServiceSpec {
            name: self.name,
            image: self.image,
            command: self.command,
            env: self.env,
            labels: self.labels,
            volumes: self.volumes,
            port_bindings: self.port_bindings,
            cap_adds: self.cap_adds,
            cap_drops: self.cap_drops,
            network_mode: self.network_mode,
            pid_mode: self.pid_mode,
            ipc_mode: self.ipc_mode,
            dns: self.dns,
            extra_hosts: self.extra_hosts,
            memory,
            cpu_shares,
            security_opt: self.security_opt,
            container_hostname: self.container_hostname,
            resolver: CachedResolver::new(self.resolver),
        })
    }
}

fn unsigned_64(field: &'static str, value: i128) -> Result<u64, ConfigError> {
    u64::try_from(value).map_err(|_| ConfigError::OutOfRange {
        field,
        value: value.to_string(),
    })
}

/// Reads a capability-style list from raw YAML, rejecting scalars.
pub fn string_sequence(
    field: &'static str,
    value: &serde_yaml::Value,
) -> Result<Vec<String>, ConfigError> {
    let items = match value {
        serde_yaml::Value::Null => return Ok(Vec::new()),
        serde_yaml::Value::Sequence(items) => items,
        other => {
            return Err(ConfigError::NotASequence {
                field,
                found: yaml_summary(other),
            });
        }
    };

    items
        .iter()
        .map(|item| match item {
            serde_yaml::Value::String(s) => Ok(s.clone()),
            other => Err(ConfigError::NotAString {
                field,
                found: yaml_summary(other),
            }),
        })
        .collect()
}

/// Reads an integer from raw YAML, widening so out-of-range values can be reported.
pub fn yaml_integer(field: &'static str, value: &serde_yaml::Value) -> Result<i128, ConfigError> {
    match value {
        serde_yaml::Value::Null => Ok(0),
        serde_yaml::Value::Number(n) => {
            if let Some(v) = n.as_u64() {
                Ok(i128::from(v))
            } else if let Some(v) = n.as_i64() {
                Ok(i128::from(v))
            } else {
                // Integers beyond 64 bits parse as floats.
                match n.as_f64() {
                    Some(f) if f.fract() == 0.0 => Err(ConfigError::OutOfRange {
                        field,
                        value: n.to_string(),
                    }),
                    _ => Err(ConfigError::NotAnInteger {
                        field,
                        found: n.to_string(),
                    }),
                }
            }
        }
        other => Err(ConfigError::NotAnInteger {
            field,
            found: yaml_summary(other),
        }),
    }
}

fn yaml_summary(value: &serde_yaml::Value) -> String {
    serde_yaml::to_string(value)
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|_| format!("{value:?}"))
}
