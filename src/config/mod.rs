// ABOUTME: Configuration types and parsing for cohort.yml.
// ABOUTME: Turns the file into a service description, per-host connections, and deploy settings.

mod bindings;
mod deserialize;
mod engine;
mod env_value;
mod healthcheck;
mod init;
mod restart_policy;

pub use bindings::{PortBindingEntry, parse_bind};
pub use engine::{EngineConfig, TlsConfig, TunnelEntry};
pub use env_value::EnvSource;
pub use healthcheck::HealthConfig;
pub use init::init_config;
pub use restart_policy::RestartPolicyEntry;

use crate::deploy::{DEFAULT_STOP_TIMEOUT, DeploySettings, HealthPolicy, HttpProbe};
use crate::error::{Error, Result};
use crate::runtime::ConnectionParams;
use crate::service::{self, HostValue, RestartPolicy, ServiceSpec};
use crate::tunnel::TunnelConfig;
use crate::types::{ImageRef, ServiceName};
use deserialize::{deserialize_hosts, deserialize_image_ref, deserialize_service_name};
use nonempty::NonEmpty;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

pub const CONFIG_FILENAME: &str = "cohort.yml";
pub const CONFIG_FILENAME_ALT: &str = "cohort.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".cohort/config.yml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(deserialize_with = "deserialize_service_name")]
    pub name: ServiceName,

    #[serde(deserialize_with = "deserialize_image_ref")]
    pub image: ImageRef,

    /// Replaces the tag given in `image`.
    #[serde(default)]
    pub tag: Option<String>,

    /// Engine hosts, deployed in order.
    #[serde(deserialize_with = "deserialize_hosts")]
    pub hosts: NonEmpty<String>,

    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub port_bindings: Vec<PortBindingEntry>,

    /// `host_path:container_path`
    #[serde(default)]
    pub binds: Vec<String>,

    #[serde(default)]
    pub env_vars: BTreeMap<String, EnvSource>,

    #[serde(default)]
    pub labels: BTreeMap<String, String>,

    #[serde(default)]
    pub container_hostname: Option<ContainerHostname>,

    // Kept as raw YAML; validated when the service description is built.
    #[serde(default)]
    pub cap_adds: serde_yaml::Value,
    #[serde(default)]
    pub cap_drops: serde_yaml::Value,
    #[serde(default)]
    pub memory: serde_yaml::Value,
    #[serde(default)]
    pub cpu_shares: serde_yaml::Value,

    #[serde(default)]
    pub dns: Option<Vec<String>>,
    #[serde(default)]
    pub extra_hosts: Option<Vec<String>>,
    #[serde(default)]
    pub network_mode: Option<String>,
    #[serde(default)]
    pub pid_mode: Option<String>,
    #[serde(default)]
    pub ipc_mode: Option<String>,
    #[serde(default)]
    pub command: Option<Vec<String>>,
    #[serde(default)]
    pub security_opt: Vec<String>,

    #[serde(default)]
    pub restart_policy: Option<RestartPolicyEntry>,

    #[serde(default)]
    pub health: HealthConfig,

    /// Pause after each host passes validation.
    #[serde(default, with = "humantime_serde")]
    pub rolling_deploy_wait: Option<Duration>,

    #[serde(default = "default_stop_timeout", with = "humantime_serde")]
    pub stop_timeout: Duration,

    /// Pull the image on each host before deploying.
    #[serde(default = "default_true")]
    pub pull: bool,

    /// Run the retention pass after deploying.
    #[serde(default = "default_true")]
    pub cleanup: bool,
}

/// Hostname given to the container: a literal, or the engine host it runs on.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ContainerHostname {
    Literal(String),
    FromHost { from_host: bool },
}

fn default_stop_timeout() -> Duration {
    DEFAULT_STOP_TIMEOUT
}

fn default_true() -> bool {
    true
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(Error::from)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                tracing::debug!("loading configuration from {}", path.display());
                return Self::load(path);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    /// Image to deploy, with `tag` applied.
    pub fn image_ref(&self) -> ImageRef {
        match &self.tag {
            Some(tag) => self.image.clone().with_tag(tag.clone()),
            None => self.image.clone(),
        }
    }

    /// Resolves environment references and validates the raw fields.
    pub fn service_spec(&self) -> Result<ServiceSpec> {
        let mut builder = ServiceSpec::builder(self.name.clone(), self.image_ref());

        for (key, value) in &self.env_vars {
            builder = builder.env(key.clone(), value.resolve()?);
        }
        for (key, value) in &self.labels {
            builder = builder.label(key.clone(), value.clone());
        }
        for entry in &self.port_bindings {
            builder = builder.port_binding(entry.to_binding()?);
        }
        for bind in &self.binds {
            builder = builder.volume(parse_bind(bind)?);
        }

        builder = builder
            .cap_adds(service::string_sequence("cap_adds", &self.cap_adds)?)
            .cap_drops(service::string_sequence("cap_drops", &self.cap_drops)?)
            .memory(service::yaml_integer("memory", &self.memory)?)
            .cpu_shares(service::yaml_integer("cpu_shares", &self.cpu_shares)?);

        if let Some(ref mode) = self.network_mode {
            builder = builder.network_mode(mode.clone());
        }
        if let Some(ref mode) = self.pid_mode {
            builder = builder.pid_mode(mode.clone());
        }
        if let Some(ref mode) = self.ipc_mode {
            builder = builder.ipc_mode(mode.clone());
        }
        if let Some(ref servers) = self.dns {
            builder = builder.dns(servers.clone());
        }
        if let Some(ref hosts) = self.extra_hosts {
            builder = builder.extra_hosts(hosts.clone());
        }
        if let Some(ref command) = self.command {
            builder = builder.command(command.clone());
        }
        for opt in &self.security_opt {
            builder = builder.security_opt(opt.clone());
        }
        match &self.container_hostname {
            Some(ContainerHostname::Literal(name)) => {
                builder = builder.container_hostname(HostValue::Literal(name.clone()));
            }
            Some(ContainerHostname::FromHost { from_host: true }) => {
                builder = builder.container_hostname(HostValue::target_host());
            }
            Some(ContainerHostname::FromHost { from_host: false }) | None => {}
        }

        Ok(builder.build()?)
    }

    /// Connection parameters for one entry of `hosts`.
    pub fn connection_params(&self, host: &str) -> Result<ConnectionParams> {
        let tunnel = self.engine.tunnel.as_ref().map(TunnelConfig::from);
        ConnectionParams::parse(host, self.engine.tls.settings(), tunnel).map_err(Error::InvalidConfig)
    }

    pub fn restart_policy(&self) -> Result<Option<RestartPolicy>> {
        self.restart_policy
            .as_ref()
            .map(RestartPolicyEntry::to_policy)
            .transpose()
    }

    /// Port the health probe targets: configured, else the first binding's host port.
    pub fn health_port(&self) -> Result<Option<u16>> {
        if let Some(port) = self.health.port {
            return Ok(Some(port));
        }
        match self.port_bindings.first() {
            Some(entry) => Ok(Some(entry.to_binding()?.host_port)),
            None => Ok(None),
        }
    }

    pub fn deploy_settings(&self) -> Result<DeploySettings> {
        let health = if self.health.skip {
            None
        } else {
            match self.health_port()? {
                Some(port) => Some(HealthPolicy {
                    port,
                    endpoint: self.health.endpoint.clone(),
                    interval: self.health.interval,
                    max_attempts: self.health.retries,
                }),
                None => {
                    tracing::warn!("no health port and no port bindings; skipping health validation");
                    None
                }
            }
        };

        Ok(DeploySettings {
            stop_timeout: self.stop_timeout,
            restart_policy: self.restart_policy()?,
            health,
            rolling_wait: self.rolling_deploy_wait,
        })
    }

    pub fn probe(&self) -> HttpProbe {
        HttpProbe::new(self.health.timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = "name: web\nimage: nginx:1.25\nhosts: docker1\n";

    #[test]
    fn minimal_config_uses_defaults() {
        let config = Config::from_yaml(MINIMAL).unwrap();
        assert_eq!(config.hosts.len(), 1);
        assert_eq!(config.stop_timeout, Duration::from_secs(30));
        assert!(config.pull && config.cleanup);
        assert_eq!(config.health.retries, 12);
        assert_eq!(config.engine.cli_path, "docker");
    }

    #[test]
    fn tag_overrides_image_tag() {
        let config = Config::from_yaml(&format!("{MINIMAL}tag: v2\n")).unwrap();
        assert_eq!(config.image_ref().to_string(), "nginx:v2");
    }

    #[test]
    fn empty_host_list_is_rejected() {
        assert!(Config::from_yaml("name: web\nimage: nginx\nhosts: []\n").is_err());
    }

    #[test]
    fn health_port_defaults_to_first_binding() {
        let config =
            Config::from_yaml(&format!("{MINIMAL}port_bindings: ['8080:80', '8443:443']\n"))
                .unwrap();
        let settings = config.deploy_settings().unwrap();
        assert_eq!(settings.health.unwrap().port, 8080);
    }

    #[test]
    fn skipped_health_has_no_policy() {
        let config = Config::from_yaml(&format!(
            "{MINIMAL}port_bindings: ['8080:80']\nhealth: {{skip: true}}\n"
        ))
        .unwrap();
        assert!(config.deploy_settings().unwrap().health.is_none());
    }

    #[test]
    fn scalar_capabilities_are_rejected() {
        let config = Config::from_yaml(&format!("{MINIMAL}cap_adds: NET_ADMIN\n")).unwrap();
        assert!(matches!(
            config.service_spec(),
            Err(Error::Service(service::ConfigError::NotASequence { .. }))
        ));
    }

    #[test]
    fn tls_port_default_follows_verify() {
        let config =
            Config::from_yaml(&format!("{MINIMAL}engine: {{tls: {{verify: true}}}}\n")).unwrap();
        assert_eq!(config.connection_params("docker1").unwrap().port, 2376);
        assert_eq!(config.connection_params("docker1:4243").unwrap().port, 4243);
    }
}
