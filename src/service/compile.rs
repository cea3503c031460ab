// ABOUTME: Compiles a service description into engine create and host-config payloads.
// ABOUTME: Per-host values (hostname, env placeholders) are evaluated against the target host.

use super::payload::{
    CreatePayload, EmptyObject, HostConfigPayload, HostPortPayload, RestartPolicyPayload,
};
use super::{ConfigError, EnvValue, RestartPolicy, ServiceSpec};
use std::collections::BTreeMap;

pub const HOSTNAME_PLACEHOLDER: &str = "%ENGINE_HOSTNAME%";
pub const HOST_IP_PLACEHOLDER: &str = "%ENGINE_HOST_IP%";

const CONSOLE_SHELL: &str = "/bin/bash";

impl ServiceSpec {
    /// Create payload for `hostname`, with the host config embedded.
    pub async fn compile(
        &self,
        hostname: &str,
        restart_policy: Option<&RestartPolicy>,
    ) -> Result<CreatePayload, ConfigError> {
        let exposed_ports = (!self.port_bindings.is_empty()).then(|| {
            self.port_bindings
                .iter()
                .map(|b| (b.port_key(), EmptyObject {}))
                .collect()
        });

        let volumes = (!self.volumes.is_empty()).then(|| {
            self.volumes
                .iter()
                .map(|v| (v.container_path.clone(), EmptyObject {}))
                .collect()
        });

        Ok(CreatePayload {
            image: self.image.to_string(),
            hostname: self
                .container_hostname
                .as_ref()
                .map(|h| h.evaluate(hostname)),
            cmd: self.command.clone().filter(|c| !c.is_empty()),
            memory: nonzero(self.memory),
            cpu_shares: nonzero(self.cpu_shares),
            labels: (!self.labels.is_empty()).then(|| self.labels.clone()),
            exposed_ports,
            env: self.render_env(hostname).await?,
            volumes,
            attach_stdin: None,
            tty: None,
            open_stdin: None,
            host_config: Some(self.compile_host_config(restart_policy)),
        })
    }

    /// Host config for the create payload.
    ///
    /// Bindings that share a container port and protocol are all published under one
    /// `PortBindings` key rather than the last one winning.
    pub fn compile_host_config(&self, restart_policy: Option<&RestartPolicy>) -> HostConfigPayload {
        let mut port_bindings: BTreeMap<String, Vec<HostPortPayload>> = BTreeMap::new();
        for binding in &self.port_bindings {
            port_bindings
                .entry(binding.port_key())
                .or_default()
                .push(HostPortPayload {
                    host_port: binding.host_port.to_string(),
                    host_ip: binding.host_ip.clone(),
                });
        }

        HostConfigPayload {
            cap_add: self.cap_adds.clone(),
            cap_drop: self.cap_drops.clone(),
            binds: self.volumes.iter().map(|v| v.bind()).collect(),
            port_bindings,
            network_mode: self.network_mode.clone(),
            pid_mode: self.pid_mode.clone(),
            dns: self.dns.clone(),
            extra_hosts: self.extra_hosts.clone(),
            memory: nonzero(self.memory),
            cpu_shares: nonzero(self.cpu_shares),
            ipc_mode: self.ipc_mode.clone(),
            security_opt: self.security_opt.clone(),
            restart_policy: restart_policy.map(|policy| RestartPolicyPayload {
                name: policy.name.to_string(),
                maximum_retry_count: policy.effective_max_retry_count(),
            }),
        }
    }

    /// Interactive shell variant: same container settings, no restart policy.
    pub async fn compile_console(&self, hostname: &str) -> Result<CreatePayload, ConfigError> {
        Ok(CreatePayload {
            cmd: Some(vec![CONSOLE_SHELL.to_string()]),
            attach_stdin: Some(true),
            tty: Some(true),
            open_stdin: Some(true),
            ..self.compile(hostname, None).await?
        })
    }

    async fn render_env(&self, hostname: &str) -> Result<Option<Vec<String>>, ConfigError> {
        if self.env.is_empty() {
            return Ok(None);
        }

        let mut rendered = Vec::with_capacity(self.env.len());
        for (key, value) in &self.env {
            let value = match value {
                EnvValue::Computed(f) => f(hostname),
                EnvValue::Literal(s) => self.interpolate(s, hostname).await?,
            };
            rendered.push(format!("{key}={value}"));
        }
        Ok(Some(rendered))
    }

    /// Substitutes host placeholders; the address is only looked up when referenced.
    async fn interpolate(&self, value: &str, hostname: &str) -> Result<String, ConfigError> {
        let value = if value.contains(HOST_IP_PLACEHOLDER) {
            let ip = self.resolver.resolve(hostname).await?;
            value.replace(HOST_IP_PLACEHOLDER, &ip.to_string())
        } else {
            value.to_string()
        };
        Ok(value.replace(HOSTNAME_PLACEHOLDER, hostname))
    }
}

fn nonzero(value: u64) -> Option<u64> {
    (value != 0).then_some(value)
}
