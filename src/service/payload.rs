// ABOUTME: Wire-format payloads for container create and host configuration.
// ABOUTME: Field names follow the engine API; empty or zero settings are omitted.

use serde::Serialize;
use std::collections::BTreeMap;

/// Serializes as `{}`; the engine uses empty objects as set members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct EmptyObject {}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreatePayload {
    pub image: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cmd: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_shares: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<BTreeMap<String, String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub exposed_ports: Option<BTreeMap<String, EmptyObject>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub env: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub volumes: Option<BTreeMap<String, EmptyObject>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub attach_stdin: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tty: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_stdin: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_config: Option<HostConfigPayload>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct HostConfigPayload {
    #[serde(rename = "CapAdd")]
    pub cap_add: Vec<String>,

    #[serde(rename = "CapDrop")]
    pub cap_drop: Vec<String>,

    pub binds: Vec<String>,

    pub port_bindings: BTreeMap<String, Vec<HostPortPayload>>,

    pub network_mode: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid_mode: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub dns: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_hosts: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_shares: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipc_mode: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub security_opt: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub restart_policy: Option<RestartPolicyPayload>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostPortPayload {
    #[serde(rename = "HostPort")]
    pub host_port: String,

    #[serde(rename = "HostIp", skip_serializing_if = "Option::is_none")]
    pub host_ip: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RestartPolicyPayload {
    #[serde(rename = "Name")]
    pub name: String,

    #[serde(rename = "MaximumRetryCount", skip_serializing_if = "Option::is_none")]
    pub maximum_retry_count: Option<u32>,
}
