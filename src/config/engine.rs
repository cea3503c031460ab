// ABOUTME: How cohort reaches each host's engine: TLS files, optional SSH tunnel, CLI path.
// ABOUTME: Shared by every host in the config file.

use super::deserialize::deserialize_log_level;
use crate::runtime::{DEFAULT_CLI_PATH, TlsSettings};
use crate::tunnel::{DEFAULT_REMOTE_SOCKET, DEFAULT_SSH_PORT, TunnelConfig};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub tls: TlsConfig,

    /// CLI-backed operations run through an SSH tunnel when set.
    #[serde(default)]
    pub tunnel: Option<TunnelEntry>,

    #[serde(default = "default_cli_path")]
    pub cli_path: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tls: TlsConfig::default(),
            tunnel: None,
            cli_path: default_cli_path(),
        }
    }
}

fn default_cli_path() -> String {
    DEFAULT_CLI_PATH.to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TlsConfig {
    #[serde(default)]
    pub verify: bool,
    #[serde(default)]
    pub ca_cert: Option<PathBuf>,
    #[serde(default)]
    pub cert: Option<PathBuf>,
    #[serde(default)]
    pub key: Option<PathBuf>,
}

impl TlsConfig {
    pub fn settings(&self) -> TlsSettings {
        TlsSettings {
            verify: self.verify,
            ca_cert: self.ca_cert.clone(),
            cert: self.cert.clone(),
            key: self.key.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TunnelEntry {
    #[serde(default)]
    pub user: Option<String>,

    #[serde(default = "default_ssh_port")]
    pub port: u16,

    #[serde(default = "default_log_level", deserialize_with = "deserialize_log_level")]
    pub log_level: tracing::Level,

    #[serde(default, with = "humantime_serde")]
    pub heartbeat: Option<Duration>,

    #[serde(default = "default_remote_socket")]
    pub remote_socket: String,

    #[serde(default)]
    pub key_path: Option<PathBuf>,

    #[serde(default)]
    pub trust_first_connection: bool,

    #[serde(default)]
    pub known_hosts_path: Option<PathBuf>,
}

fn default_ssh_port() -> u16 {
    DEFAULT_SSH_PORT
}

fn default_log_level() -> tracing::Level {
    tracing::Level::DEBUG
}

fn default_remote_socket() -> String {
    DEFAULT_REMOTE_SOCKET.to_string()
}

impl From<&TunnelEntry> for TunnelConfig {
    fn from(entry: &TunnelEntry) -> Self {
        TunnelConfig {
            user: entry.user.clone(),
            port: entry.port,
            log_level: entry.log_level,
            heartbeat: entry.heartbeat,
            remote_socket: entry.remote_socket.clone(),
            key_path: entry.key_path.clone(),
            trust_first_connection: entry.trust_first_connection,
            known_hosts_path: entry.known_hosts_path.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tunnel_entry_defaults() {
        let entry: TunnelEntry = serde_yaml::from_str("user: deploy").unwrap();
        let tunnel = TunnelConfig::from(&entry);
        assert_eq!(tunnel.user.as_deref(), Some("deploy"));
        assert_eq!(tunnel.port, 22);
        assert_eq!(tunnel.remote_socket, "/var/run/docker.sock");
        assert_eq!(tunnel.log_level, tracing::Level::DEBUG);
        assert_eq!(tunnel.heartbeat, None);
    }

    #[test]
    fn tunnel_entry_parses_level_and_heartbeat() {
        let entry: TunnelEntry =
            serde_yaml::from_str("log_level: warn\nheartbeat: 30s\nport: 2222").unwrap();
        assert_eq!(entry.log_level, tracing::Level::WARN);
        assert_eq!(entry.heartbeat, Some(Duration::from_secs(30)));
        assert_eq!(entry.port, 2222);
    }

    #[test]
    fn unknown_log_level_is_rejected() {
        assert!(serde_yaml::from_str::<TunnelEntry>("log_level: loud").is_err());
    }

    #[test]
    fn engine_defaults_to_plain_docker_cli() {
        let engine: EngineConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(engine.cli_path, "docker");
        assert!(!engine.tls.settings().enabled());
        assert!(engine.tunnel.is_none());
    }
}
