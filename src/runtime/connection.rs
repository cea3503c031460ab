// ABOUTME: Per-host connection parameters shared by the API and CLI adapters.
// ABOUTME: Also composes the engine CLI's host and TLS flags.

use crate::tunnel::TunnelConfig;
use std::fmt;
use std::path::PathBuf;

pub const PLAIN_PORT: u16 = 2375;
pub const TLS_PORT: u16 = 2376;

/// TLS material for the engine's remote API.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TlsSettings {
    /// TLS explicitly requested.
    pub verify: bool,
    pub ca_cert: Option<PathBuf>,
    pub cert: Option<PathBuf>,
    pub key: Option<PathBuf>,
}

impl TlsSettings {
    /// All three of CA certificate, client certificate, and client key are present.
    pub fn has_all_paths(&self) -> bool {
        self.ca_cert.is_some() && self.cert.is_some() && self.key.is_some()
    }

    /// TLS is in effect when requested or when the full set of files is configured.
    pub fn enabled(&self) -> bool {
        self.verify || self.has_all_paths()
    }

    /// Flags for the engine CLI, in the order the CLI documents them.
    pub fn cli_flags(&self) -> Vec<String> {
        let mut flags = Vec::new();
        if self.enabled() {
            flags.push("--tlsverify".to_string());
        }
        let paths = [
            ("tlscacert", &self.ca_cert),
            ("tlscert", &self.cert),
            ("tlskey", &self.key),
        ];
        for (flag, path) in paths {
            if let Some(path) = path {
                flags.push(format!("--{flag}={}", path.display()));
            }
        }
        flags
    }
}

/// How to reach one engine host. Built once per host and reused for every call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionParams {
    pub hostname: String,
    pub port: u16,
    pub tls: TlsSettings,
    pub tunnel: Option<TunnelConfig>,
}

impl ConnectionParams {
    /// Parses `host` or `host:port`. The default port depends on whether TLS was requested.
    pub fn parse(
        address: &str,
        tls: TlsSettings,
        tunnel: Option<TunnelConfig>,
    ) -> Result<Self, String> {
        let address = address.trim();
        let (hostname, port) = match address.rsplit_once(':') {
            Some((host, port)) => {
                let port = port
                    .parse::<u16>()
                    .map_err(|_| format!("invalid engine port in '{address}': {port}"))?;
                (host, port)
            }
            None => (address, if tls.verify { TLS_PORT } else { PLAIN_PORT }),
        };

        if hostname.is_empty() {
            return Err(format!("engine host cannot be empty: '{address}'"));
        }

        Ok(Self {
            hostname: hostname.to_string(),
            port,
            tls,
            tunnel,
        })
    }

    /// Direct API address, e.g. `tcp://docker1.example.com:2375`.
    pub fn tcp_address(&self) -> String {
        format!("tcp://{}:{}", self.hostname, self.port)
    }

    /// `-H` flag for the engine CLI; points at the tunnel socket when one is open.
    pub fn cli_host_flag(&self, tunnel_endpoint: Option<&str>) -> String {
        match tunnel_endpoint {
            Some(endpoint) => format!("-H={endpoint}"),
            None => format!("-H={}", self.tcp_address()),
        }
    }

    /// Short operator-facing description.
    pub fn describe(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.hostname)?;
        if self.tls.enabled() {
            write!(f, " via TLS")?;
        }
        if let Some(ref tunnel) = self.tunnel {
            write!(f, " via SSH")?;
            if let Some(ref user) = tunnel.user {
                write!(f, " user {user}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_tls() -> TlsSettings {
        TlsSettings {
            verify: false,
            ca_cert: Some("/certs/ca.pem".into()),
            cert: Some("/certs/cert.pem".into()),
            key: Some("/certs/key.pem".into()),
        }
    }

    #[test]
    fn default_port_follows_tls_request() {
        let plain = ConnectionParams::parse("docker1", TlsSettings::default(), None).unwrap();
        assert_eq!(plain.port, 2375);

        let tls = TlsSettings {
            verify: true,
            ..Default::default()
        };
        let secure = ConnectionParams::parse("docker1", tls, None).unwrap();
        assert_eq!(secure.port, 2376);
    }

    #[test]
    fn explicit_port_wins() {
        let params = ConnectionParams::parse("docker1:4243", TlsSettings::default(), None).unwrap();
        assert_eq!(params.hostname, "docker1");
        assert_eq!(params.port, 4243);
        assert_eq!(params.tcp_address(), "tcp://docker1:4243");
    }

    #[test]
    fn invalid_port_is_rejected() {
        assert!(ConnectionParams::parse("docker1:http", TlsSettings::default(), None).is_err());
        assert!(ConnectionParams::parse(":2375", TlsSettings::default(), None).is_err());
    }

    #[test]
    fn tlsverify_added_when_all_paths_present() {
        assert_eq!(
            full_tls().cli_flags(),
            [
                "--tlsverify",
                "--tlscacert=/certs/ca.pem",
                "--tlscert=/certs/cert.pem",
                "--tlskey=/certs/key.pem",
            ]
        );
    }

    #[test]
    fn tlsverify_added_when_requested_without_paths() {
        let tls = TlsSettings {
            verify: true,
            ..Default::default()
        };
        assert_eq!(tls.cli_flags(), ["--tlsverify"]);
    }

    #[test]
    fn partial_paths_do_not_imply_verify() {
        let tls = TlsSettings {
            ca_cert: Some("/certs/ca.pem".into()),
            ..Default::default()
        };
        assert_eq!(tls.cli_flags(), ["--tlscacert=/certs/ca.pem"]);
        assert!(TlsSettings::default().cli_flags().is_empty());
    }

    #[test]
    fn describe_mentions_tls_and_tunnel_user() {
        let tunnel = TunnelConfig {
            user: Some("deploy".to_string()),
            ..Default::default()
        };
        let params = ConnectionParams::parse("docker1", full_tls(), Some(tunnel)).unwrap();
        assert_eq!(params.describe(), "docker1 via TLS via SSH user deploy");
    }
}
