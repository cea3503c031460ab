// ABOUTME: SSH tunnel session: connect, verify the host key, authenticate, forward the engine socket.
// ABOUTME: A session lives for exactly one CLI invocation and is closed afterwards.

use super::TunnelConfig;
use super::error::{Error, Result};
use super::forward::Forwarder;
use russh::Disconnect;
use russh::client::{self, Config, Handle};
use russh::keys::agent::client::AgentClient;
use russh::keys::known_hosts::{
    check_known_hosts, check_known_hosts_path, learn_known_hosts, learn_known_hosts_path,
};
use russh::keys::{PrivateKeyWithHashAlg, load_secret_key, ssh_key};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::UnixStream;
use tracing::Level;

/// Emits a tunnel lifecycle event at the configured level.
macro_rules! lifecycle {
    ($level:expr, $($arg:tt)+) => {
        match $level {
            Level::ERROR => tracing::error!($($arg)+),
            Level::WARN => tracing::warn!($($arg)+),
            Level::INFO => tracing::info!($($arg)+),
            Level::DEBUG => tracing::debug!($($arg)+),
            Level::TRACE => tracing::trace!($($arg)+),
        }
    };
}

/// Host key policy for one connection.
pub(crate) struct TunnelHandler {
    host: String,
    port: u16,
    trust_first_connection: bool,
    known_hosts_path: Option<PathBuf>,
}

impl client::Handler for TunnelHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &ssh_key::PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        let known = match &self.known_hosts_path {
            Some(path) => check_known_hosts_path(&self.host, self.port, server_public_key, path),
            None => check_known_hosts(&self.host, self.port, server_public_key),
        };

        match known {
            Ok(true) => Ok(true),
            Err(russh::keys::Error::KeyChanged { .. }) => {
                tracing::error!(
                    "host key for {}:{} does not match known_hosts",
                    self.host,
                    self.port
                );
                Ok(false)
            }
            Ok(false) | Err(_) if self.trust_first_connection => {
                tracing::warn!(
                    "trusting unknown host key for {}:{} on first connection",
                    self.host,
                    self.port
                );
                let learned = match &self.known_hosts_path {
                    Some(path) => {
                        learn_known_hosts_path(&self.host, self.port, server_public_key, path)
                    }
                    None => learn_known_hosts(&self.host, self.port, server_public_key),
                };
                if let Err(e) = learned {
                    tracing::warn!("could not record host key in known_hosts: {e}");
                }
                Ok(true)
            }
            Ok(false) | Err(_) => Ok(false),
        }
    }
}

enum Credentials {
    Agent(AgentClient<UnixStream>),
    Key(Arc<ssh_key::PrivateKey>),
}

/// An open tunnel: SSH connection plus a local socket forwarding to the engine.
pub struct TunnelSession {
    host: String,
    level: Level,
    handle: Arc<Handle<TunnelHandler>>,
    forwarder: Forwarder,
    endpoint: String,
}

impl std::fmt::Debug for TunnelSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TunnelSession")
            .field("host", &self.host)
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl TunnelSession {
    /// Connects to `hostname` and forwards a fresh local socket to the remote engine socket.
    pub async fn open(config: &TunnelConfig, hostname: &str) -> Result<Self> {
        let user = config.effective_user();
        lifecycle!(
            config.log_level,
            "opening tunnel to {user}@{hostname}:{} for {}",
            config.port,
            config.remote_socket
        );

        let credentials = credentials(config).await?;

        let ssh_config = Config {
            keepalive_interval: config.heartbeat,
            ..Default::default()
        };
        let handler = TunnelHandler {
            host: hostname.to_string(),
            port: config.port,
            trust_first_connection: config.trust_first_connection,
            known_hosts_path: config.known_hosts_path.clone(),
        };

        let mut handle = client::connect(Arc::new(ssh_config), (hostname, config.port), handler)
            .await
            .map_err(|e| match e {
                russh::Error::UnknownKey => Error::HostKeyRejected(hostname.to_string()),
                other => Error::Connection {
                    host: hostname.to_string(),
                    port: config.port,
                    reason: other.to_string(),
                },
            })?;

        if !authenticate(&mut handle, &user, credentials).await? {
            return Err(Error::AuthenticationFailed { user });
        }

        let handle = Arc::new(handle);
        let forwarder = Forwarder::start(Arc::clone(&handle), &config.remote_socket)?;
        let endpoint = format!("unix://{}", forwarder.local_path().display());
        lifecycle!(config.log_level, "tunnel to {hostname} listening at {endpoint}");

        Ok(Self {
            host: hostname.to_string(),
            level: config.log_level,
            handle,
            forwarder,
            endpoint,
        })
    }

    /// `unix://` endpoint the engine CLI should target.
    pub fn local_endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Stops forwarding and disconnects. The local socket is removed even when disconnect fails.
    pub async fn close(self) -> Result<()> {
        let Self {
            host,
            level,
            handle,
            forwarder,
            ..
        } = self;

        forwarder.stop().await;
        handle
            .disconnect(Disconnect::ByApplication, "", "en")
            .await?;
        lifecycle!(level, "closed tunnel to {host}");
        Ok(())
    }
}

/// Explicit key first, then the agent, then the usual key files under `~/.ssh`.
async fn credentials(config: &TunnelConfig) -> Result<Credentials> {
    if let Some(path) = &config.key_path {
        let key = load_secret_key(path, None).map_err(|e| Error::KeyLoad {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        return Ok(Credentials::Key(Arc::new(key)));
    }

    if let Ok(agent) = AgentClient::connect_env().await {
        return Ok(Credentials::Agent(agent));
    }

    let home = std::env::var("HOME")
        .map_err(|_| Error::NoCredentials("no SSH agent and HOME is not set".to_string()))?;
    for name in ["id_ed25519", "id_ecdsa", "id_rsa"] {
        let path = PathBuf::from(&home).join(".ssh").join(name);
        if let Ok(key) = load_secret_key(&path, None) {
            return Ok(Credentials::Key(Arc::new(key)));
        }
    }

    Err(Error::NoCredentials(
        "no SSH agent and no default key in ~/.ssh".to_string(),
    ))
}

async fn authenticate(
    handle: &mut Handle<TunnelHandler>,
    user: &str,
    credentials: Credentials,
) -> Result<bool> {
    match credentials {
        Credentials::Agent(mut agent) => {
            let identities = agent
                .request_identities()
                .await
                .map_err(|e| Error::NoCredentials(format!("SSH agent: {e}")))?;

            for identity in identities {
                if let Ok(result) = handle
                    .authenticate_publickey_with(user, identity, None, &mut agent)
                    .await
                    && result.success()
                {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        Credentials::Key(key) => {
            let hash_alg = handle.best_supported_rsa_hash().await?.flatten();
            let result = handle
                .authenticate_publickey(user, PrivateKeyWithHashAlg::new(key, hash_alg))
                .await?;
            Ok(result.success())
        }
    }
}
