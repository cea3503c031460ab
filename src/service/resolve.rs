// ABOUTME: Host address resolution for the %ENGINE_HOST_IP% placeholder.
// ABOUTME: Lookups go through a swappable resolver and are cached per hostname.

use super::error::ConfigError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;

/// Resolves a hostname to the address containers should use to reach it.
#[async_trait]
pub trait HostResolver: Send + Sync {
    async fn resolve(&self, hostname: &str) -> Result<IpAddr, ConfigError>;
}

/// Resolver backed by the system's address lookup.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemResolver;

#[async_trait]
impl HostResolver for SystemResolver {
    async fn resolve(&self, hostname: &str) -> Result<IpAddr, ConfigError> {
        // Port is irrelevant; lookup_host needs one to perform the lookup.
        let mut addrs = tokio::net::lookup_host((hostname, 0))
            .await
            .map_err(|e| ConfigError::Resolve {
                hostname: hostname.to_string(),
                reason: e.to_string(),
            })?;

        addrs
            .next()
            .map(|addr| addr.ip())
            .ok_or_else(|| ConfigError::Resolve {
                hostname: hostname.to_string(),
                reason: "no addresses returned".to_string(),
            })
    }
}

/// Resolver plus the per-hostname cache, owned by one service description.
pub(crate) struct CachedResolver {
    inner: Arc<dyn HostResolver>,
    cache: Mutex<HashMap<String, IpAddr>>,
}

impl CachedResolver {
    pub(crate) fn new(inner: Arc<dyn HostResolver>) -> Self {
        Self {
            inner,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) async fn resolve(&self, hostname: &str) -> Result<IpAddr, ConfigError> {
        let cached = self.cache.lock().get(hostname).copied();
        if let Some(ip) = cached {
            return Ok(ip);
        }

        // Lock is not held across the lookup; a racing resolve only repeats the work.
        let ip = self.inner.resolve(hostname).await?;
        self.cache.lock().insert(hostname.to_string(), ip);
        Ok(ip)
    }
}

impl std::fmt::Debug for CachedResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedResolver")
            .field("cached", &self.cache.lock().len())
            .finish()
    }
}
