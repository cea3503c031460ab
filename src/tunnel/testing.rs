// ABOUTME: Tunnel opener double that counts opens and closes instead of dialing SSH.
// ABOUTME: Lets CLI tests check that every invocation gets its own tunnel.

use super::{Error, Result, Tunnel, TunnelConfig, TunnelOpener};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Default)]
struct Counters {
    opened: AtomicUsize,
    closed: AtomicUsize,
}

#[derive(Debug, Default, Clone)]
pub struct CountingTunnels {
    counters: Arc<Counters>,
    refuse: bool,
}

impl CountingTunnels {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every open fails, as if the SSH connection were refused.
    pub fn refusing() -> Self {
        Self {
            refuse: true,
            ..Self::default()
        }
    }

    pub fn opened(&self) -> usize {
        self.counters.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.counters.closed.load(Ordering::SeqCst)
    }
}

struct CountedTunnel {
    endpoint: String,
    counters: Arc<Counters>,
}

#[async_trait]
impl Tunnel for CountedTunnel {
    fn local_endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.counters.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl TunnelOpener for CountingTunnels {
    async fn open(&self, config: &TunnelConfig, hostname: &str) -> Result<Box<dyn Tunnel>> {
        if self.refuse {
            return Err(Error::Connection {
                host: hostname.to_string(),
                port: config.port,
                reason: "connection refused".to_string(),
            });
        }
        let n = self.counters.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(CountedTunnel {
            endpoint: format!("unix:///tmp/cohort-test-{n}.sock"),
            counters: Arc::clone(&self.counters),
        }))
    }
}
