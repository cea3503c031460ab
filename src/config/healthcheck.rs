// ABOUTME: HTTP health validation settings for new containers.
// ABOUTME: Defaults poll every five seconds, twelve times.

use super::deserialize::deserialize_attempts;
use crate::deploy::health::{DEFAULT_INTERVAL, DEFAULT_MAX_ATTEMPTS, DEFAULT_PROBE_TIMEOUT};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HealthConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Public port to probe; the first binding's host port when unset.
    #[serde(default)]
    pub port: Option<u16>,

    #[serde(default = "default_interval", with = "humantime_serde")]
    pub interval: Duration,

    /// Probe attempts before giving up; at least one.
    #[serde(default = "default_retries", deserialize_with = "deserialize_attempts")]
    pub retries: u32,

    /// Per-request timeout.
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,

    #[serde(default)]
    pub skip: bool,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            port: None,
            interval: default_interval(),
            retries: default_retries(),
            timeout: default_timeout(),
            skip: false,
        }
    }
}

fn default_endpoint() -> String {
    "/".to_string()
}

fn default_interval() -> Duration {
    DEFAULT_INTERVAL
}

fn default_retries() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_timeout() -> Duration {
    DEFAULT_PROBE_TIMEOUT
}
