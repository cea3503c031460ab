// ABOUTME: Custom serde deserializers for config types.
// ABOUTME: Handles service names, image refs, the host list, log levels, and attempt counts.

use nonempty::NonEmpty;
use serde::Deserialize;

use crate::types::{ImageRef, ServiceName};

pub fn deserialize_service_name<'de, D>(deserializer: D) -> Result<ServiceName, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    ServiceName::new(&s).map_err(serde::de::Error::custom)
}

pub fn deserialize_image_ref<'de, D>(deserializer: D) -> Result<ImageRef, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    ImageRef::parse(&s).map_err(serde::de::Error::custom)
}

/// Accepts a single host or a list; blank entries are rejected.
pub fn deserialize_hosts<'de, D>(deserializer: D) -> Result<NonEmpty<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Hosts {
        One(String),
        Many(Vec<String>),
    }

    let hosts = match Hosts::deserialize(deserializer)? {
        Hosts::One(h) => vec![h],
        Hosts::Many(hs) => hs,
    };

    let hosts = hosts
        .into_iter()
        .map(|h| {
            let h = h.trim().to_string();
            if h.is_empty() {
                Err(serde::de::Error::custom("host cannot be empty"))
            } else {
                Ok(h)
            }
        })
        .collect::<Result<Vec<_>, _>>()?;

    NonEmpty::from_vec(hosts).ok_or_else(|| serde::de::Error::custom("at least one host is required"))
}

pub fn deserialize_log_level<'de, D>(deserializer: D) -> Result<tracing::Level, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    s.parse::<tracing::Level>()
        .map_err(|_| serde::de::Error::custom(format!("unknown log level: {s}")))
}

/// Attempt counts must allow at least one try.
pub fn deserialize_attempts<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match u32::deserialize(deserializer)? {
        0 => Err(serde::de::Error::custom("retries must be at least 1")),
        n => Ok(n),
    }
}
