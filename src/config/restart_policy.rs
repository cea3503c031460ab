// ABOUTME: Restart policy as written in the config file.
// ABOUTME: "name[:max-retries]" or a map; unknown names fall back to on-failure.

use crate::error::{Error, Result};
use crate::service::RestartPolicy;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RestartPolicyEntry {
    Compact(String),
    Detailed {
        name: String,
        #[serde(default)]
        max_retry_count: Option<u32>,
    },
}

impl RestartPolicyEntry {
    pub fn to_policy(&self) -> Result<RestartPolicy> {
        match self {
            RestartPolicyEntry::Detailed {
                name,
                max_retry_count,
            } => Ok(RestartPolicy::new(name, *max_retry_count)),
            RestartPolicyEntry::Compact(s) => match s.split_once(':') {
                Some((name, retries)) => {
                    let retries = retries.parse::<u32>().map_err(|_| {
                        Error::InvalidConfig(format!("invalid restart retry count in '{s}'"))
                    })?;
                    Ok(RestartPolicy::new(name, Some(retries)))
                }
                None => Ok(RestartPolicy::new(s, None)),
            },
        }
    }
}
