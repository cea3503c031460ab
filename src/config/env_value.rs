// ABOUTME: Environment variable values as written in the config file.
// ABOUTME: Scalars (placeholders allowed in strings) or references to the deployer's environment.

use crate::error::{Error, Result};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum EnvSource {
    /// May contain `%ENGINE_HOSTNAME%` or `%ENGINE_HOST_IP%`.
    Text(String),
    Number(serde_yaml::Number),
    Flag(bool),
    FromEnv {
        #[serde(rename = "env")]
        var: String,
        #[serde(default)]
        default: Option<String>,
    },
}

impl EnvSource {
    /// Value handed to the service; environment references are read from the local process.
    pub fn resolve(&self) -> Result<String> {
        match self {
            EnvSource::Text(s) => Ok(s.clone()),
            EnvSource::Number(n) => Ok(n.to_string()),
            EnvSource::Flag(b) => Ok(b.to_string()),
            EnvSource::FromEnv { var, default } => std::env::var(var)
                .ok()
                .or_else(|| default.clone())
                .ok_or_else(|| Error::MissingEnvVar(var.clone())),
        }
    }
}
