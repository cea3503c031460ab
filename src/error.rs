// ABOUTME: Application-wide error type for cohort.
// ABOUTME: Maps failures to process exit codes; health validation gets its own.

use crate::deploy::{DeployError, DeployErrorKind};
use crate::service::ConfigError;
use std::path::PathBuf;
use thiserror::Error;

/// Exit status when a new container never passed health validation.
pub const EXIT_HEALTH_VALIDATION: i32 = 100;
pub const EXIT_FAILURE: i32 = 1;

#[derive(Debug, Error)]
pub enum Error {
    #[error("file already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("configuration file not found in {0}")]
    ConfigNotFound(PathBuf),

    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Service(#[from] ConfigError),

    #[error(transparent)]
    Deploy(#[from] DeployError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Deploy(e) if e.kind() == DeployErrorKind::HealthValidation => {
                EXIT_HEALTH_VALIDATION
            }
            _ => EXIT_FAILURE,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_validation_exits_with_100() {
        let err = Error::from(DeployError::HealthValidationFailed {
            host: "docker1".to_string(),
            port: 8080,
            attempts: 12,
        });
        assert_eq!(err.exit_code(), 100);
    }

    #[test]
    fn everything_else_exits_with_1() {
        assert_eq!(Error::MissingEnvVar("TOKEN".into()).exit_code(), 1);
        let err = Error::from(DeployError::NoContainer {
            host: "docker1".to_string(),
            service: "web".to_string(),
        });
        assert_eq!(err.exit_code(), 1);
    }
}
