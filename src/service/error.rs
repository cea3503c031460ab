// ABOUTME: Validation errors raised while building a service description.
// ABOUTME: These are caller configuration bugs and are never retried.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {field}: {found}, value must be a list")]
    NotASequence { field: &'static str, found: String },

    #[error("invalid entry in {field}: {found}, entries must be strings")]
    NotAString { field: &'static str, found: String },

    #[error(
        "invalid value for {field}: {value}, value must be between 0 and 18446744073709551615"
    )]
    OutOfRange { field: &'static str, value: String },

    #[error("invalid value for {field}: {found}, value must be an integer")]
    NotAnInteger { field: &'static str, found: String },

    #[error("failed to resolve address of {hostname}: {reason}")]
    Resolve { hostname: String, reason: String },

    #[error("invalid port binding '{0}'")]
    InvalidPortBinding(String),

    #[error("invalid bind '{0}', expected host_path:container_path")]
    InvalidVolume(String),

    #[error("service description is missing {0}")]
    Missing(&'static str),
}
