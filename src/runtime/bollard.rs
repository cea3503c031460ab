// ABOUTME: Management-API adapter built on bollard.
// ABOUTME: Serves the lifecycle capability over plain HTTP or TLS client certificates.

use super::connection::ConnectionParams;
use super::error::{ClientSnafu, ConnectError, IncompleteTlsSnafu, TlsFileSnafu};
use super::record::{ContainerRecord, ListFilter, PortRecord};
use super::traits::sealed::Sealed;
use super::traits::{ContainerError, ContainerOps};
use crate::service::CreatePayload;
use crate::types::ContainerId;
use async_trait::async_trait;
use bollard::Docker;
use bollard::models::ContainerCreateBody;
use bollard::query_parameters::{
    CreateContainerOptions, InspectContainerOptions, ListContainersOptions,
    RemoveContainerOptions, RestartContainerOptions, StartContainerOptions, StopContainerOptions,
};
use chrono::{DateTime, Utc};
use snafu::ResultExt;
use std::time::Duration;

/// Request timeout in seconds; stop waits count against it.
const REQUEST_TIMEOUT_SECS: u64 = 120;

// =============================================================================
// Error Mapping Helpers
// =============================================================================

fn map_create_error(e: bollard::errors::Error) -> ContainerError {
    match &e {
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 404 => ContainerError::ImageNotFound(message.clone()),
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 409 => ContainerError::AlreadyExists(message.clone()),
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 400 => ContainerError::InvalidConfig(message.clone()),
        _ => ContainerError::Runtime(e.to_string()),
    }
}

fn map_stop_error(e: bollard::errors::Error) -> ContainerError {
    match &e {
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 404 => ContainerError::NotFound(message.clone()),
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 304 => ContainerError::NotRunning(message.clone()),
        _ => ContainerError::Runtime(e.to_string()),
    }
}

fn map_not_found_error(e: bollard::errors::Error) -> ContainerError {
    match &e {
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 404 => ContainerError::NotFound(message.clone()),
        _ => ContainerError::Runtime(e.to_string()),
    }
}

// =============================================================================
// ManagementApi
// =============================================================================

/// Lifecycle operations against one engine's remote API. Never tunnelled.
pub struct ManagementApi {
    client: Docker,
}

impl ManagementApi {
    /// Build a client for `params`. No request is made until the first operation.
    pub fn connect(params: &ConnectionParams) -> Result<Self, ConnectError> {
        let address = params.tcp_address();

        let client = if params.tls.enabled() {
            let (Some(ca), Some(cert), Some(key)) =
                (&params.tls.ca_cert, &params.tls.cert, &params.tls.key)
            else {
                return IncompleteTlsSnafu {
                    address,
                    missing: missing_tls_paths(params),
                }
                .fail();
            };

            for path in [ca, cert, key] {
                std::fs::metadata(path).context(TlsFileSnafu { path: path.clone() })?;
            }

            Docker::connect_with_ssl(
                &address,
                key,
                cert,
                ca,
                REQUEST_TIMEOUT_SECS,
                bollard::API_DEFAULT_VERSION,
            )
            .context(ClientSnafu {
                address: address.clone(),
            })?
        } else {
            Docker::connect_with_http(&address, REQUEST_TIMEOUT_SECS, bollard::API_DEFAULT_VERSION)
                .context(ClientSnafu {
                    address: address.clone(),
                })?
        };

        tracing::debug!("engine client ready for {address}");
        Ok(Self { client })
    }
}

fn missing_tls_paths(params: &ConnectionParams) -> String {
    let tls = &params.tls;
    [
        ("CA certificate", tls.ca_cert.is_none()),
        ("client certificate", tls.cert.is_none()),
        ("client key", tls.key.is_none()),
    ]
    .into_iter()
    .filter(|(_, missing)| *missing)
    .map(|(what, _)| what)
    .collect::<Vec<_>>()
    .join(", ")
}

/// Re-reads the compiled payload as bollard's model; field names are shared.
fn to_create_body(config: &CreatePayload) -> Result<ContainerCreateBody, ContainerError> {
    serde_json::to_value(config)
        .and_then(serde_json::from_value)
        .map_err(|e| ContainerError::InvalidConfig(e.to_string()))
}

impl Sealed for ManagementApi {}

#[async_trait]
impl ContainerOps for ManagementApi {
    async fn create(
        &self,
        name: &str,
        config: &CreatePayload,
    ) -> Result<ContainerId, ContainerError> {
        let body = to_create_body(config)?;
        let opts = CreateContainerOptions {
            name: Some(name.to_string()),
            ..Default::default()
        };

        let response = self
            .client
            .create_container(Some(opts), body)
            .await
            .map_err(map_create_error)?;

        for warning in &response.warnings {
            tracing::warn!("engine warning creating {name}: {warning}");
        }

        Ok(ContainerId::new(response.id))
    }

    async fn inspect(&self, id: &ContainerId) -> Result<serde_json::Value, ContainerError> {
        let details = self
            .client
            .inspect_container(id.as_str(), None::<InspectContainerOptions>)
            .await
            .map_err(map_not_found_error)?;

        serde_json::to_value(details).map_err(|e| ContainerError::Runtime(e.to_string()))
    }

    async fn list(&self, filter: ListFilter) -> Result<Vec<ContainerRecord>, ContainerError> {
        let opts = ListContainersOptions {
            all: filter.include_stopped,
            ..Default::default()
        };

        let containers = self
            .client
            .list_containers(Some(opts))
            .await
            .map_err(|e| ContainerError::Runtime(e.to_string()))?;

        Ok(containers
            .into_iter()
            .map(|c| ContainerRecord {
                id: ContainerId::new(c.id.unwrap_or_default()),
                names: c.names.unwrap_or_default(),
                image: c.image.unwrap_or_default(),
                ports: c
                    .ports
                    .unwrap_or_default()
                    .into_iter()
                    .map(|p| PortRecord {
                        host_ip: p.ip,
                        container_port: p.private_port,
                        host_port: p.public_port,
                        protocol: p
                            .typ
                            .map(|t| t.to_string())
                            .unwrap_or_else(|| "tcp".to_string()),
                    })
                    .collect(),
                status: c.status.unwrap_or_default(),
                created: c
                    .created
                    .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
                    .unwrap_or_default(),
            })
            .collect())
    }

    async fn start(&self, id: &ContainerId) -> Result<(), ContainerError> {
        // Host config was delivered at create; engines reject start bodies.
        self.client
            .start_container(id.as_str(), None::<StartContainerOptions>)
            .await
            .map_err(map_not_found_error)
    }

    async fn stop(&self, id: &ContainerId, timeout: Duration) -> Result<(), ContainerError> {
        let opts = StopContainerOptions {
            t: Some(i32::try_from(timeout.as_secs()).unwrap_or(i32::MAX)),
            signal: None,
        };

        self.client
            .stop_container(id.as_str(), Some(opts))
            .await
            .map_err(map_stop_error)
    }

    async fn remove(&self, id: &ContainerId) -> Result<(), ContainerError> {
        self.client
            .remove_container(id.as_str(), Some(RemoveContainerOptions::default()))
            .await
            .map_err(map_not_found_error)
    }

    async fn restart(&self, id: &ContainerId) -> Result<(), ContainerError> {
        self.client
            .restart_container(id.as_str(), None::<RestartContainerOptions>)
            .await
            .map_err(map_not_found_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::connection::TlsSettings;
    use crate::runtime::error::ConnectErrorKind;
    use crate::service::{HostConfigPayload, RestartPolicyPayload};

    #[test]
    fn compiled_payload_reads_as_bollard_model() {
        let config = CreatePayload {
            image: "nginx:1.25".to_string(),
            env: Some(vec!["A=1".to_string()]),
            host_config: Some(HostConfigPayload {
                network_mode: "bridge".to_string(),
                memory: Some(1024),
                restart_policy: Some(RestartPolicyPayload {
                    name: "on-failure".to_string(),
                    maximum_retry_count: Some(10),
                }),
                ..Default::default()
            }),
            ..Default::default()
        };

        let body = to_create_body(&config).unwrap();
        assert_eq!(body.image.as_deref(), Some("nginx:1.25"));
        assert_eq!(body.env, Some(vec!["A=1".to_string()]));
        let host_config = body.host_config.unwrap();
        assert_eq!(host_config.network_mode.as_deref(), Some("bridge"));
        assert_eq!(host_config.memory, Some(1024));
        assert_eq!(
            host_config.restart_policy.and_then(|p| p.maximum_retry_count),
            Some(10)
        );
    }

    #[test]
    fn tls_without_files_is_a_configuration_error() {
        let tls = TlsSettings {
            verify: true,
            cert: Some("/certs/cert.pem".into()),
            ..Default::default()
        };
        let params = ConnectionParams::parse("docker1", tls, None).unwrap();

        let err = ManagementApi::connect(&params).err().unwrap();
        assert_eq!(err.kind(), ConnectErrorKind::Configuration);
        let message = err.to_string();
        assert!(message.contains("CA certificate"));
        assert!(message.contains("client key"));
        assert!(!message.contains("client certificate,"));
    }

    #[tokio::test]
    async fn plain_http_client_builds_without_network() {
        let params =
            ConnectionParams::parse("127.0.0.1:2375", TlsSettings::default(), None).unwrap();
        assert!(ManagementApi::connect(&params).is_ok());
    }
}
