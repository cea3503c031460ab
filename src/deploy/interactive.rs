// ABOUTME: Auxiliary per-host operations: console, enter, restart, logs, and pull.
// ABOUTME: The "current" container is the first one the service's discovery strategy finds.

use super::error::DeployError;
use super::strategy::DiscoveryStrategy;
use super::transitions::container_name;
use crate::runtime::{CliError, ContainerOps, ContainerRecord, SessionExit, StreamingOps};
use crate::service::ServiceSpec;
use crate::types::{ContainerId, ImageRef};

const SHELL: &str = "/bin/bash";

fn streaming_error(host: &str, operation: &'static str) -> impl FnOnce(CliError) -> DeployError {
    let host = host.to_string();
    move |source| DeployError::Streaming {
        host,
        operation,
        source,
    }
}

/// First running container serving the service on `host`.
pub async fn current_container<R: ContainerOps + ?Sized>(
    runtime: &R,
    host: &str,
    spec: &ServiceSpec,
) -> Result<ContainerRecord, DeployError> {
    DiscoveryStrategy::for_service(spec)
        .find(runtime)
        .await
        .map_err(|source| DeployError::Discovery {
            host: host.to_string(),
            source,
        })?
        .into_iter()
        .next()
        .ok_or_else(|| DeployError::NoContainer {
            host: host.to_string(),
            service: spec.name().to_string(),
        })
}

/// Creates and starts a shell container for the service, then attaches the terminal to it.
pub async fn launch_console<R: ContainerOps + StreamingOps + ?Sized>(
    runtime: &R,
    host: &str,
    spec: &ServiceSpec,
) -> Result<ContainerId, DeployError> {
    let payload = spec.compile_console(host).await?;
    let name = container_name(spec.name());

    tracing::info!("{host}: creating console container {name} from {}", spec.image());
    let id = runtime
        .create(&name, &payload)
        .await
        .map_err(|source| DeployError::Create {
            host: host.to_string(),
            name: name.clone(),
            source,
        })?;

    runtime
        .start(&id)
        .await
        .map_err(|source| DeployError::Start {
            host: host.to_string(),
            container: id.to_string(),
            source,
        })?;

    runtime
        .attach(&id)
        .await
        .map_err(streaming_error(host, "attach"))?;
    Ok(id)
}

/// Opens an interactive shell in the current container.
pub async fn enter_container<R: ContainerOps + StreamingOps + ?Sized>(
    runtime: &R,
    host: &str,
    spec: &ServiceSpec,
) -> Result<SessionExit, DeployError> {
    let container = current_container(runtime, host, spec).await?;
    tracing::info!("{host}: entering {}", container.id.short());
    runtime
        .interactive_exec(&container.id, &[SHELL.to_string()])
        .await
        .map_err(streaming_error(host, "exec"))
}

/// Restarts the current container through the management API.
pub async fn restart_container<R: ContainerOps + ?Sized>(
    runtime: &R,
    host: &str,
    spec: &ServiceSpec,
) -> Result<ContainerId, DeployError> {
    let container = current_container(runtime, host, spec).await?;
    tracing::info!("{host}: restarting {}", container.id.short());
    runtime
        .restart(&container.id)
        .await
        .map_err(|source| DeployError::Restart {
            host: host.to_string(),
            container: container.id.to_string(),
            source,
        })?;
    Ok(container.id)
}

/// Follows the logs of the current container until the stream ends.
pub async fn tail_logs<R: ContainerOps + StreamingOps + ?Sized>(
    runtime: &R,
    host: &str,
    spec: &ServiceSpec,
) -> Result<(), DeployError> {
    let container = current_container(runtime, host, spec).await?;
    runtime
        .follow_logs(&container.id)
        .await
        .map_err(streaming_error(host, "logs"))
}

pub async fn pull_image<R: StreamingOps + ?Sized>(
    runtime: &R,
    host: &str,
    image: &ImageRef,
) -> Result<(), DeployError> {
    runtime
        .pull(image)
        .await
        .map_err(streaming_error(host, "pull"))
}
