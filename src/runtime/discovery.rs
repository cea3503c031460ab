// ABOUTME: Container discovery queries layered over the lifecycle capability.
// ABOUTME: Finds a service's containers by name pattern, published port, or id.

use super::record::{ContainerRecord, ListFilter};
use super::traits::{ContainerError, ContainerOps};
use crate::types::{ContainerId, ImageRef};
use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;

/// Suffix appended to container names at create time: a dash and 14 lowercase hex digits.
static GENERATED_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-[0-9a-f]{14}$").expect("static pattern is valid"));

/// True when an engine-reported name (`/name`) belongs to service `service`.
///
/// Accepts the bare service name and the name plus a generated suffix.
pub fn name_matches(service: &str, engine_name: &str) -> bool {
    let Some(rest) = engine_name
        .strip_prefix('/')
        .and_then(|n| n.strip_prefix(service))
    else {
        return false;
    };
    rest.is_empty() || GENERATED_SUFFIX.is_match(rest)
}

/// Discovery queries available on every lifecycle backend.
///
/// Every call issues a fresh list; results are never cached.
#[async_trait]
pub trait Discovery: ContainerOps {
    async fn find_by_name(
        &self,
        name: &str,
        include_stopped: bool,
    ) -> Result<Vec<ContainerRecord>, ContainerError> {
        Ok(self
            .list(ListFilter { include_stopped })
            .await?
            .into_iter()
            .filter(|c| c.names.iter().any(|n| name_matches(name, n)))
            .collect())
    }

    async fn find_by_public_port(
        &self,
        port: u16,
        protocol: &str,
    ) -> Result<Vec<ContainerRecord>, ContainerError> {
        Ok(self
            .list(ListFilter::running())
            .await?
            .into_iter()
            .filter(|c| c.publishes(port, protocol))
            .collect())
    }

    /// Running container with this id, if any.
    async fn find_by_id(&self, id: &ContainerId) -> Result<Option<ContainerRecord>, ContainerError> {
        Ok(self
            .list(ListFilter::running())
            .await?
            .into_iter()
            .find(|c| &c.id == id))
    }

    /// Stopped containers of the service, newest first.
    ///
    /// Ordering is by creation time; equal timestamps keep the engine's order.
    async fn find_stopped_by_name(
        &self,
        name: &str,
    ) -> Result<Vec<ContainerRecord>, ContainerError> {
        let mut stopped: Vec<_> = self
            .find_by_name(name, true)
            .await?
            .into_iter()
            .filter(ContainerRecord::is_exited)
            .collect();
        stopped.sort_by(|a, b| b.created.cmp(&a.created));
        Ok(stopped)
    }

    /// Tags of the running containers started from `image`'s repository.
    async fn current_tags_for(&self, image: &ImageRef) -> Result<Vec<String>, ContainerError> {
        let repository = image.repository();
        Ok(self
            .list(ListFilter::running())
            .await?
            .iter()
            .filter(|c| {
                c.image == repository
                    || c.image
                        .strip_prefix(repository)
                        .is_some_and(|rest| rest.starts_with(':') || rest.starts_with('@'))
            })
            .map(|c| c.image_tag().to_string())
            .collect())
    }
}

#[async_trait]
impl<T: ContainerOps + ?Sized> Discovery for T {}
