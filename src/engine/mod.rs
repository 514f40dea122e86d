//! Container engine abstraction
//!
//! The [`Engine`] trait is the only way the rest of the crate talks to the
//! container runtime. [`DockerEngine`] implements it on top of bollard; tests
//! substitute an in-memory fake.

pub mod credentials;
pub mod docker;

use std::pin::Pin;

use async_trait::async_trait;
use futures_util::Stream;

use crate::container::ContainerSpec;
use crate::error::Result;

pub use docker::DockerEngine;

/// Byte counters attached to a pull status event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressDetail {
    pub current: u64,
    pub total: u64,
}

/// One status event from an image pull
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullEvent {
    /// Layer id, absent for image-level messages
    pub id: Option<String>,
    pub status: String,
    pub progress: Option<ProgressDetail>,
}

impl PullEvent {
    pub fn status(id: Option<&str>, status: &str) -> Self {
        Self {
            id: id.map(str::to_string),
            status: status.to_string(),
            progress: None,
        }
    }

    pub fn progress(id: &str, status: &str, current: u64, total: u64) -> Self {
        Self {
            id: Some(id.to_string()),
            status: status.to_string(),
            progress: Some(ProgressDetail { current, total }),
        }
    }
}

pub type PullStream<'a> = Pin<Box<dyn Stream<Item = Result<PullEvent>> + Send + 'a>>;

/// What the engine reports about a named container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerInfo {
    pub id: String,
    pub running: bool,
}

/// First 12 characters of a container id, as the engine CLI shows it
pub fn short_id(id: &str) -> &str {
    match id.char_indices().nth(12) {
        Some((end, _)) => &id[..end],
        None => id,
    }
}

impl ContainerInfo {
    pub fn short_id(&self) -> &str {
        short_id(&self.id)
    }
}

/// Metadata of a locally cached image
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LocalImage {
    pub id: String,
    /// `repository@sha256:...` entries
    pub repo_digests: Vec<String>,
}

impl LocalImage {
    /// Content digests with the repository prefix removed
    pub fn digests(&self) -> impl Iterator<Item = &str> {
        self.repo_digests
            .iter()
            .filter_map(|entry| entry.split_once('@').map(|(_, digest)| digest))
    }
}

#[async_trait]
pub trait Engine: Send + Sync {
    /// Check that the engine answers
    async fn ping(&self) -> Result<()>;

    /// Look up a container by name. `None` when it does not exist.
    async fn inspect_container(&self, name: &str) -> Result<Option<ContainerInfo>>;

    /// Create and start a container, returning its id
    async fn create_container(&self, spec: &ContainerSpec) -> Result<String>;

    async fn start_container(&self, name: &str) -> Result<()>;

    async fn kill_container(&self, name: &str) -> Result<()>;

    /// Remove a container. Removing an absent container is not an error.
    async fn remove_container(&self, name: &str) -> Result<()>;

    /// Local image metadata; `ImageNotFound` when not cached
    async fn inspect_image(&self, reference: &str) -> Result<LocalImage>;

    /// Digest the registry currently serves for `reference`
    async fn registry_digest(&self, reference: &str) -> Result<String>;

    /// Start pulling `repository:tag` and stream its progress events
    fn pull_image<'a>(&'a self, repository: &str, tag: &str) -> PullStream<'a>;
}
