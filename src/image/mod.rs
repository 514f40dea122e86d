//! Deciding whether the local image is current

use tracing::debug;

use crate::engine::Engine;
use crate::error::{PwnboxError, Result};

/// Outcome of comparing the local image against the registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageStatus {
    /// Nothing cached locally
    PullRequired,
    UpToDate,
    UpdateAvailable { local: Vec<String>, remote: String },
    /// Present locally, registry not consulted
    Unverified,
}

pub struct ImageResolver<'a> {
    engine: &'a dyn Engine,
}

impl<'a> ImageResolver<'a> {
    pub fn new(engine: &'a dyn Engine) -> Self {
        Self { engine }
    }

    /// Resolve the status of `reference`.
    ///
    /// With `check_registry` unset only the local cache is consulted. A failed
    /// registry lookup is reported as `RegistryUnreachable`, never as a
    /// missing image; the caller decides whether that is fatal.
    pub async fn resolve(&self, reference: &str, check_registry: bool) -> Result<ImageStatus> {
        let local = match self.engine.inspect_image(reference).await {
            Ok(image) => image,
            Err(PwnboxError::ImageNotFound(_)) => return Ok(ImageStatus::PullRequired),
            Err(e) => return Err(e),
        };
        if !check_registry {
            return Ok(ImageStatus::Unverified);
        }

        let remote = self
            .engine
            .registry_digest(reference)
            .await
            .map_err(|e| match e {
                PwnboxError::RegistryUnreachable(reason) => PwnboxError::RegistryUnreachable(reason),
                other => PwnboxError::RegistryUnreachable(other.to_string()),
            })?;

        let local_digests: Vec<String> = local.digests().map(str::to_string).collect();
        debug!(reference, ?local_digests, remote = %remote, "Comparing image digests");

        if local_digests.iter().any(|digest| *digest == remote) {
            Ok(ImageStatus::UpToDate)
        } else {
            Ok(ImageStatus::UpdateAvailable {
                local: local_digests,
                remote,
            })
        }
    }
}
