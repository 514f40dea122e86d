//! Lifecycle of the single named PwnBox container
//!
//! The container is either absent or present. `up` treats an existing
//! container as success, `down` treats a missing one as an error.

use tracing::{debug, info};

use super::spec::{ContainerSpec, Platform};
use super::x11;
use crate::config::Settings;
use crate::engine::{ContainerInfo, Engine};
use crate::error::{PwnboxError, Result};

/// Observed state of the configured container
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerState {
    Absent,
    Running(ContainerInfo),
    /// Exists but is not running (only possible without auto-remove)
    Stopped(ContainerInfo),
}

/// Drives the engine for one named container
pub struct ContainerManager<'a> {
    engine: &'a dyn Engine,
    platform: Platform,
}

impl<'a> ContainerManager<'a> {
    pub fn new(engine: &'a dyn Engine, platform: Platform) -> Self {
        Self { engine, platform }
    }

    pub async fn state(&self, name: &str) -> Result<ContainerState> {
        Ok(match self.engine.inspect_container(name).await? {
            None => ContainerState::Absent,
            Some(info) if info.running => ContainerState::Running(info),
            Some(info) => ContainerState::Stopped(info),
        })
    }

    /// Runtime parameters for the configured container
    pub fn spec(&self, settings: &Settings) -> Result<ContainerSpec> {
        ContainerSpec::from_settings(settings, self.platform)
    }

    /// Create and start the container. Returns the new container id.
    pub async fn launch(&self, spec: &ContainerSpec, x11_forwarding: bool) -> Result<String> {
        debug!(?spec, "Container spec");
        if x11_forwarding {
            x11::allow(self.platform);
        }

        let id = self.engine.create_container(spec).await?;
        info!(container = %spec.name, id = %id, "Container launched");
        Ok(id)
    }

    /// Start an existing, stopped container
    pub async fn resume(&self, name: &str, x11_forwarding: bool) -> Result<()> {
        if x11_forwarding {
            x11::allow(self.platform);
        }
        self.engine.start_container(name).await?;
        info!(container = %name, "Container resumed");
        Ok(())
    }

    /// Stop and remove the container
    pub async fn down(&self, settings: &Settings) -> Result<ContainerInfo> {
        let name = &settings.container.name;
        let (info, running) = match self.state(name).await? {
            ContainerState::Absent => return Err(PwnboxError::NotRunning(name.clone())),
            ContainerState::Running(info) => (info, true),
            ContainerState::Stopped(info) => (info, false),
        };

        if settings.container.x11_forwarding {
            x11::revoke(self.platform);
        }

        if running {
            self.engine.kill_container(name).await?;
        }
        // An auto-removed container is reaped by the engine once killed
        if !(running && settings.container.auto_remove) {
            self.engine.remove_container(name).await?;
        }
        info!(container = %name, id = %info.short_id(), "Container brought down");
        Ok(info)
    }
}
