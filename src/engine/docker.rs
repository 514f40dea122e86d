//! Docker implementation of [`Engine`] using bollard

use std::collections::HashMap;

use async_trait::async_trait;
use bollard::container::{
    Config, CreateContainerOptions, InspectContainerOptions, KillContainerOptions,
    RemoveContainerOptions, StartContainerOptions,
};
use bollard::errors::Error as DockerError;
use bollard::image::CreateImageOptions;
use bollard::models::{CreateImageInfo, HostConfig, PortBinding};
use bollard::Docker;
use futures_util::StreamExt;
use tracing::debug;

use super::credentials;
use super::{ContainerInfo, Engine, LocalImage, ProgressDetail, PullEvent, PullStream};
use crate::container::{ContainerSpec, NetworkMode};
use crate::error::{PwnboxError, Result};

pub struct DockerEngine {
    docker: Docker,
}

impl DockerEngine {
    /// Connect using the local defaults (socket path or `DOCKER_HOST`)
    pub fn connect() -> Result<Self> {
        let docker = Docker::connect_with_local_defaults()
            .map_err(|e| PwnboxError::EngineUnavailable(e.to_string()))?;
        Ok(Self { docker })
    }
}

fn is_not_found(err: &DockerError) -> bool {
    matches!(
        err,
        DockerError::DockerResponseServerError {
            status_code: 404,
            ..
        }
    )
}

fn api_error(err: DockerError) -> PwnboxError {
    PwnboxError::ContainerApiError(err.to_string())
}

/// Translate a [`ContainerSpec`] into the engine's create request
fn container_config(spec: &ContainerSpec) -> Config<String> {
    let mut port_bindings: HashMap<String, Option<Vec<PortBinding>>> = HashMap::new();
    let mut exposed_ports = HashMap::new();
    for mapping in &spec.ports {
        port_bindings.insert(
            mapping.key(),
            Some(vec![PortBinding {
                host_ip: None,
                host_port: Some(mapping.host.to_string()),
            }]),
        );
        exposed_ports.insert(mapping.key(), HashMap::new());
    }

    let host_config = HostConfig {
        auto_remove: Some(spec.auto_remove),
        privileged: Some(spec.privileged),
        network_mode: Some(spec.network_mode.as_str().to_string()),
        port_bindings: match spec.network_mode {
            NetworkMode::Host => None,
            NetworkMode::Bridge => Some(port_bindings),
        },
        binds: Some(spec.binds.iter().map(|b| b.to_bind_string()).collect()),
        dns: Some(spec.dns.clone()),
        extra_hosts: Some(spec.extra_hosts.clone()),
        ..Default::default()
    };

    Config {
        image: Some(spec.image.clone()),
        hostname: Some(spec.hostname.clone()),
        exposed_ports: match spec.network_mode {
            NetworkMode::Host => None,
            NetworkMode::Bridge => Some(exposed_ports),
        },
        host_config: Some(host_config),
        ..Default::default()
    }
}

fn pull_event(info: CreateImageInfo) -> Result<PullEvent> {
    if let Some(message) = info.error {
        return Err(PwnboxError::ContainerApiError(message));
    }
    let progress = info
        .progress_detail
        .and_then(|detail| match (detail.current, detail.total) {
            (Some(current), Some(total)) if current >= 0 && total >= 0 => Some(ProgressDetail {
                current: current as u64,
                total: total as u64,
            }),
            _ => None,
        });
    Ok(PullEvent {
        id: info.id,
        status: info.status.unwrap_or_default(),
        progress,
    })
}

#[async_trait]
impl Engine for DockerEngine {
    async fn ping(&self) -> Result<()> {
        self.docker
            .ping()
            .await
            .map_err(|e| PwnboxError::EngineUnavailable(e.to_string()))?;
        Ok(())
    }

    async fn inspect_container(&self, name: &str) -> Result<Option<ContainerInfo>> {
        match self
            .docker
            .inspect_container(name, None::<InspectContainerOptions>)
            .await
        {
            Ok(response) => Ok(Some(ContainerInfo {
                id: response.id.unwrap_or_default(),
                running: response.state.and_then(|s| s.running).unwrap_or(false),
            })),
            Err(e) if is_not_found(&e) => Ok(None),
            Err(e) => Err(api_error(e)),
        }
    }

    async fn create_container(&self, spec: &ContainerSpec) -> Result<String> {
        let options = CreateContainerOptions {
            name: spec.name.clone(),
            platform: None,
        };
        let response = self
            .docker
            .create_container(Some(options), container_config(spec))
            .await
            .map_err(api_error)?;
        for warning in &response.warnings {
            debug!(warning = %warning, "Engine warning on create");
        }

        self.docker
            .start_container(&response.id, None::<StartContainerOptions<String>>)
            .await
            .map_err(api_error)?;
        Ok(response.id)
    }

    async fn start_container(&self, name: &str) -> Result<()> {
        self.docker
            .start_container(name, None::<StartContainerOptions<String>>)
            .await
            .map_err(api_error)
    }

    async fn kill_container(&self, name: &str) -> Result<()> {
        match self
            .docker
            .kill_container(name, None::<KillContainerOptions<String>>)
            .await
        {
            Ok(()) => Ok(()),
            Err(e) if is_not_found(&e) => Err(PwnboxError::NotRunning(name.to_string())),
            Err(e) => Err(api_error(e)),
        }
    }

    async fn remove_container(&self, name: &str) -> Result<()> {
        let options = RemoveContainerOptions {
            force: true,
            ..Default::default()
        };
        match self.docker.remove_container(name, Some(options)).await {
            Ok(()) => Ok(()),
            Err(e) if is_not_found(&e) => {
                debug!(container = %name, "Container already removed");
                Ok(())
            }
            Err(e) => Err(api_error(e)),
        }
    }

    async fn inspect_image(&self, reference: &str) -> Result<LocalImage> {
        match self.docker.inspect_image(reference).await {
            Ok(image) => Ok(LocalImage {
                id: image.id.unwrap_or_default(),
                repo_digests: image.repo_digests.unwrap_or_default(),
            }),
            Err(e) if is_not_found(&e) => Err(PwnboxError::ImageNotFound(reference.to_string())),
            Err(e) => Err(api_error(e)),
        }
    }

    async fn registry_digest(&self, reference: &str) -> Result<String> {
        let inspect = self
            .docker
            .inspect_registry_image(reference, credentials::lookup(reference))
            .await
            .map_err(|e| PwnboxError::RegistryUnreachable(e.to_string()))?;
        inspect.descriptor.digest.ok_or_else(|| {
            PwnboxError::RegistryUnreachable(format!("no digest reported for {}", reference))
        })
    }

    fn pull_image<'a>(&'a self, repository: &str, tag: &str) -> PullStream<'a> {
        let options = CreateImageOptions {
            from_image: repository.to_string(),
            tag: tag.to_string(),
            ..Default::default()
        };
        Box::pin(
            self.docker
                .create_image(Some(options), None, credentials::lookup(repository))
                .map(|item| item.map_err(api_error).and_then(pull_event)),
        )
    }
}
