//! Translation of [`Settings`] into runtime container parameters

use std::path::{Path, PathBuf};

use crate::config::Settings;
use crate::container::ports::{parse_port_mappings, PortMapping};
use crate::error::Result;

pub const EXTERNAL_MOUNT: &str = "/mnt/external";
pub const SSH_MOUNT: &str = "/opt/ssh";
pub const X11_SOCKET_DIR: &str = "/tmp/.X11-unix";

/// Docker's host-loopback alias. Resolution of the host from inside the
/// container is not reliable across engine versions, so it is pinned.
pub const HOST_ALIAS: &str = "host.docker.internal:192.168.65.2";

/// Host operating system family, as far as container setup cares
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Linux,
    Other,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(target_os = "linux") {
            Platform::Linux
        } else {
            Platform::Other
        }
    }

    /// Host networking and X11 socket sharing only work on Linux
    pub fn is_linux(self) -> bool {
        self == Platform::Linux
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkMode {
    Host,
    Bridge,
}

impl NetworkMode {
    pub fn as_str(self) -> &'static str {
        match self {
            NetworkMode::Host => "host",
            NetworkMode::Bridge => "bridge",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindMount {
    pub host: PathBuf,
    pub target: String,
    pub read_only: bool,
}

impl BindMount {
    pub fn read_write(host: impl AsRef<Path>, target: &str) -> Self {
        Self {
            host: host.as_ref().to_path_buf(),
            target: target.to_string(),
            read_only: false,
        }
    }

    /// `host:target:mode` as understood by the engine
    pub fn to_bind_string(&self) -> String {
        let mode = if self.read_only { "ro" } else { "rw" };
        format!("{}:{}:{}", self.host.display(), self.target, mode)
    }
}

/// Everything needed to create the PwnBox container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    pub name: String,
    pub image: String,
    pub hostname: String,
    /// Empty under host networking
    pub ports: Vec<PortMapping>,
    pub network_mode: NetworkMode,
    pub binds: Vec<BindMount>,
    pub auto_remove: bool,
    pub privileged: bool,
    pub dns: Vec<String>,
    pub extra_hosts: Vec<String>,
}

impl ContainerSpec {
    pub fn from_settings(settings: &Settings, platform: Platform) -> Result<Self> {
        let container = &settings.container;

        // Parsed even under host networking so a bad spec is always reported
        let ports = parse_port_mappings(&container.forwarded_ports)?;

        let network_mode = if container.host_networking && platform.is_linux() {
            NetworkMode::Host
        } else {
            NetworkMode::Bridge
        };

        let mut binds = vec![
            BindMount::read_write(&container.external_volume, EXTERNAL_MOUNT),
            BindMount::read_write(&container.ssh_volume, SSH_MOUNT),
        ];
        if container.x11_forwarding && platform.is_linux() {
            binds.push(BindMount::read_write(X11_SOCKET_DIR, X11_SOCKET_DIR));
        }

        Ok(Self {
            name: container.name.clone(),
            image: settings.image.reference(),
            hostname: container.hostname.clone(),
            ports: match network_mode {
                NetworkMode::Host => Vec::new(),
                NetworkMode::Bridge => ports,
            },
            network_mode,
            binds,
            auto_remove: container.auto_remove,
            privileged: container.privileged,
            dns: container.dns_servers.clone(),
            extra_hosts: vec![HOST_ALIAS.to_string()],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PwnboxError;
    use crate::testing::sample_settings;

    #[test]
    fn test_bridge_spec() {
        let spec = ContainerSpec::from_settings(&sample_settings(), Platform::Linux).unwrap();
        assert_eq!(spec.network_mode, NetworkMode::Bridge);
        assert_eq!(spec.ports.len(), 3);
        assert_eq!(spec.image, "registry.example.com/deadpackets/pwnbox:dev");
        assert_eq!(spec.extra_hosts, vec![HOST_ALIAS]);
        assert_eq!(
            spec.binds
                .iter()
                .map(BindMount::to_bind_string)
                .collect::<Vec<_>>(),
            vec![
                "/srv/external:/mnt/external:rw",
                "/srv/ssh:/opt/ssh:rw",
                "/tmp/.X11-unix:/tmp/.X11-unix:rw",
            ]
        );
    }

    #[test]
    fn test_read_only_bind_string() {
        let bind = BindMount {
            read_only: true,
            ..BindMount::read_write("/srv/ssh", SSH_MOUNT)
        };
        assert_eq!(bind.to_bind_string(), "/srv/ssh:/opt/ssh:ro");
    }

    #[test]
    fn test_host_networking_on_linux_drops_ports() {
        let mut settings = sample_settings();
        settings.container.host_networking = true;
        let spec = ContainerSpec::from_settings(&settings, Platform::Linux).unwrap();
        assert_eq!(spec.network_mode, NetworkMode::Host);
        assert!(spec.ports.is_empty());
    }

    #[test]
    fn test_host_networking_ignored_elsewhere() {
        let mut settings = sample_settings();
        settings.container.host_networking = true;
        let spec = ContainerSpec::from_settings(&settings, Platform::Other).unwrap();
        assert_eq!(spec.network_mode, NetworkMode::Bridge);
        assert_eq!(spec.ports.len(), 3);
        // no X11 socket outside Linux
        assert_eq!(spec.binds.len(), 2);
    }

    #[test]
    fn test_invalid_ports_rejected() {
        let mut settings = sample_settings();
        settings.container.forwarded_ports = "1-3:1-2".to_string();
        assert!(matches!(
            ContainerSpec::from_settings(&settings, Platform::Linux),
            Err(PwnboxError::InvalidPortMapping(_))
        ));
    }
}
