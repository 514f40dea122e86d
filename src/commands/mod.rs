//! The `up`, `down`, `pull` and `generate` commands
//!
//! Each command is a short sequence over the engine, the image resolver, the
//! container manager and the connectivity waiter. All user-facing text goes
//! through the session's [`OutputSink`].

use std::path::Path;

use tracing::debug;

use crate::config::{self, ImageSettings, Settings};
use crate::connect::{self, Handoff, WaitPolicy, SSH_HOST, SSH_PORT};
use crate::container::{ContainerManager, ContainerState, Platform};
use crate::engine::{short_id, Engine};
use crate::error::{PwnboxError, Result};
use crate::image::{ImageResolver, ImageStatus};
use crate::output::{OutputSink, Tone};
use crate::progress::{self, PullSummary};

const SSH_PROGRAM: &str = "ssh";

/// Per-invocation switches taken from the command line
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Compare the local image against the registry during `up`
    pub check_updates: bool,
    /// Replace the process with `ssh` once the port answers
    pub ssh: bool,
    pub wait: WaitPolicy,
    pub ssh_host: String,
    pub ssh_port: u16,
    pub platform: Platform,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            check_updates: true,
            ssh: true,
            wait: WaitPolicy::from_timeout(10),
            ssh_host: SSH_HOST.to_string(),
            ssh_port: SSH_PORT,
            platform: Platform::current(),
        }
    }
}

/// Everything a command needs besides the settings
pub struct Session<'a> {
    engine: &'a dyn Engine,
    sink: &'a dyn OutputSink,
    handoff: &'a dyn Handoff,
    options: RunOptions,
}

impl<'a> Session<'a> {
    pub fn new(
        engine: &'a dyn Engine,
        sink: &'a dyn OutputSink,
        handoff: &'a dyn Handoff,
        options: RunOptions,
    ) -> Self {
        Self {
            engine,
            sink,
            handoff,
            options,
        }
    }

    fn manager(&self) -> ContainerManager<'a> {
        ContainerManager::new(self.engine, self.options.platform)
    }

    /// Bring the container up and log in.
    ///
    /// An existing running container goes straight to the connectivity wait.
    pub async fn up(&self, settings: &Settings) -> Result<()> {
        let manager = self.manager();
        let name = &settings.container.name;

        match manager.state(name).await? {
            ContainerState::Running(info) => {
                self.sink
                    .line(Tone::Info, "PwnBox container already running! Logging in...");
                self.sink
                    .verbose(&format!("Container ID: {}", info.short_id()));
            }
            ContainerState::Stopped(info) => {
                self.sink
                    .line(Tone::Info, "Starting stopped PwnBox container...");
                manager
                    .resume(name, settings.container.x11_forwarding)
                    .await?;
                self.sink
                    .verbose(&format!("Container ID: {}", info.short_id()));
            }
            ContainerState::Absent => {
                // validate ports before any download
                let spec = manager.spec(settings)?;
                self.prepare_image(&settings.image).await?;

                if settings.container.x11_forwarding {
                    self.sink.line(Tone::Info, "X11 remote access enabled.");
                }
                let id = manager
                    .launch(&spec, settings.container.x11_forwarding)
                    .await?;
                self.sink.verbose(&format!(
                    "Container has been launched with ID: {}",
                    short_id(&id)
                ));
                self.sink.line(Tone::Success, "PwnBox launched successfully!");
            }
        }

        self.connect().await
    }

    /// Stop and remove the container
    pub async fn down(&self, settings: &Settings) -> Result<()> {
        self.sink.line(Tone::Info, "Stopping PwnBox container...");
        let info = self.manager().down(settings).await?;
        if settings.container.x11_forwarding {
            self.sink.line(Tone::Success, "Disabled X11 remote access.");
        }
        self.sink.verbose(&format!(
            "Brought down container with ID: {}",
            info.short_id()
        ));
        self.sink
            .line(Tone::Success, "PwnBox container successfully stopped!");
        Ok(())
    }

    /// Download the image unless the local copy already matches the registry.
    ///
    /// Registry failures are fatal here since the check was asked for.
    pub async fn pull(&self, settings: &Settings) -> Result<()> {
        let image = &settings.image;
        let reference = image.reference();
        self.sink.line(Tone::Info, "Checking for local PwnBox image...");

        self.sink.status("Checking for newer PwnBox images...");
        let status = ImageResolver::new(self.engine)
            .resolve(&reference, true)
            .await;
        self.sink.clear_status();

        match status? {
            ImageStatus::UpToDate => {
                self.sink
                    .line(Tone::Success, "Already updated to latest version!");
                return Ok(());
            }
            ImageStatus::PullRequired => self.sink.line(
                Tone::Warning,
                "PwnBox image not found locally, pulling image...",
            ),
            ImageStatus::UpdateAvailable { .. } | ImageStatus::Unverified => self
                .sink
                .line(Tone::Info, "A newer version of PwnBox has been found!"),
        }

        self.pull_image(image).await?;
        self.sink
            .line(Tone::Success, "PwnBox image pulled/updated successfully!");
        Ok(())
    }

    /// Make sure the image exists locally before a launch
    async fn prepare_image(&self, image: &ImageSettings) -> Result<()> {
        let reference = image.reference();
        self.sink
            .line(Tone::Highlight, &format!("Image {} selected...", reference));

        let check = self.options.check_updates;
        if check {
            self.sink.status("Checking for newer PwnBox images...");
        }
        let status = ImageResolver::new(self.engine)
            .resolve(&reference, check)
            .await;
        self.sink.clear_status();

        match status {
            Ok(ImageStatus::PullRequired) => {
                self.sink.line(
                    Tone::Warning,
                    "PwnBox image not found locally, pulling image...",
                );
                self.pull_image(image).await?;
                self.sink
                    .line(Tone::Success, "PwnBox image downloaded successfully!");
            }
            Ok(ImageStatus::UpdateAvailable { local, remote }) => {
                debug!(?local, remote = %remote, "Local image is stale");
                self.sink
                    .line(Tone::Info, "Image already downloaded, continuing...");
                self.sink.line(
                    Tone::Warning,
                    "A newer version of the PwnBox container is available! Run \"pwnbox pull\" to update.",
                );
            }
            Ok(ImageStatus::UpToDate | ImageStatus::Unverified) => {
                self.sink
                    .line(Tone::Info, "Image already downloaded, continuing...");
            }
            Err(PwnboxError::RegistryUnreachable(reason)) => {
                self.sink
                    .line(Tone::Info, "Image already downloaded, continuing...");
                self.sink.line(
                    Tone::Warning,
                    &format!("Could not check for newer PwnBox images: {}", reason),
                );
            }
            Err(e) => return Err(e),
        }
        Ok(())
    }

    async fn pull_image(&self, image: &ImageSettings) -> Result<PullSummary> {
        let stream = self
            .engine
            .pull_image(&image.repository_path(), &image.tag);
        let summary = progress::consume(stream, self.sink).await?;
        debug!(?summary, "Pull finished");
        self.sink.verbose(&format!(
            "Pulled {} layers ({} completed)",
            summary.layers, summary.completed
        ));
        Ok(summary)
    }

    /// Wait for the SSH port, then hand the terminal to `ssh`
    async fn connect(&self) -> Result<()> {
        let host = &self.options.ssh_host;
        let port = self.options.ssh_port;

        self.sink.status("Waiting for SSH to be available...");
        let waited = connect::wait_for_port(host, port, self.options.wait).await;
        self.sink.clear_status();
        let attempts = waited?;
        self.sink
            .verbose(&format!("SSH answered after {} attempt(s)", attempts));

        if !self.options.ssh {
            self.sink.line(Tone::Success, "PwnBox launched successfully!");
            return Ok(());
        }
        self.sink.line(Tone::Success, "SSH available! Logging in...");
        self.handoff
            .hand_off(SSH_PROGRAM, &connect::ssh_args(host, port))
    }
}

/// Write the default config template to `path`
pub fn generate(path: &Path, sink: &dyn OutputSink) -> Result<()> {
    config::generate(path)?;
    sink.line(
        Tone::Success,
        &format!("Generated a default config file at \"{}\"!", path.display()),
    );
    Ok(())
}
