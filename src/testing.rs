//! In-memory collaborators for unit tests

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::config::Settings;
use crate::container::ContainerSpec;
use crate::connect::Handoff;
use crate::engine::{ContainerInfo, Engine, LocalImage, PullEvent, PullStream};
use crate::error::{PwnboxError, Result};
use crate::output::{OutputSink, Tone};
use crate::progress::ProgressUpdate;

pub const SAMPLE_CONFIG: &str = "\
[IMAGE]
DOCKER_REPOSITORY = registry.example.com
IMAGE_TAG = dev

[CONTAINER]
NAME = pwnbox
HOSTNAME = box
FORWARDED_PORT = 22:2222,8000-8001:9000-9001
EXTERNAL_VOLUME = /srv/external
SSH_VOLUME = /srv/ssh
AUTO_REMOVE = True
PRIVILEGED = no
HOST_NETWORKING = false
X11_FORWARDING = 1
DNS_SERVERS = 1.1.1.1, 8.8.8.8
";

pub fn sample_settings() -> Settings {
    Settings::parse(SAMPLE_CONFIG).expect("sample config is valid")
}

#[derive(Default)]
struct EngineState {
    containers: HashMap<String, ContainerInfo>,
    image: Option<LocalImage>,
    registry_digest: Option<String>,
    pull_events: Vec<PullEvent>,
    calls: Vec<String>,
    created: u32,
}

/// Scriptable [`Engine`] that records every call
#[derive(Default)]
pub struct FakeEngine {
    state: Mutex<EngineState>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_container(self, name: &str, running: bool) -> Self {
        self.state.lock().unwrap().containers.insert(
            name.to_string(),
            ContainerInfo {
                id: format!("{:0>64}", name),
                running,
            },
        );
        self
    }

    pub fn with_image(self, digest: &str) -> Self {
        self.state.lock().unwrap().image = Some(LocalImage {
            id: "sha256:local".to_string(),
            repo_digests: vec![format!("registry.example.com/deadpackets/pwnbox@{}", digest)],
        });
        self
    }

    pub fn with_registry_digest(self, digest: &str) -> Self {
        self.state.lock().unwrap().registry_digest = Some(digest.to_string());
        self
    }

    pub fn with_pull_events(self, events: Vec<PullEvent>) -> Self {
        self.state.lock().unwrap().pull_events = events;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    fn record(&self, call: String) -> std::sync::MutexGuard<'_, EngineState> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        state
    }
}

#[async_trait]
impl Engine for FakeEngine {
    async fn ping(&self) -> Result<()> {
        self.record("ping".to_string());
        Ok(())
    }

    async fn inspect_container(&self, name: &str) -> Result<Option<ContainerInfo>> {
        let state = self.record(format!("inspect {}", name));
        Ok(state.containers.get(name).cloned())
    }

    async fn create_container(&self, spec: &ContainerSpec) -> Result<String> {
        let mut state = self.record(format!("create {}", spec.name));
        if state.containers.contains_key(&spec.name) {
            return Err(PwnboxError::ContainerApiError("name already in use".to_string()));
        }
        state.created += 1;
        let id = format!("{:064x}", state.created);
        state.containers.insert(
            spec.name.clone(),
            ContainerInfo {
                id: id.clone(),
                running: true,
            },
        );
        Ok(id)
    }

    async fn start_container(&self, name: &str) -> Result<()> {
        let mut state = self.record(format!("start {}", name));
        match state.containers.get_mut(name) {
            Some(info) => {
                info.running = true;
                Ok(())
            }
            None => Err(PwnboxError::ContainerApiError("no such container".to_string())),
        }
    }

    async fn kill_container(&self, name: &str) -> Result<()> {
        let mut state = self.record(format!("kill {}", name));
        match state.containers.get_mut(name) {
            Some(info) => {
                info.running = false;
                Ok(())
            }
            None => Err(PwnboxError::NotRunning(name.to_string())),
        }
    }

    async fn remove_container(&self, name: &str) -> Result<()> {
        let mut state = self.record(format!("remove {}", name));
        state.containers.remove(name);
        Ok(())
    }

    async fn inspect_image(&self, reference: &str) -> Result<LocalImage> {
        let state = self.record(format!("inspect-image {}", reference));
        state
            .image
            .clone()
            .ok_or_else(|| PwnboxError::ImageNotFound(reference.to_string()))
    }

    async fn registry_digest(&self, reference: &str) -> Result<String> {
        let state = self.record(format!("registry-digest {}", reference));
        state
            .registry_digest
            .clone()
            .ok_or_else(|| PwnboxError::RegistryUnreachable("registry offline".to_string()))
    }

    fn pull_image<'a>(&'a self, repository: &str, tag: &str) -> PullStream<'a> {
        let state = self.record(format!("pull {}:{}", repository, tag));
        let events: Vec<Result<PullEvent>> = state.pull_events.iter().cloned().map(Ok).collect();
        Box::pin(futures_util::stream::iter(events))
    }
}

/// [`OutputSink`] that keeps everything it is given
#[derive(Default)]
pub struct RecordingSink {
    lines: Mutex<Vec<(Tone, String)>>,
    updates: Mutex<Vec<ProgressUpdate>>,
}

impl RecordingSink {
    pub fn lines(&self) -> Vec<(Tone, String)> {
        self.lines.lock().unwrap().clone()
    }

    pub fn updates(&self) -> Vec<ProgressUpdate> {
        self.updates.lock().unwrap().clone()
    }

    pub fn has_line(&self, tone: Tone, needle: &str) -> bool {
        self.lines()
            .iter()
            .any(|(t, text)| *t == tone && text.contains(needle))
    }
}

impl OutputSink for RecordingSink {
    fn line(&self, tone: Tone, text: &str) {
        self.lines.lock().unwrap().push((tone, text.to_string()));
    }

    fn verbose(&self, text: &str) {
        self.line(Tone::Detail, text);
    }

    fn progress(&self, update: &ProgressUpdate) {
        self.updates.lock().unwrap().push(update.clone());
    }
}

/// [`Handoff`] that records the command instead of running it
#[derive(Default)]
pub struct RecordingHandoff {
    calls: Mutex<Vec<(String, Vec<String>)>>,
}

impl RecordingHandoff {
    pub fn calls(&self) -> Vec<(String, Vec<String>)> {
        self.calls.lock().unwrap().clone()
    }
}

impl Handoff for RecordingHandoff {
    fn hand_off(&self, program: &str, args: &[String]) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push((program.to_string(), args.to_vec()));
        Ok(())
    }
}
