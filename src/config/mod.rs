//! Configuration for the PwnBox container
//!
//! The config file is a small INI-style document with an `[IMAGE]` and a
//! `[CONTAINER]` section. It is parsed once per invocation and validated into
//! a typed [`Settings`] value; every problem found is reported in one error.

pub mod expand;
pub mod parser;

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{PwnboxError, Result};
pub use expand::expand_vars;
pub use parser::{parse_document, Document};

/// Default template written by `generate` and on first run
pub const TEMPLATE: &str = include_str!("../../templates/pwnbox.conf");

/// Default config location, before variable expansion
pub const DEFAULT_CONFIG_PATH: &str = "$HOME/.pwnbox/pwnbox.conf";

/// Image name under the configured registry
pub const IMAGE_NAME: &str = "deadpackets/pwnbox";

const IMAGE_SECTION: &str = "IMAGE";
const CONTAINER_SECTION: &str = "CONTAINER";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageSettings {
    pub repository: String,
    pub tag: String,
}

impl ImageSettings {
    /// Repository path without the tag, as used by the pull API
    pub fn repository_path(&self) -> String {
        format!("{}/{}", self.repository, IMAGE_NAME)
    }

    /// Full `repository/name:tag` reference
    pub fn reference(&self) -> String {
        format!("{}:{}", self.repository_path(), self.tag)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContainerSettings {
    pub name: String,
    pub hostname: String,
    /// Raw `container:host` port forwarding spec
    pub forwarded_ports: String,
    pub external_volume: PathBuf,
    pub ssh_volume: PathBuf,
    pub auto_remove: bool,
    pub privileged: bool,
    pub host_networking: bool,
    pub x11_forwarding: bool,
    pub dns_servers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settings {
    pub image: ImageSettings,
    pub container: ContainerSettings,
}

impl Settings {
    /// Parse and validate config file content
    pub fn parse(content: &str) -> Result<Self> {
        let doc = parse_document(content)?;
        Self::from_document(&doc)
    }

    /// Validate a parsed document, collecting every violation
    pub fn from_document(doc: &Document) -> Result<Self> {
        let mut fields = Fields::new(doc);

        for section in [IMAGE_SECTION, CONTAINER_SECTION] {
            if !doc.has_section(section) {
                fields.violation(format!("missing section [{}]", section));
            }
        }

        let image = ImageSettings {
            repository: fields.text(IMAGE_SECTION, "DOCKER_REPOSITORY"),
            tag: fields.text(IMAGE_SECTION, "IMAGE_TAG"),
        };

        let container = ContainerSettings {
            name: fields.text(CONTAINER_SECTION, "NAME"),
            hostname: fields.text(CONTAINER_SECTION, "HOSTNAME"),
            forwarded_ports: fields.text(CONTAINER_SECTION, "FORWARDED_PORT"),
            external_volume: fields.path(CONTAINER_SECTION, "EXTERNAL_VOLUME"),
            ssh_volume: fields.path(CONTAINER_SECTION, "SSH_VOLUME"),
            auto_remove: fields.flag(CONTAINER_SECTION, "AUTO_REMOVE"),
            privileged: fields.flag(CONTAINER_SECTION, "PRIVILEGED"),
            host_networking: fields.flag(CONTAINER_SECTION, "HOST_NETWORKING"),
            x11_forwarding: fields.flag(CONTAINER_SECTION, "X11_FORWARDING"),
            dns_servers: fields
                .text(CONTAINER_SECTION, "DNS_SERVERS")
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        };

        fields.finish()?;
        Ok(Self { image, container })
    }
}

/// Accumulates validation errors while reading typed fields
struct Fields<'a> {
    doc: &'a Document,
    violations: Vec<String>,
}

impl<'a> Fields<'a> {
    fn new(doc: &'a Document) -> Self {
        Self {
            doc,
            violations: Vec::new(),
        }
    }

    fn violation(&mut self, message: String) {
        self.violations.push(message);
    }

    fn text(&mut self, section: &str, key: &str) -> String {
        match self.doc.get(section, key) {
            Some(value) if !value.is_empty() => value.to_string(),
            Some(_) => {
                self.violation(format!("{}.{} is empty", section, key));
                String::new()
            }
            None => {
                if self.doc.has_section(section) {
                    self.violation(format!("{}.{} is missing", section, key));
                }
                String::new()
            }
        }
    }

    fn path(&mut self, section: &str, key: &str) -> PathBuf {
        let raw = self.text(section, key);
        PathBuf::from(expand_vars(&raw).into_owned())
    }

    fn flag(&mut self, section: &str, key: &str) -> bool {
        let raw = self.text(section, key);
        if raw.is_empty() {
            return false;
        }
        match parse_bool(&raw) {
            Some(value) => value,
            None => {
                self.violation(format!(
                    "{}.{} must be a boolean, got \"{}\"",
                    section, key, raw
                ));
                false
            }
        }
    }

    fn finish(self) -> Result<()> {
        if self.violations.is_empty() {
            return Ok(());
        }
        Err(PwnboxError::ConfigError(format!(
            "invalid configuration:\n  - {}",
            self.violations.join("\n  - ")
        )))
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

/// Expand variables in a user-supplied config path
pub fn resolve_path(raw: &str) -> PathBuf {
    PathBuf::from(expand_vars(raw).into_owned())
}

/// Read and validate the config file at `path`
pub fn load(path: &Path) -> Result<Settings> {
    let content = fs::read_to_string(path).map_err(|e| {
        PwnboxError::ConfigError(format!("cannot read {}: {}", path.display(), e))
    })?;
    Settings::parse(&content)
}

/// Make sure a config file exists for `raw_path`.
///
/// The default location gets the bundled template on first run; any other
/// missing path is an error. Returns the expanded path and whether the
/// template was written.
pub fn ensure_exists(raw_path: &str) -> Result<(PathBuf, bool)> {
    ensure_exists_with(raw_path, &resolve_path(DEFAULT_CONFIG_PATH))
}

/// [`ensure_exists`] against an already expanded default location
fn ensure_exists_with(raw_path: &str, default_path: &Path) -> Result<(PathBuf, bool)> {
    let path = resolve_path(raw_path);
    if path.is_file() {
        return Ok((path, false));
    }
    if path == default_path {
        write_template(&path)?;
        return Ok((path, true));
    }
    Err(PwnboxError::ConfigNotFound(path))
}

/// Write the bundled template to `path`, refusing to overwrite
pub fn generate(path: &Path) -> Result<()> {
    if path.exists() {
        return Err(PwnboxError::ConfigExists(path.to_path_buf()));
    }
    write_template(path)
}

fn write_template(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, TEMPLATE)?;
    Ok(())
}
