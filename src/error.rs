//! Error types for PwnBox

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PwnboxError {
    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("\"{}\" does not exist!", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("\"{}\" already exists!", .0.display())]
    ConfigExists(PathBuf),

    #[error("Could not connect to Docker. Check if you have Docker installed and running. ({0})")]
    EngineUnavailable(String),

    #[error("Image not found locally: {0}")]
    ImageNotFound(String),

    #[error("Could not reach the image registry: {0}")]
    RegistryUnreachable(String),

    #[error("Invalid port mapping \"{0}\"")]
    InvalidPortMapping(String),

    #[error("Container API error: {0}")]
    ContainerApiError(String),

    #[error("PwnBox container \"{0}\" not running")]
    NotRunning(String),

    #[error("Timeout waiting for SSH to be available on {host}:{port} after {attempts} attempts")]
    ConnectivityTimeout {
        host: String,
        port: u16,
        attempts: u64,
    },

    #[error("Size is not valid")]
    InvalidSize,

    #[error("Could not hand off to {program}: {reason}")]
    HandoffError { program: String, reason: String },

    #[error("Version check failed: {0}")]
    UpdateCheckError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PwnboxError>;
