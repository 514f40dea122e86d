//! PwnBox - a personal, pre-configured sandbox in a Docker container
//!
//! The library holds everything the `pwnbox` binary does: config loading,
//! image resolution, pull progress, container lifecycle and the SSH wait.
//! Commands are driven through the [`Engine`] and [`output::OutputSink`]
//! traits so they can run against in-memory fakes.
//!
//! # Example
//!
//! ```no_run
//! use pwnbox::{config, Session, RunOptions, DockerEngine, ConsoleSink, ExecHandoff};
//!
//! # async fn demo() -> pwnbox::Result<()> {
//! let settings = config::load(&config::resolve_path("$HOME/.pwnbox/pwnbox.conf"))?;
//! let engine = DockerEngine::connect()?;
//! let sink = ConsoleSink::new(false);
//! Session::new(&engine, &sink, &ExecHandoff, RunOptions::default())
//!     .up(&settings)
//!     .await
//! # }
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod connect;
pub mod container;
pub mod engine;
pub mod error;
pub mod image;
pub mod output;
pub mod progress;
pub mod update;

#[cfg(test)]
pub(crate) mod testing;

pub use commands::{RunOptions, Session};
pub use config::Settings;
pub use connect::{ExecHandoff, Handoff, WaitPolicy};
pub use container::{ContainerManager, ContainerSpec, Platform};
pub use engine::{DockerEngine, Engine};
pub use error::{PwnboxError, Result};
pub use image::{ImageResolver, ImageStatus};
pub use output::{ConsoleSink, OutputSink, Tone};
pub use progress::{format_size, ProgressAggregator, ProgressUpdate, PullSummary};
