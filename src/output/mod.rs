//! User-facing output
//!
//! Commands never print directly. They talk to an [`OutputSink`], which the
//! binary backs with a terminal renderer and tests back with a recorder.

pub mod banner;
pub mod console;

use crate::progress::ProgressUpdate;

pub use console::{write_interrupt_notice, ConsoleSink};

/// Colour/intent of a status line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Info,
    Success,
    Warning,
    Error,
    /// Secondary information such as config notes
    Detail,
    /// Names the image or container being acted on
    Highlight,
}

pub trait OutputSink: Send + Sync {
    /// Write one status line
    fn line(&self, tone: Tone, text: &str);

    /// Write a line only shown in verbose mode
    fn verbose(&self, text: &str);

    /// Render a pull progress update
    fn progress(&self, update: &ProgressUpdate);

    /// The pull stream ended
    fn progress_done(&self) {}

    /// Show a transient "working" indicator until [`OutputSink::clear_status`]
    fn status(&self, _text: &str) {}

    fn clear_status(&self) {}
}
