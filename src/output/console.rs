//! Terminal renderer: coloured `=>` lines and one progress bar per layer

use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use colored::{ColoredString, Colorize};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use super::{OutputSink, Tone};
use crate::progress::ProgressUpdate;

const BAR_TEMPLATE: &str = "{msg} {bar:40.blue/white} {percent:>3}%";
const SPINNER_TICK: Duration = Duration::from_millis(100);

pub const INTERRUPT_NOTICE: &str = "=> CTRL+C Received. Exiting...";

/// Acknowledge Ctrl-C on `out` (stdout, like every other status line)
pub fn write_interrupt_notice(out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "{}", INTERRUPT_NOTICE.red().bold())?;
    out.flush()
}

pub struct ConsoleSink {
    verbose: bool,
    multi: MultiProgress,
    bars: Mutex<HashMap<String, ProgressBar>>,
    spinner: Mutex<Option<ProgressBar>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn paint(tone: Tone, text: String) -> ColoredString {
    match tone {
        Tone::Info => text.blue(),
        Tone::Success => text.green(),
        Tone::Warning => text.yellow(),
        Tone::Error => text.red(),
        Tone::Detail => text.cyan(),
        Tone::Highlight => text.magenta(),
    }
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template(BAR_TEMPLATE).unwrap_or_else(|_| ProgressStyle::default_bar())
}

impl ConsoleSink {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            multi: MultiProgress::new(),
            bars: Mutex::new(HashMap::new()),
            spinner: Mutex::new(None),
        }
    }

    fn print(&self, tone: Tone, text: &str) {
        let message = paint(tone, format!("=> {}", text));
        // keep lines above any live bars
        self.multi.suspend(|| {
            if tone == Tone::Error {
                eprintln!("{}", message);
            } else {
                println!("{}", message);
            }
        });
    }
}

impl OutputSink for ConsoleSink {
    fn line(&self, tone: Tone, text: &str) {
        self.print(tone, text);
    }

    fn verbose(&self, text: &str) {
        if self.verbose {
            self.print(Tone::Detail, text);
        }
    }

    fn progress(&self, update: &ProgressUpdate) {
        let mut bars = lock(&self.bars);
        match update {
            ProgressUpdate::Added {
                layer,
                label,
                total,
            } => {
                let bar = self.multi.add(ProgressBar::new(*total));
                bar.set_style(bar_style());
                bar.set_message(label.dimmed().to_string());
                bars.insert(layer.clone(), bar);
            }
            ProgressUpdate::Resized { layer, total } => {
                if let Some(bar) = bars.get(layer) {
                    bar.set_length(*total);
                }
            }
            ProgressUpdate::Advanced {
                layer,
                label,
                delta,
            } => {
                if let Some(bar) = bars.get(layer) {
                    bar.inc(*delta);
                    bar.set_message(label.dimmed().to_string());
                }
            }
            ProgressUpdate::Completed { layer, label } => {
                if let Some(bar) = bars.get(layer) {
                    bar.finish_with_message(label.green().dimmed().to_string());
                }
            }
            ProgressUpdate::Status { layer, status } => {
                drop(bars);
                match layer {
                    Some(layer) => self.verbose(&format!("{}: {}", layer, status)),
                    None => self.verbose(status),
                }
            }
        }
    }

    fn progress_done(&self) {
        lock(&self.bars).clear();
    }

    fn status(&self, text: &str) {
        let spinner = self.multi.add(ProgressBar::new_spinner());
        spinner.set_message(paint(Tone::Detail, format!("=> {}", text)).to_string());
        spinner.enable_steady_tick(SPINNER_TICK);
        if let Some(previous) = lock(&self.spinner).replace(spinner) {
            previous.finish_and_clear();
        }
    }

    fn clear_status(&self) {
        if let Some(spinner) = lock(&self.spinner).take() {
            spinner.finish_and_clear();
        }
    }
}
