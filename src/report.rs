use indicatif::{ProgressBar, ProgressStyle};
use std::fmt;

/// Severity attached to every engine log event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warning,
    Error,
    Success,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
            LogLevel::Success => "SUCCESS",
        };
        write!(f, "{name}")
    }
}

/// Sink for the engine's log events and progress ticks.
///
/// The engine calls `set_progress_max` once per run before iterating, then
/// `tick` exactly once per processed program or selection, success or
/// failure alike. No assumption is made about the calling thread; an
/// implementation that needs to marshal events elsewhere does so itself.
pub trait RunObserver {
    fn log(&mut self, message: &str, level: LogLevel);
    fn set_progress_max(&mut self, max: usize);
    fn tick(&mut self);
}

/// Observer that discards everything.
pub struct NullObserver;

impl RunObserver for NullObserver {
    fn log(&mut self, _message: &str, _level: LogLevel) {}
    fn set_progress_max(&mut self, _max: usize) {}
    fn tick(&mut self) {}
}

/// Records every event in memory.
///
/// Embedders that render the transcript themselves collect events through
/// this; it also backs the engine tests.
#[derive(Debug, Default)]
pub struct MemoryObserver {
    entries: Vec<(LogLevel, String)>,
    progress_max: Option<usize>,
    ticks: usize,
}

impl MemoryObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[(LogLevel, String)] {
        &self.entries
    }

    pub fn progress_max(&self) -> Option<usize> {
        self.progress_max
    }

    pub fn ticks(&self) -> usize {
        self.ticks
    }

    /// Any `Error`-level event marks the run as errored for summary
    /// purposes, independent of the returned result fields.
    pub fn has_errors(&self) -> bool {
        self.entries
            .iter()
            .any(|(level, _)| *level == LogLevel::Error)
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.entries
            .iter()
            .any(|(_, message)| message.contains(needle))
    }
}

impl RunObserver for MemoryObserver {
    fn log(&mut self, message: &str, level: LogLevel) {
        self.entries.push((level, message.to_string()));
    }

    fn set_progress_max(&mut self, max: usize) {
        self.progress_max = Some(max);
    }

    fn tick(&mut self) {
        self.ticks += 1;
    }
}

/// Console observer used by the CLI: prints log lines and drives a
/// progress bar across the run.
pub struct ConsoleObserver {
    bar: Option<ProgressBar>,
    quiet: bool,
    errored: bool,
}

impl ConsoleObserver {
    pub fn new(quiet: bool) -> Self {
        Self {
            bar: None,
            quiet,
            errored: false,
        }
    }

    /// Whether any `Error`-level event was seen.
    pub fn errored(&self) -> bool {
        self.errored
    }

    /// Remove the progress bar; call before printing the run summary.
    pub fn finish(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }

    fn print(&self, line: &str, to_stderr: bool) {
        if let Some(ref bar) = self.bar {
            bar.println(line);
        } else if to_stderr {
            eprintln!("{line}");
        } else {
            println!("{line}");
        }
    }
}

impl RunObserver for ConsoleObserver {
    fn log(&mut self, message: &str, level: LogLevel) {
        if level == LogLevel::Error {
            self.errored = true;
        }

        match level {
            LogLevel::Error => self.print(&format!("ERROR: {message}"), true),
            LogLevel::Warning => {
                if !self.quiet {
                    self.print(&format!("Warning: {message}"), true);
                }
            }
            LogLevel::Info | LogLevel::Success => {
                if !self.quiet {
                    self.print(message, false);
                }
            }
        }
    }

    fn set_progress_max(&mut self, max: usize) {
        if self.quiet {
            return;
        }

        let bar = ProgressBar::new(max as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{bar:40.green} {pos}/{len}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        self.bar = Some(bar);
    }

    fn tick(&mut self) {
        if let Some(ref bar) = self.bar {
            bar.inc(1);
        }
    }
}
