//! Auditable event trail for synchronization passes.
//!
//! Every event is appended to the log file as
//! `YYYY-MM-DD HH:MM:SS - <message>` and, when echoing is on, printed to
//! stdout unchanged. Logging never fails from the synchronizer's point of
//! view: persistence problems are reported through the `log` facade and
//! dropped.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;

/// Timestamp layout of one event line.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Sink for synchronization events.
pub trait EventLogger {
    /// Record one event. Implementations must not panic or propagate errors.
    fn log(&mut self, message: &str);
}

impl<L: EventLogger + ?Sized> EventLogger for &mut L {
    fn log(&mut self, message: &str) {
        (**self).log(message);
    }
}

impl<L: EventLogger + ?Sized> EventLogger for Box<L> {
    fn log(&mut self, message: &str) {
        (**self).log(message);
    }
}

/// Format `message` as a timestamped event line (no trailing newline).
pub fn format_line(message: &str) -> String {
    format!("{} - {}", Local::now().format(TIMESTAMP_FORMAT), message)
}

// ---------------------------------------------------------------------------
// File + console
// ---------------------------------------------------------------------------

/// Appends events to a log file and optionally echoes them to stdout.
#[derive(Debug, Clone)]
pub struct FileEventLog {
    path: PathBuf,
    echo: bool,
}

impl FileEventLog {
    pub fn new(path: impl Into<PathBuf>, echo: bool) -> Self {
        Self {
            path: path.into(),
            echo,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, line: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{line}")
    }
}

impl EventLogger for FileEventLog {
    fn log(&mut self, message: &str) {
        let line = format_line(message);
        tracing::debug!("{message}");
        if let Err(err) = self.append(&line) {
            tracing::warn!("event log {} not writable: {err}", self.path.display());
        }
        if self.echo {
            println!("{line}");
        }
    }
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

/// Keeps events in memory, in emission order, without timestamps.
#[derive(Debug, Clone, Default)]
pub struct MemoryEventLog {
    messages: Vec<String>,
}

impl MemoryEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Drain recorded messages, leaving the log empty.
    pub fn take(&mut self) -> Vec<String> {
        std::mem::take(&mut self.messages)
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl EventLogger for MemoryEventLog {
    fn log(&mut self, message: &str) {
        tracing::debug!("{message}");
        self.messages.push(message.to_string());
    }
}
