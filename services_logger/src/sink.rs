//! Event sink trait and backends.
//!
//! Both simulator actors hold an `Arc<dyn EventSink>` and emit entries as
//! events happen. Sinks must be `Send + Sync`; backends that own a writer
//! wrap it in a mutex.

use crate::{LogEntry, LogLevel};
use parking_lot::Mutex;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Event log errors
#[derive(Debug, Error)]
pub enum EventLogError {
    #[error("Failed to open log file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Sink for event log entries.
pub trait EventSink: Send + Sync + fmt::Debug {
    /// Emit a single entry.
    ///
    /// Implementations should not panic. Write failures after startup are
    /// swallowed; the simulation does not depend on the log.
    fn emit(&self, entry: &LogEntry);
}

// ---------------------------------------------------------------------------
// NullSink
// ---------------------------------------------------------------------------

/// No-op sink. All entries are discarded.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _entry: &LogEntry) {}
}

// ---------------------------------------------------------------------------
// FileSink
// ---------------------------------------------------------------------------

/// File-backed sink writing one `[timestamp] message` line per entry.
///
/// The file is truncated on open. Every line is flushed immediately so the
/// log survives an aborted run.
pub struct FileSink {
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
    echo: bool,
    min_level: LogLevel,
}

impl fmt::Debug for FileSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileSink")
            .field("path", &self.path)
            .field("echo", &self.echo)
            .field("min_level", &self.min_level)
            .finish()
    }
}

impl FileSink {
    /// Opens (and truncates) the log file at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self, EventLogError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .map_err(|source| EventLogError::Open {
                path: path.clone(),
                source,
            })?;

        Ok(Self {
            path,
            writer: Mutex::new(BufWriter::new(file)),
            echo: false,
            min_level: LogLevel::Info,
        })
    }

    /// Also print every line to stdout
    pub fn with_console_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    /// Drops entries below `level`
    pub fn with_min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    /// Path of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EventSink for FileSink {
    fn emit(&self, entry: &LogEntry) {
        if entry.level < self.min_level {
            return;
        }
        let line = entry.render_line();
        {
            let mut writer = self.writer.lock();
            // Best effort after startup.
            let _ = writeln!(writer, "{}", line).and_then(|_| writer.flush());
        }
        if self.echo {
            println!("{}", line);
        }
    }
}

// ---------------------------------------------------------------------------
// CollectorSink (testing)
// ---------------------------------------------------------------------------

/// In-memory collector for testing.
#[derive(Debug, Default)]
pub struct CollectorSink {
    entries: Mutex<Vec<LogEntry>>,
}

impl CollectorSink {
    /// Creates an empty collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all collected entries
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().clone()
    }

    /// Returns all collected messages in emission order
    pub fn messages(&self) -> Vec<String> {
        self.entries
            .lock()
            .iter()
            .map(|e| e.message.clone())
            .collect()
    }

    /// Counts messages containing `needle`
    pub fn count_containing(&self, needle: &str) -> usize {
        self.entries
            .lock()
            .iter()
            .filter(|e| e.message.contains(needle))
            .count()
    }

    /// Number of collected entries
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns true if nothing has been collected
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventSink for CollectorSink {
    fn emit(&self, entry: &LogEntry) {
        self.entries.lock().push(entry.clone());
    }
}
