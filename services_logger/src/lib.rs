//! # Logger Service
//!
//! This crate implements the simulator's event log.
//!
//! ## Philosophy
//!
//! Logging is explicit and structured: every event is a [`LogEntry`] with a
//! level, an optional source task and key/value fields. Rendering to a
//! human-readable line happens only at the sink boundary.
//!
//! ## Sinks
//!
//! - [`FileSink`]: Appends timestamped lines to a file, optionally echoing
//!   them to stdout.
//! - [`CollectorSink`]: In-memory collection for tests.
//! - [`NullSink`]: Discards everything.

pub mod sink;
pub mod timestamp;

pub use sink::{CollectorSink, EventLogError, EventSink, FileSink, NullSink};

use core_types::TaskId;
use std::time::SystemTime;

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Debug information
    Debug,
    /// Informational messages
    Info,
    /// Warnings
    Warn,
    /// Errors
    Error,
}

/// A structured log entry
#[derive(Debug, Clone)]
pub struct LogEntry {
    /// Log level
    pub level: LogLevel,
    /// Wall-clock time the entry was created
    pub timestamp: SystemTime,
    /// Source task (if known)
    pub source: Option<TaskId>,
    /// Log message
    pub message: String,
    /// Structured fields
    pub fields: Vec<(String, String)>,
}

impl LogEntry {
    /// Creates a new log entry stamped with the current time
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            timestamp: SystemTime::now(),
            source: None,
            message: message.into(),
            fields: Vec::new(),
        }
    }

    /// Shorthand for an `Info` entry
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Info, message)
    }

    /// Shorthand for a `Warn` entry
    pub fn warn(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Warn, message)
    }

    /// Sets the source task
    pub fn with_source(mut self, source: TaskId) -> Self {
        self.source = Some(source);
        self
    }

    /// Adds a field to the log entry
    pub fn with_field(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.fields.push((key.into(), value.to_string()));
        self
    }

    /// Looks up a field by key
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Renders the entry as one log line: `[timestamp] message`
    pub fn render_line(&self) -> String {
        format!("[{}] {}", timestamp::format_utc(self.timestamp), self.message)
    }
}
