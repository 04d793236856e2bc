//! Unique identifiers for simulation entities

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier for a simulated task
///
/// Task ids are supplied by whoever creates the task and are never reused
/// within a task table. They double as the handle stored in MLFQ queues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TaskId(u32);

impl TaskId {
    /// Creates a task ID from its raw value
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw value
    pub const fn as_u32(&self) -> u32 {
        self.0
    }
}

impl From<u32> for TaskId {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for one simulation run
///
/// Stamped on the startup log line and on exported reports so a report can
/// be matched with its log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(Uuid);

impl RunId {
    /// Creates a new random run ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a run ID from a UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "run:{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_id_roundtrip_raw() {
        let id = TaskId::new(7);
        assert_eq!(id.as_u32(), 7);
        assert_eq!(TaskId::from(7), id);
    }

    #[test]
    fn test_task_id_ordering_follows_raw_value() {
        assert!(TaskId::new(1) < TaskId::new(2));
    }

    #[test]
    fn test_task_id_display() {
        assert_eq!(format!("{}", TaskId::new(42)), "42");
    }

    #[test]
    fn test_run_id_creation() {
        let id1 = RunId::new();
        let id2 = RunId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_run_id_from_uuid() {
        let uuid = Uuid::new_v4();
        let id = RunId::from_uuid(uuid);
        assert_eq!(id.as_uuid(), uuid);
    }

    #[test]
    fn test_run_id_display() {
        let display = format!("{}", RunId::new());
        assert!(display.starts_with("run:"));
    }

    #[test]
    fn test_task_id_serializes_as_number() {
        let json = serde_json::to_string(&TaskId::new(3)).unwrap();
        assert_eq!(json, "3");
    }
}
