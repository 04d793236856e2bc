//! Task lifecycle states

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a simulated task
///
/// ```text
/// Ready -> Running -> Finished
///   ^         |
///   |         +----> Blocked
///   +---------+         |
///   +-------------------+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskState {
    /// Waiting to be dispatched
    Ready,
    /// Owned by the scheduler for the current slice
    Running,
    /// Waiting on simulated I/O
    Blocked,
    /// Terminal
    Finished,
}

impl TaskState {
    /// Returns true if `self -> next` is a legal lifecycle transition
    pub fn can_transition_to(self, next: TaskState) -> bool {
        matches!(
            (self, next),
            (TaskState::Ready, TaskState::Running)
                | (TaskState::Running, TaskState::Finished)
                | (TaskState::Running, TaskState::Blocked)
                | (TaskState::Running, TaskState::Ready)
                | (TaskState::Blocked, TaskState::Ready)
        )
    }

    /// Returns true for the terminal state
    pub fn is_terminal(self) -> bool {
        self == TaskState::Finished
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskState::Ready => write!(f, "Ready"),
            TaskState::Running => write!(f, "Running"),
            TaskState::Blocked => write!(f, "Blocked"),
            TaskState::Finished => write!(f, "Finished"),
        }
    }
}
