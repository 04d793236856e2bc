//! End-of-run report
//!
//! Built from the final task table once both actors have stopped. Tasks that
//! never finished are reported as `Incomplete` with no turnaround.

use crate::context::SchedContext;
use crate::task::Task;
use core_types::{RunId, SchedulingPolicy, TaskId, TaskState};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TaskStatus {
    Finished,
    Incomplete,
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Finished => write!(f, "Finished"),
            TaskStatus::Incomplete => write!(f, "Incomplete"),
        }
    }
}

/// One row of the summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskReport {
    pub id: TaskId,
    pub priority: u32,
    pub duration_ms: u64,
    /// Whole seconds from arrival to finish
    pub turnaround_secs: Option<u64>,
    pub turnaround_ms: Option<u64>,
    pub status: TaskStatus,
}

impl TaskReport {
    pub fn from_task(task: &Task) -> Self {
        let turnaround = task.turnaround();
        let status = if task.state() == TaskState::Finished {
            TaskStatus::Finished
        } else {
            TaskStatus::Incomplete
        };
        Self {
            id: task.id(),
            priority: task.priority(),
            duration_ms: task.duration_ms(),
            turnaround_secs: turnaround.map(|d| d.as_secs()),
            turnaround_ms: turnaround.map(|d| d.as_millis() as u64),
            status,
        }
    }
}

/// Whole-run summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub run_id: RunId,
    pub policy: SchedulingPolicy,
    pub seed: u64,
    pub tasks: Vec<TaskReport>,
    /// Slices handed out by the scheduler
    pub dispatches: u64,
    /// Blocked tasks returned to Ready by the unblocker
    pub wakeups: u64,
}

impl RunReport {
    /// Reads the task table in creation order
    pub fn collect(ctx: &SchedContext, run_id: RunId, seed: u64) -> Self {
        let guard = ctx.lock();
        let tasks = guard.table().iter().map(TaskReport::from_task).collect();
        Self {
            run_id,
            policy: guard.policy().policy(),
            seed,
            tasks,
            dispatches: 0,
            wakeups: 0,
        }
    }

    pub fn with_counters(mut self, dispatches: u64, wakeups: u64) -> Self {
        self.dispatches = dispatches;
        self.wakeups = wakeups;
        self
    }

    pub fn finished_count(&self) -> usize {
        self.tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Finished)
            .count()
    }

    pub fn all_finished(&self) -> bool {
        self.finished_count() == self.tasks.len()
    }

    /// Mean turnaround over finished tasks
    pub fn mean_turnaround_ms(&self) -> Option<u64> {
        let finished: Vec<u64> = self.tasks.iter().filter_map(|t| t.turnaround_ms).collect();
        if finished.is_empty() {
            return None;
        }
        Some(finished.iter().sum::<u64>() / finished.len() as u64)
    }
}
