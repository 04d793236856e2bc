//! Simulated tasks and the task table
//!
//! The table is the single source of truth for scheduling decisions. It is
//! filled during setup and afterwards only mutated through the scheduler and
//! the unblocker, both of which hold the context lock while doing so.

use core_types::{TaskId, TaskState};
use serde::Serialize;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Task table errors
///
/// All of these are soft: the request is dropped and the caller proceeds.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskTableError {
    #[error("Maximum task limit reached ({capacity})")]
    CapacityExceeded { capacity: usize },

    #[error("Task {0} already exists")]
    DuplicateId(TaskId),

    #[error("Task {0} has zero duration")]
    ZeroDuration(TaskId),
}

/// Illegal state transition
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Task {task_id}: illegal transition {from} -> {to}")]
pub struct TransitionError {
    pub task_id: TaskId,
    pub from: TaskState,
    pub to: TaskState,
}

/// One simulated unit of work
#[derive(Debug, Clone)]
pub struct Task {
    id: TaskId,
    duration_ms: u64,
    priority: u32,
    arrival: Instant,
    remaining_ms: u64,
    state: TaskState,
    finish: Option<Instant>,
    queue_level: usize,
}

impl Task {
    fn new(id: TaskId, duration_ms: u64, priority: u32) -> Self {
        Self {
            id,
            duration_ms,
            priority,
            arrival: Instant::now(),
            remaining_ms: duration_ms,
            state: TaskState::Ready,
            finish: None,
            queue_level: 0,
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    /// Lower value = higher priority
    pub fn priority(&self) -> u32 {
        self.priority
    }

    pub fn arrival(&self) -> Instant {
        self.arrival
    }

    pub fn remaining_ms(&self) -> u64 {
        self.remaining_ms
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    pub fn finish(&self) -> Option<Instant> {
        self.finish
    }

    /// Current MLFQ level (0 = highest)
    pub fn queue_level(&self) -> usize {
        self.queue_level
    }

    pub fn is_ready(&self) -> bool {
        self.state == TaskState::Ready
    }

    /// Time from arrival to completion, once finished
    pub fn turnaround(&self) -> Option<Duration> {
        self.finish.map(|f| f.saturating_duration_since(self.arrival))
    }

    pub(crate) fn set_queue_level(&mut self, level: usize) {
        self.queue_level = level;
    }

    fn transition(&mut self, to: TaskState) -> Result<(), TransitionError> {
        if !self.state.can_transition_to(to) {
            return Err(TransitionError {
                task_id: self.id,
                from: self.state,
                to,
            });
        }
        self.state = to;
        Ok(())
    }

    /// Ready -> Running
    pub(crate) fn start(&mut self) -> Result<(), TransitionError> {
        self.transition(TaskState::Running)
    }

    /// Charges one slice and applies the terminal transition if it was the
    /// last one. Returns true if the task finished.
    ///
    /// Must be followed, in the same critical section, by `block` or
    /// `yield_ready` when the task did not finish.
    pub(crate) fn charge_slice(
        &mut self,
        slice_ms: u64,
        now: Instant,
    ) -> Result<bool, TransitionError> {
        debug_assert_eq!(self.state, TaskState::Running);
        self.remaining_ms = self.remaining_ms.saturating_sub(slice_ms);
        if self.remaining_ms == 0 {
            self.transition(TaskState::Finished)?;
            self.finish = Some(now.max(self.arrival));
            return Ok(true);
        }
        Ok(false)
    }

    /// Running -> Blocked
    pub(crate) fn block(&mut self) -> Result<(), TransitionError> {
        self.transition(TaskState::Blocked)
    }

    /// Running -> Ready
    pub(crate) fn yield_ready(&mut self) -> Result<(), TransitionError> {
        self.transition(TaskState::Ready)
    }

    /// Blocked -> Ready
    pub(crate) fn wake(&mut self) -> Result<(), TransitionError> {
        if self.state != TaskState::Blocked {
            return Err(TransitionError {
                task_id: self.id,
                from: self.state,
                to: TaskState::Ready,
            });
        }
        self.transition(TaskState::Ready)
    }

    /// Checks the per-task invariants; returns a description of the first
    /// violation.
    pub fn check_invariants(&self) -> Result<(), String> {
        if self.remaining_ms > self.duration_ms {
            return Err(format!(
                "task {}: remaining {}ms exceeds duration {}ms",
                self.id, self.remaining_ms, self.duration_ms
            ));
        }
        let finished = self.state == TaskState::Finished;
        if finished != (self.remaining_ms == 0) {
            return Err(format!(
                "task {}: state {} with {}ms remaining",
                self.id, self.state, self.remaining_ms
            ));
        }
        if finished != self.finish.is_some() {
            return Err(format!(
                "task {}: state {} with finish time {:?}",
                self.id, self.state, self.finish
            ));
        }
        if let Some(finish) = self.finish {
            if finish < self.arrival {
                return Err(format!("task {}: finished before arrival", self.id));
            }
        }
        Ok(())
    }

    /// Point-in-time copy for reporting and assertions
    pub fn snapshot(&self) -> TaskSnapshot {
        TaskSnapshot {
            id: self.id,
            priority: self.priority,
            duration_ms: self.duration_ms,
            remaining_ms: self.remaining_ms,
            state: self.state,
            queue_level: self.queue_level,
            turnaround_ms: self.turnaround().map(|d| d.as_millis() as u64),
        }
    }
}

/// Copy of a task's observable fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskSnapshot {
    pub id: TaskId,
    pub priority: u32,
    pub duration_ms: u64,
    pub remaining_ms: u64,
    pub state: TaskState,
    pub queue_level: usize,
    pub turnaround_ms: Option<u64>,
}

/// Fixed-capacity, append-only, creation-ordered task collection
#[derive(Debug)]
pub struct TaskTable {
    tasks: Vec<Task>,
    capacity: usize,
}

impl TaskTable {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            tasks: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends a new Ready task
    pub fn create_task(
        &mut self,
        id: TaskId,
        duration_ms: u64,
        priority: u32,
    ) -> Result<&Task, TaskTableError> {
        if self.tasks.len() >= self.capacity {
            return Err(TaskTableError::CapacityExceeded {
                capacity: self.capacity,
            });
        }
        if self.index_of(id).is_some() {
            return Err(TaskTableError::DuplicateId(id));
        }
        if duration_ms == 0 {
            return Err(TaskTableError::ZeroDuration(id));
        }
        self.tasks.push(Task::new(id, duration_ms, priority));
        Ok(&self.tasks[self.tasks.len() - 1])
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.tasks.len() >= self.capacity
    }

    pub fn get(&self, index: usize) -> Option<&Task> {
        self.tasks.get(index)
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut Task> {
        self.tasks.get_mut(index)
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Task> {
        self.tasks.iter_mut()
    }

    pub fn index_of(&self, id: TaskId) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == id)
    }

    pub fn by_id(&self, id: TaskId) -> Option<&Task> {
        self.index_of(id).map(|i| &self.tasks[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    /// True when every task is Finished (vacuously true for an empty table)
    pub fn all_finished(&self) -> bool {
        self.tasks.iter().all(|t| t.state.is_terminal())
    }

    pub fn count_in(&self, state: TaskState) -> usize {
        self.tasks.iter().filter(|t| t.state == state).count()
    }

    /// Runs [`Task::check_invariants`] over the whole table
    pub fn check_invariants(&self) -> Result<(), String> {
        self.tasks.iter().try_for_each(Task::check_invariants)
    }

    pub fn snapshot(&self) -> Vec<TaskSnapshot> {
        self.tasks.iter().map(Task::snapshot).collect()
    }
}
