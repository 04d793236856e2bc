//! Policy-specific selection and requeue rules
//!
//! The dispatch loop is policy-agnostic: it asks [`PolicyState::select`] for
//! the next task, charges the slice from [`PolicyState::slice_for`], and
//! hands continuing tasks back through [`PolicyState::requeue`]. Everything
//! that differs between policies lives here.

use crate::queues::FeedbackQueues;
use crate::task::{Task, TaskTable};
use core_types::{SchedulingPolicy, TaskState};

/// A dispatch decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    /// Index of the task in the table
    pub index: usize,
    /// MLFQ level the task was taken from
    pub level: Option<usize>,
}

/// Active policy plus its private state
#[derive(Debug)]
pub enum PolicyState {
    /// No state: selection is a pure comparison over the table
    Priority,
    /// Position after the last dispatched task
    RoundRobin { cursor: usize },
    /// No state: table order is arrival order
    Fcfs,
    /// Per-level FIFO queues
    Mlfq(FeedbackQueues),
}

impl PolicyState {
    pub fn new(policy: SchedulingPolicy, mlfq_levels: usize) -> Self {
        match policy {
            SchedulingPolicy::Priority => PolicyState::Priority,
            SchedulingPolicy::RoundRobin => PolicyState::RoundRobin { cursor: 0 },
            SchedulingPolicy::Fcfs => PolicyState::Fcfs,
            SchedulingPolicy::Mlfq => PolicyState::Mlfq(FeedbackQueues::new(mlfq_levels)),
        }
    }

    pub fn policy(&self) -> SchedulingPolicy {
        match self {
            PolicyState::Priority => SchedulingPolicy::Priority,
            PolicyState::RoundRobin { .. } => SchedulingPolicy::RoundRobin,
            PolicyState::Fcfs => SchedulingPolicy::Fcfs,
            PolicyState::Mlfq(_) => SchedulingPolicy::Mlfq,
        }
    }

    /// One-time setup before the first dispatch
    ///
    /// MLFQ resets every task to level 0 and enqueues every Ready task there.
    pub fn prepare(&mut self, table: &mut TaskTable) {
        if let PolicyState::Mlfq(queues) = self {
            for task in table.iter_mut() {
                task.set_queue_level(0);
                if task.is_ready() && queues.position_of(task.id()).is_none() {
                    queues.enqueue(0, task.id());
                }
            }
        }
    }

    /// Picks the next task to run, or `None` if nothing is dispatchable
    pub fn select(&mut self, table: &TaskTable) -> Option<Selection> {
        match self {
            PolicyState::Priority => {
                let mut best: Option<&Task> = None;
                let mut best_index = 0;
                for (index, task) in table.iter().enumerate() {
                    if !task.is_ready() {
                        continue;
                    }
                    // Strict comparison keeps the first one found on ties.
                    if best.map_or(true, |b| task.priority() < b.priority()) {
                        best = Some(task);
                        best_index = index;
                    }
                }
                best.map(|_| Selection {
                    index: best_index,
                    level: None,
                })
            }
            PolicyState::RoundRobin { cursor } => {
                let len = table.len();
                if len == 0 {
                    return None;
                }
                let start = *cursor % len;
                let index = (0..len)
                    .map(|offset| (start + offset) % len)
                    .find(|&i| table.get(i).is_some_and(Task::is_ready))?;
                *cursor = (index + 1) % len;
                Some(Selection { index, level: None })
            }
            PolicyState::Fcfs => table
                .iter()
                .position(Task::is_ready)
                .map(|index| Selection { index, level: None }),
            PolicyState::Mlfq(queues) => {
                while let Some((level, task_id)) = queues.dequeue_highest() {
                    match table.index_of(task_id) {
                        Some(index) if table.get(index).is_some_and(Task::is_ready) => {
                            return Some(Selection {
                                index,
                                level: Some(level),
                            });
                        }
                        // Stale entry: the task left Ready without being
                        // dequeued. Drop it.
                        _ => continue,
                    }
                }
                None
            }
        }
    }

    /// Length of the slice granted to `task`
    pub fn slice_for(&self, task: &Task, slice_ms: u64) -> u64 {
        if self.policy().runs_to_completion() {
            task.remaining_ms()
        } else {
            task.remaining_ms().min(slice_ms)
        }
    }

    /// Returns a task that continued (not finished, not blocked) to the
    /// pool. The task is already Ready. Returns the level it was enqueued
    /// at under MLFQ.
    pub fn requeue(&mut self, task: &mut Task, selection: Selection) -> Option<usize> {
        debug_assert_eq!(task.state(), TaskState::Ready);
        match self {
            // Stays Ready in place; the next scan or comparison finds it.
            PolicyState::Priority | PolicyState::RoundRobin { .. } | PolicyState::Fcfs => None,
            PolicyState::Mlfq(queues) => {
                let from = selection.level.unwrap_or(task.queue_level());
                let level = queues.demoted(from);
                task.set_queue_level(level);
                queues.enqueue(level, task.id());
                Some(level)
            }
        }
    }

    /// Re-admits a task the unblocker just woke. Under MLFQ the task goes
    /// back to its recorded level.
    pub fn on_wake(&mut self, task: &Task) -> Option<usize> {
        match self {
            PolicyState::Mlfq(queues) => {
                let level = task.queue_level();
                queues.enqueue(level, task.id());
                Some(level)
            }
            _ => None,
        }
    }

    /// The MLFQ queues, when active
    pub fn queues(&self) -> Option<&FeedbackQueues> {
        match self {
            PolicyState::Mlfq(queues) => Some(queues),
            _ => None,
        }
    }
}
