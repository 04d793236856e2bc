//! Multi-level feedback queues
//!
//! Each level is a FIFO of task ids. Tasks are enqueued at the back and
//! dequeued from the front; level 0 is the highest priority.

use core_types::TaskId;
use std::collections::VecDeque;

/// Run queue for one level
///
/// A simple FIFO using VecDeque for deterministic ordering.
#[derive(Debug, Default)]
struct RunQueue {
    queue: VecDeque<TaskId>,
}

impl RunQueue {
    fn enqueue(&mut self, task_id: TaskId) {
        self.queue.push_back(task_id);
    }

    fn dequeue(&mut self) -> Option<TaskId> {
        self.queue.pop_front()
    }

    fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    fn len(&self) -> usize {
        self.queue.len()
    }

    fn contains(&self, task_id: TaskId) -> bool {
        self.queue.contains(&task_id)
    }
}

/// The full set of MLFQ levels
#[derive(Debug)]
pub struct FeedbackQueues {
    levels: Vec<RunQueue>,
}

impl FeedbackQueues {
    /// Creates `levels` empty queues (at least one)
    pub fn new(levels: usize) -> Self {
        let levels = levels.max(1);
        Self {
            levels: (0..levels).map(|_| RunQueue::default()).collect(),
        }
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// Index of the lowest-priority level
    pub fn lowest_level(&self) -> usize {
        self.levels.len() - 1
    }

    /// The level a continuing task drops to, clamped at the lowest
    pub fn demoted(&self, level: usize) -> usize {
        (level + 1).min(self.lowest_level())
    }

    /// Enqueues a task at `level` (clamped to the valid range)
    ///
    /// A task id is kept in at most one queue: enqueueing an id already
    /// present anywhere is a no-op.
    pub fn enqueue(&mut self, level: usize, task_id: TaskId) {
        if self.position_of(task_id).is_some() {
            debug_assert!(false, "task {} enqueued twice", task_id);
            return;
        }
        let level = level.min(self.lowest_level());
        self.levels[level].enqueue(task_id);
    }

    /// Dequeues the head of the lowest-numbered non-empty level
    pub fn dequeue_highest(&mut self) -> Option<(usize, TaskId)> {
        self.levels
            .iter_mut()
            .enumerate()
            .find(|(_, q)| !q.is_empty())
            .and_then(|(level, q)| q.dequeue().map(|id| (level, id)))
    }

    /// Level currently holding `task_id`, if any
    pub fn position_of(&self, task_id: TaskId) -> Option<usize> {
        self.levels.iter().position(|q| q.contains(task_id))
    }

    pub fn len_at(&self, level: usize) -> usize {
        self.levels.get(level).map_or(0, RunQueue::len)
    }

    pub fn total_len(&self) -> usize {
        self.levels.iter().map(RunQueue::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.iter().all(RunQueue::is_empty)
    }
}
