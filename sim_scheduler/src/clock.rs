//! Simulated execution
//!
//! "Running" a task means pausing the scheduler thread for the slice length.
//! The scheduler always calls [`SliceClock::run_slice`] with the context
//! lock released.

use core_types::TaskId;
use std::thread;
use std::time::Duration;

/// Performs the pause that stands in for executing a task
pub trait SliceClock: Send {
    /// Simulates `task_id` running for `slice`
    fn run_slice(&mut self, task_id: TaskId, slice: Duration);
}

/// Real-time clock: sleeps the calling thread for the whole slice
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleepClock;

impl SliceClock for ThreadSleepClock {
    fn run_slice(&mut self, _task_id: TaskId, slice: Duration) {
        thread::sleep(slice);
    }
}

/// Clock that runs a closure instead of sleeping
///
/// Used by tests to observe or interfere with the world while a dispatch is
/// in flight.
pub struct HookClock<F> {
    hook: F,
}

impl<F> HookClock<F>
where
    F: FnMut(TaskId, Duration) + Send,
{
    pub fn new(hook: F) -> Self {
        Self { hook }
    }
}

impl<F> SliceClock for HookClock<F>
where
    F: FnMut(TaskId, Duration) + Send,
{
    fn run_slice(&mut self, task_id: TaskId, slice: Duration) {
        (self.hook)(task_id, slice);
    }
}
