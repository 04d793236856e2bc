//! Test utilities
//!
//! Helpers for driving the scheduler deterministically: a configuration with
//! blocking disabled, a clock that records slices instead of sleeping, and a
//! way to put a task into Blocked without running the dispatch loop.

use crate::clock::SliceClock;
use crate::config::{Odds, SimConfig};
use crate::context::SchedContext;
use crate::rng::XorShift64;
use crate::scheduler::{Scheduler, SchedulerStats};
use core_types::TaskId;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default configuration with blocking disabled and a short unblock poll
pub fn deterministic_config() -> SimConfig {
    SimConfig {
        block_odds: Odds::NEVER,
        unblock_interval_ms: 1,
        seed: Some(1),
        ..SimConfig::default()
    }
}

/// Clock that records slice lengths and returns immediately
///
/// Clones share the same record, so a test can keep one handle while the
/// scheduler consumes the other.
#[derive(Debug, Clone, Default)]
pub struct RecordingClock {
    slices: Arc<Mutex<Vec<(TaskId, Duration)>>>,
}

impl RecordingClock {
    /// Slice lengths in milliseconds, in dispatch order
    pub fn slices_ms(&self) -> Vec<u64> {
        self.slices
            .lock()
            .iter()
            .map(|(_, d)| d.as_millis() as u64)
            .collect()
    }

    /// Task ids in dispatch order
    pub fn dispatched(&self) -> Vec<TaskId> {
        self.slices.lock().iter().map(|(id, _)| *id).collect()
    }
}

impl SliceClock for RecordingClock {
    fn run_slice(&mut self, task_id: TaskId, slice: Duration) {
        self.slices.lock().push((task_id, slice));
    }
}

/// Runs only the scheduler (no unblocker) with a recording clock
///
/// Only terminates if no task can end up Blocked, e.g. with
/// [`deterministic_config`].
pub fn run_scheduler_only(ctx: &Arc<SchedContext>) -> (SchedulerStats, Vec<u64>) {
    let clock = RecordingClock::default();
    let seed = ctx.config().seed.unwrap_or(1);
    let stats = Scheduler::new(Arc::clone(ctx), clock.clone(), XorShift64::new(seed)).run();
    (stats, clock.slices_ms())
}

/// Moves a Ready task to Blocked as if it had just blocked after a slice
///
/// Returns false if the task does not exist or is not Ready.
pub fn block_task_for_test(ctx: &SchedContext, task_id: TaskId) -> bool {
    let mut guard = ctx.lock();
    let Some(index) = guard.table.index_of(task_id) else {
        return false;
    };
    let Some(task) = guard.table.get_mut(index) else {
        return false;
    };
    if task.start().is_err() {
        return false;
    }
    let _ = task.charge_slice(0, Instant::now());
    task.block().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::{SchedulingPolicy, TaskState};
    use services_logger::NullSink;

    #[test]
    fn test_block_task_for_test() {
        let ctx = SchedContext::new(
            deterministic_config(),
            SchedulingPolicy::Priority,
            Arc::new(NullSink),
        );
        ctx.create_task(TaskId::new(0), 100, 1).unwrap();

        assert!(block_task_for_test(&ctx, TaskId::new(0)));
        assert_eq!(ctx.snapshot()[0].state, TaskState::Blocked);
        assert_eq!(ctx.snapshot()[0].remaining_ms, 100);
        assert!(!block_task_for_test(&ctx, TaskId::new(0)));
        assert!(!block_task_for_test(&ctx, TaskId::new(9)));
    }

    #[test]
    fn test_recording_clock_clones_share_record() {
        let clock = RecordingClock::default();
        let mut handle = clock.clone();
        handle.run_slice(TaskId::new(3), Duration::from_millis(40));
        assert_eq!(clock.slices_ms(), vec![40]);
        assert_eq!(clock.dispatched(), vec![TaskId::new(3)]);
    }
}
