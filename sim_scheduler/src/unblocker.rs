//! Unblocker wake-up loop
//!
//! Polls the task table on a fixed interval. Each Blocked task gets one coin
//! flip per pass; on success it returns to Ready and, under MLFQ, is
//! re-enqueued at the level it was demoted to. The loop exits, without a
//! final sleep, on the first pass that sees every task Finished, or as soon
//! as the context has been asked to stop.

use crate::context::{SchedContext, ScheduleEvent, SharedState};
use crate::rng::XorShift64;
use core_types::TaskState;
use services_logger::LogEntry;
use std::sync::Arc;
use std::thread;

/// Counters reported when the loop exits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnblockerStats {
    pub passes: u64,
    pub wakeups: u64,
}

/// Result of one scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassOutcome {
    /// Every task was Finished when the pass ran
    pub all_finished: bool,
    /// Tasks returned to Ready by this pass
    pub woken: usize,
}

/// The waking actor
pub struct Unblocker {
    ctx: Arc<SchedContext>,
    rng: XorShift64,
    stats: UnblockerStats,
}

impl Unblocker {
    pub fn new(ctx: Arc<SchedContext>, rng: XorShift64) -> Self {
        Self {
            ctx,
            rng,
            stats: UnblockerStats::default(),
        }
    }

    /// Polls until every task is Finished or a stop is requested
    pub fn run(mut self) -> UnblockerStats {
        let interval = self.ctx.config().unblock_interval();
        loop {
            if self.run_pass().all_finished || self.ctx.stop_requested() {
                break;
            }
            thread::sleep(interval);
        }
        self.stats
    }

    /// Performs a single scan under the lock
    pub fn run_pass(&mut self) -> PassOutcome {
        let wake_odds = self.ctx.config().wake_odds;
        let ctx = Arc::clone(&self.ctx);
        let mut guard = ctx.lock();
        let SharedState {
            table,
            policy,
            audit_log,
        } = &mut *guard;

        let all_finished = table.all_finished();
        let mut woken = 0;

        for task in table.iter_mut() {
            if task.state() != TaskState::Blocked || !self.rng.chance(wake_odds) {
                continue;
            }
            if task.wake().is_err() {
                continue;
            }
            let task_id = task.id();
            let level = policy.on_wake(task);
            ctx.log(LogEntry::info(format!("Task {} unblocked", task_id)).with_source(task_id));
            audit_log.push(ScheduleEvent::TaskUnblocked { task_id, level });
            woken += 1;
        }

        if woken > 0 {
            ctx.notify_wakeup();
        }

        self.stats.passes += 1;
        self.stats.wakeups += woken as u64;
        PassOutcome {
            all_finished,
            woken,
        }
    }

    pub fn stats(&self) -> UnblockerStats {
        self.stats
    }
}
