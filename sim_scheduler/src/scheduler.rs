//! Scheduler dispatch loop
//!
//! Each iteration, under the context lock:
//!
//! 1. stop if every task is Finished or a stop was requested;
//! 2. ask the active policy for a task; if there is none, wait for the
//!    unblocker (bounded by its polling interval) and go again;
//! 3. mark the task Running and log the dispatch.
//!
//! The lock is then released for the simulated slice, re-acquired, and the
//! post-slice transition is applied: Finished when nothing remains,
//! otherwise Blocked on a coin flip, otherwise Ready (requeued per policy).
//!
//! ## Invariant
//!
//! The slice pause never holds the context lock.

use crate::clock::SliceClock;
use crate::context::{SchedContext, ScheduleEvent, SharedState};
use crate::policy::Selection;
use crate::rng::XorShift64;
use crate::task::TransitionError;
use core_types::{SchedulingPolicy, TaskId};
use parking_lot::MutexGuard;
use services_logger::LogEntry;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Counters reported when the loop exits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Slices handed out
    pub dispatches: u64,
    /// Iterations that found nothing to run
    pub idle_waits: u64,
}

/// A task checked out for one slice
#[derive(Debug, Clone, Copy)]
struct Dispatch {
    task_id: TaskId,
    selection: Selection,
    slice_ms: u64,
}

/// The dispatching actor
pub struct Scheduler<C> {
    ctx: Arc<SchedContext>,
    clock: C,
    rng: XorShift64,
    stats: SchedulerStats,
}

impl<C: SliceClock> Scheduler<C> {
    pub fn new(ctx: Arc<SchedContext>, clock: C, rng: XorShift64) -> Self {
        Self {
            ctx,
            clock,
            rng,
            stats: SchedulerStats::default(),
        }
    }

    /// Runs until every task is Finished or the context asks it to stop
    pub fn run(mut self) -> SchedulerStats {
        let ctx = Arc::clone(&self.ctx);
        {
            let mut guard = ctx.lock();
            let state = &mut *guard;
            state.policy.prepare(&mut state.table);
        }

        let idle_timeout = ctx.config().unblock_interval();
        loop {
            let mut guard = ctx.lock();
            if guard.table.all_finished() || ctx.stop_requested() {
                break;
            }

            match self.begin_dispatch(&mut guard) {
                Some(dispatch) => {
                    drop(guard);
                    self.clock
                        .run_slice(dispatch.task_id, Duration::from_millis(dispatch.slice_ms));
                    self.complete_dispatch(dispatch);
                    self.stats.dispatches += 1;
                }
                None => {
                    self.stats.idle_waits += 1;
                    ctx.wait_for_wakeup(&mut guard, idle_timeout);
                }
            }
        }

        self.stats
    }

    /// Selects a task and marks it Running. Lock held by the caller.
    fn begin_dispatch(&mut self, guard: &mut MutexGuard<'_, SharedState>) -> Option<Dispatch> {
        let slice_cap = self.ctx.config().slice_ms;
        let SharedState {
            table,
            policy,
            audit_log,
        } = &mut **guard;

        let selection = policy.select(table)?;
        let task = table.get_mut(selection.index)?;
        if let Err(err) = task.start() {
            self.report_transition_error(err);
            return None;
        }

        let slice_ms = policy.slice_for(task, slice_cap);
        let task_id = task.id();
        let priority = task.priority();

        let message = match (policy.policy(), selection.level) {
            (SchedulingPolicy::Mlfq, Some(level)) => format!(
                "Task {} running for {}ms at queue level {}",
                task_id, slice_ms, level
            ),
            _ => format!(
                "Task {} running for {}ms (Priority: {})",
                task_id, slice_ms, priority
            ),
        };
        let mut entry = LogEntry::info(message)
            .with_source(task_id)
            .with_field("slice_ms", slice_ms)
            .with_field("priority", priority);
        if let Some(level) = selection.level {
            entry = entry.with_field("level", level);
        }
        self.ctx.log(entry);

        audit_log.push(ScheduleEvent::TaskDispatched {
            task_id,
            slice_ms,
            priority,
            level: selection.level,
        });

        Some(Dispatch {
            task_id,
            selection,
            slice_ms,
        })
    }

    /// Applies the post-slice transition. Takes the lock.
    fn complete_dispatch(&mut self, dispatch: Dispatch) {
        let block_odds = self.ctx.config().block_odds;
        let mut guard = self.ctx.lock();
        let SharedState {
            table,
            policy,
            audit_log,
        } = &mut *guard;

        let Some(task) = table.get_mut(dispatch.selection.index) else {
            return;
        };
        let task_id = task.id();

        let outcome = task
            .charge_slice(dispatch.slice_ms, Instant::now())
            .and_then(|finished| {
                if finished {
                    Ok(ScheduleEvent::TaskFinished { task_id })
                } else if self.rng.chance(block_odds) {
                    task.block().map(|_| ScheduleEvent::TaskBlocked { task_id })
                } else {
                    task.yield_ready()?;
                    let level = policy.requeue(task, dispatch.selection);
                    Ok(ScheduleEvent::TaskRequeued { task_id, level })
                }
            });

        match outcome {
            Ok(event) => {
                match &event {
                    ScheduleEvent::TaskFinished { .. } => self
                        .ctx
                        .log(LogEntry::info(format!("Task {} finished", task_id)).with_source(task_id)),
                    ScheduleEvent::TaskBlocked { .. } => self
                        .ctx
                        .log(LogEntry::info(format!("Task {} blocked", task_id)).with_source(task_id)),
                    _ => {}
                }
                audit_log.push(event);
            }
            Err(err) => self.report_transition_error(err),
        }

        if cfg!(debug_assertions) {
            if let Err(violation) = table.check_invariants() {
                panic!("task invariant violated: {}", violation);
            }
        }
    }

    fn report_transition_error(&self, err: TransitionError) {
        debug_assert!(false, "{}", err);
        self.ctx.log(LogEntry::new(
            services_logger::LogLevel::Error,
            err.to_string(),
        ));
    }
}
