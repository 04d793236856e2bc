//! Shared scheduler context
//!
//! One [`SchedContext`] is created per run and handed to both actors by
//! `Arc`. All task-table and queue access goes through its single lock. The
//! condition variable lets an idle scheduler sleep until the unblocker wakes
//! something instead of spinning on the lock.

use crate::config::{ConfigError, SimConfig};
use crate::policy::PolicyState;
use crate::task::{TaskSnapshot, TaskTable, TaskTableError};
use core_types::{SchedulingPolicy, TaskId};
use parking_lot::{Condvar, Mutex, MutexGuard};
use serde::{Deserialize, Serialize};
use services_logger::{EventSink, LogEntry};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Scheduling event for the audit trail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScheduleEvent {
    /// Task selected and granted a slice
    TaskDispatched {
        task_id: TaskId,
        slice_ms: u64,
        priority: u32,
        level: Option<usize>,
    },
    /// Task continued after its slice and went back to Ready
    TaskRequeued {
        task_id: TaskId,
        level: Option<usize>,
    },
    /// Task blocked on simulated I/O
    TaskBlocked { task_id: TaskId },
    /// Task reached zero remaining time
    TaskFinished { task_id: TaskId },
    /// Unblocker returned a task to Ready
    TaskUnblocked {
        task_id: TaskId,
        level: Option<usize>,
    },
}

impl ScheduleEvent {
    pub fn task_id(&self) -> TaskId {
        match self {
            ScheduleEvent::TaskDispatched { task_id, .. }
            | ScheduleEvent::TaskRequeued { task_id, .. }
            | ScheduleEvent::TaskBlocked { task_id }
            | ScheduleEvent::TaskFinished { task_id }
            | ScheduleEvent::TaskUnblocked { task_id, .. } => *task_id,
        }
    }
}

/// Ordered record of scheduling events
///
/// Holds every event for the lifetime of the run, so a long run with many
/// tasks grows it without bound. Runs that do not need it are configured
/// with `record_audit: false`, which turns [`AuditTrail::push`] into a no-op.
#[derive(Debug, Clone, Default)]
pub struct AuditTrail {
    enabled: bool,
    events: Vec<ScheduleEvent>,
}

impl AuditTrail {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            events: Vec::new(),
        }
    }

    pub fn push(&mut self, event: ScheduleEvent) {
        if self.enabled {
            self.events.push(event);
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn events(&self) -> &[ScheduleEvent] {
        &self.events
    }
}

/// Everything guarded by the context lock
#[derive(Debug)]
pub struct SharedState {
    pub(crate) table: TaskTable,
    pub(crate) policy: PolicyState,
    pub(crate) audit_log: AuditTrail,
}

impl SharedState {
    pub fn table(&self) -> &TaskTable {
        &self.table
    }

    pub fn policy(&self) -> &PolicyState {
        &self.policy
    }

    pub fn audit_log(&self) -> &[ScheduleEvent] {
        self.audit_log.events()
    }

    /// Test hook: the unblocker's transition, applied directly
    #[cfg(any(test, feature = "test-hooks"))]
    pub fn force_wake(&mut self, task_id: TaskId) -> bool {
        let Some(index) = self.table.index_of(task_id) else {
            return false;
        };
        let Some(task) = self.table.get_mut(index) else {
            return false;
        };
        if task.wake().is_err() {
            return false;
        }
        let level = self.policy.on_wake(task);
        self.audit_log
            .push(ScheduleEvent::TaskUnblocked { task_id, level });
        true
    }
}

/// Shared, lock-protected scheduler context
pub struct SchedContext {
    config: SimConfig,
    state: Mutex<SharedState>,
    wakeups: Condvar,
    stop: AtomicBool,
    sink: Arc<dyn EventSink>,
}

impl std::fmt::Debug for SchedContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchedContext")
            .field("config", &self.config)
            .field("sink", &self.sink)
            .finish_non_exhaustive()
    }
}

impl SchedContext {
    /// Creates an empty context for `policy`
    ///
    /// `config` must pass [`SimConfig::validate`]; [`SchedContext::try_new`]
    /// checks it first.
    pub fn new(config: SimConfig, policy: SchedulingPolicy, sink: Arc<dyn EventSink>) -> Self {
        debug_assert!(
            config.validate().is_ok(),
            "invalid simulation config: {:?}",
            config.validate()
        );
        let state = SharedState {
            table: TaskTable::with_capacity(config.capacity),
            policy: PolicyState::new(policy, config.mlfq_levels),
            audit_log: AuditTrail::new(config.record_audit),
        };
        Self {
            config,
            state: Mutex::new(state),
            wakeups: Condvar::new(),
            stop: AtomicBool::new(false),
            sink,
        }
    }

    /// Validates `config`, then creates the context
    pub fn try_new(
        config: SimConfig,
        policy: SchedulingPolicy,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(config, policy, sink))
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn policy(&self) -> SchedulingPolicy {
        self.state.lock().policy.policy()
    }

    pub fn sink(&self) -> &Arc<dyn EventSink> {
        &self.sink
    }

    /// Emits a log entry
    pub fn log(&self, entry: LogEntry) {
        self.sink.emit(&entry);
    }

    /// Adds a task during setup
    ///
    /// Failures are logged and returned; the table is left unchanged.
    pub fn create_task(
        &self,
        id: TaskId,
        duration_ms: u64,
        priority: u32,
    ) -> Result<(), TaskTableError> {
        let mut state = self.state.lock();
        match state.table.create_task(id, duration_ms, priority) {
            Ok(_) => {
                self.log(
                    LogEntry::info(format!(
                        "Task {} created: Duration={}ms, Priority={}",
                        id, duration_ms, priority
                    ))
                    .with_source(id)
                    .with_field("duration_ms", duration_ms)
                    .with_field("priority", priority),
                );
                Ok(())
            }
            Err(err) => {
                let message = match &err {
                    TaskTableError::CapacityExceeded { .. } => {
                        "Maximum task limit reached".to_string()
                    }
                    other => other.to_string(),
                };
                self.log(LogEntry::warn(message).with_source(id));
                Err(err)
            }
        }
    }

    /// Acquires the context lock
    pub fn lock(&self) -> MutexGuard<'_, SharedState> {
        self.state.lock()
    }

    /// Acquires the lock only if it is free right now
    pub fn try_lock(&self) -> Option<MutexGuard<'_, SharedState>> {
        self.state.try_lock()
    }

    /// Waits at most `timeout` for the lock
    pub fn try_lock_for(&self, timeout: Duration) -> Option<MutexGuard<'_, SharedState>> {
        self.state.try_lock_for(timeout)
    }

    pub fn task_count(&self) -> usize {
        self.state.lock().table.len()
    }

    pub fn all_finished(&self) -> bool {
        self.state.lock().table.all_finished()
    }

    pub fn snapshot(&self) -> Vec<TaskSnapshot> {
        self.state.lock().table.snapshot()
    }

    pub fn audit_log(&self) -> Vec<ScheduleEvent> {
        self.state.lock().audit_log.events().to_vec()
    }

    /// Asks both actors to exit at their next check, finished or not
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
        self.wakeups.notify_all();
    }

    pub fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    /// Checks every task invariant under the lock
    pub fn check_invariants(&self) -> Result<(), String> {
        self.state.lock().table.check_invariants()
    }

    /// Signals an idle scheduler that a task became Ready
    pub(crate) fn notify_wakeup(&self) {
        self.wakeups.notify_all();
    }

    /// Releases the lock until a wake-up is signalled or `timeout` elapses
    pub(crate) fn wait_for_wakeup(&self, guard: &mut MutexGuard<'_, SharedState>, timeout: Duration) {
        let _ = self.wakeups.wait_for(guard, timeout);
    }
}
