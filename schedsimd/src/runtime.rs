//! # Simulation Runtime
//!
//! Owns one run from setup to report: the context, the master RNG and the
//! two actor threads.

use crate::report::export_json;
use core_types::{RunId, SchedulingPolicy, TaskId};
use services_logger::{EventLogError, EventSink, FileSink, LogEntry, LogLevel};
use sim_scheduler::{
    RunReport, SchedContext, Scheduler, SimConfig, SliceClock, ThreadSleepClock, Unblocker,
    XorShift64,
};
use std::fs;
use std::ops::{Range, RangeInclusive};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use thiserror::Error;

/// Host error types
#[derive(Debug, Error)]
pub enum HostError {
    #[error("Event log error: {0}")]
    EventLog(#[from] EventLogError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0} thread panicked")]
    ActorPanicked(&'static str),
}

/// Host configuration
#[derive(Debug, Clone)]
pub struct HostConfig {
    /// Scheduling policy; prompted for when absent
    pub policy: Option<SchedulingPolicy>,
    /// Number of tasks to generate; prompted for when absent
    pub task_count: Option<usize>,
    /// Event log file, truncated on open
    pub log_path: PathBuf,
    /// Echo log lines to stdout
    pub echo_log: bool,
    /// Also write Debug entries to the log
    pub verbose: bool,
    /// Where to write the JSON report, if anywhere
    pub report_json: Option<PathBuf>,
    /// Engine parameters
    pub sim: SimConfig,
    /// Generated task durations
    pub duration_ms: Range<u64>,
    /// Generated task priorities
    pub priority: RangeInclusive<u32>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            policy: None,
            task_count: None,
            log_path: PathBuf::from("scheduler.log"),
            echo_log: true,
            verbose: false,
            report_json: None,
            sim: SimConfig::default(),
            duration_ms: 200..600,
            priority: 1..=3,
        }
    }
}

impl HostConfig {
    /// Reads a JSON engine configuration; missing fields keep their defaults
    pub fn load_sim_config(path: &Path) -> Result<SimConfig, HostError> {
        let text = fs::read_to_string(path)?;
        let sim: SimConfig = serde_json::from_str(&text)?;
        Ok(sim)
    }

    /// Checks everything the runtime relies on
    pub fn validate(&self) -> Result<(), HostError> {
        self.sim
            .validate()
            .map_err(|e| HostError::Config(e.to_string()))?;
        if self.duration_ms.is_empty() || self.duration_ms.start == 0 {
            return Err(HostError::Config(format!(
                "Invalid duration range: {:?}",
                self.duration_ms
            )));
        }
        if self.priority.is_empty() {
            return Err(HostError::Config(format!(
                "Invalid priority range: {:?}",
                self.priority
            )));
        }
        Ok(())
    }
}

/// One simulation run
pub struct SimRuntime {
    run_id: RunId,
    seed: u64,
    rng: XorShift64,
    ctx: Arc<SchedContext>,
    report_json: Option<PathBuf>,
}

impl SimRuntime {
    /// Opens the log file and sets up the task table
    pub fn new(config: HostConfig) -> Result<Self, HostError> {
        let min_level = if config.verbose {
            LogLevel::Debug
        } else {
            LogLevel::Info
        };
        let sink = FileSink::open(&config.log_path)?
            .with_console_echo(config.echo_log)
            .with_min_level(min_level);
        Self::with_sink(config, Arc::new(sink))
    }

    /// Sets up the task table, logging to `sink`
    pub fn with_sink(config: HostConfig, sink: Arc<dyn EventSink>) -> Result<Self, HostError> {
        config.validate()?;
        let policy = config
            .policy
            .ok_or_else(|| HostError::Config("No scheduling policy selected".to_string()))?;
        let task_count = config
            .task_count
            .ok_or_else(|| HostError::Config("No task count given".to_string()))?;

        let seed = config.sim.seed.unwrap_or_else(XorShift64::seed_from_time);
        let mut sim = config.sim.clone();
        sim.seed = Some(seed);

        let run_id = RunId::new();
        let ctx = Arc::new(
            SchedContext::try_new(sim, policy, sink)
                .map_err(|e| HostError::Config(e.to_string()))?,
        );
        ctx.log(
            LogEntry::info(format!("Scheduler started: policy={}, seed={}", policy, seed))
                .with_field("run_id", run_id)
                .with_field("policy", policy)
                .with_field("seed", seed),
        );
        ctx.log(LogEntry::new(
            LogLevel::Debug,
            format!("Simulation config: {:?}", ctx.config()),
        ));

        let mut runtime = Self {
            run_id,
            seed,
            rng: XorShift64::new(seed),
            ctx,
            report_json: config.report_json.clone(),
        };
        runtime.generate_tasks(task_count, &config);
        Ok(runtime)
    }

    /// Creates `count` tasks with ids `0..count`
    ///
    /// Rejected creations are logged by the context and skipped.
    fn generate_tasks(&mut self, count: usize, config: &HostConfig) {
        for i in 0..count {
            let duration = self
                .rng
                .range_u64(config.duration_ms.start, config.duration_ms.end);
            let priority = self.rng.range_u64(
                u64::from(*config.priority.start()),
                u64::from(*config.priority.end()) + 1,
            ) as u32;
            let _ = self.ctx.create_task(TaskId::new(i as u32), duration, priority);
        }
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn context(&self) -> &Arc<SchedContext> {
        &self.ctx
    }

    /// Runs both actors in real time and returns the report
    pub fn run(self) -> Result<RunReport, HostError> {
        self.run_with_clock(ThreadSleepClock)
    }

    /// Runs both actors, the scheduler pausing through `clock`
    pub fn run_with_clock<C>(mut self, clock: C) -> Result<RunReport, HostError>
    where
        C: SliceClock + 'static,
    {
        let scheduler = Scheduler::new(Arc::clone(&self.ctx), clock, self.rng.fork());
        let unblocker = Unblocker::new(Arc::clone(&self.ctx), self.rng.fork());

        let scheduler_guard = StopOnPanic(Arc::clone(&self.ctx));
        let scheduler_handle = thread::Builder::new()
            .name("scheduler".to_string())
            .spawn(move || {
                let _guard = scheduler_guard;
                scheduler.run()
            })?;
        let unblocker_guard = StopOnPanic(Arc::clone(&self.ctx));
        let unblocker_handle = match thread::Builder::new()
            .name("unblocker".to_string())
            .spawn(move || {
                let _guard = unblocker_guard;
                unblocker.run()
            }) {
            Ok(handle) => handle,
            Err(err) => {
                self.ctx.request_stop();
                let _ = scheduler_handle.join();
                return Err(err.into());
            }
        };

        // Join both before reporting, so a panic in one never leaves the
        // other running.
        let scheduler_result = scheduler_handle.join();
        let unblocker_result = unblocker_handle.join();
        let scheduler_stats =
            scheduler_result.map_err(|_| HostError::ActorPanicked("scheduler"))?;
        let unblocker_stats =
            unblocker_result.map_err(|_| HostError::ActorPanicked("unblocker"))?;

        let report = RunReport::collect(&self.ctx, self.run_id, self.seed)
            .with_counters(scheduler_stats.dispatches, unblocker_stats.wakeups);
        self.ctx.log(
            LogEntry::info(format!(
                "All tasks finished: {} dispatches, {} wake-ups",
                report.dispatches, report.wakeups
            ))
            .with_field("run_id", self.run_id),
        );

        if let Some(path) = &self.report_json {
            export_json(&report, path)?;
            self.ctx.log(LogEntry::info(format!(
                "Report written to {}",
                path.display()
            )));
        }

        Ok(report)
    }
}

/// Stops the other actor when the owning thread unwinds
struct StopOnPanic(Arc<SchedContext>);

impl Drop for StopOnPanic {
    fn drop(&mut self) {
        if thread::panicking() {
            self.0.request_stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use services_logger::CollectorSink;

    fn config(policy: SchedulingPolicy, tasks: usize) -> HostConfig {
        HostConfig {
            policy: Some(policy),
            task_count: Some(tasks),
            echo_log: false,
            sim: SimConfig {
                seed: Some(7),
                ..SimConfig::default()
            },
            ..HostConfig::default()
        }
    }

    #[test]
    fn test_default_config_matches_menu_run() {
        let config = HostConfig::default();
        assert_eq!(config.log_path, PathBuf::from("scheduler.log"));
        assert!(config.echo_log);
        assert!(!config.verbose);
        assert_eq!(config.duration_ms, 200..600);
        assert_eq!(config.priority, 1..=3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_generated_tasks_stay_in_range() {
        let sink = Arc::new(CollectorSink::new());
        let runtime =
            SimRuntime::with_sink(config(SchedulingPolicy::Priority, 20), sink.clone()).unwrap();

        let snap = runtime.context().snapshot();
        assert_eq!(snap.len(), 20);
        for (i, task) in snap.iter().enumerate() {
            assert_eq!(task.id, TaskId::new(i as u32));
            assert!((200..600).contains(&task.duration_ms));
            assert!((1..=3).contains(&task.priority));
        }
        assert_eq!(sink.count_containing("created"), 20);
        assert_eq!(sink.count_containing("seed=7"), 1);
    }

    #[test]
    fn test_same_seed_same_tasks() {
        let a = SimRuntime::with_sink(config(SchedulingPolicy::Fcfs, 10), Arc::new(CollectorSink::new()))
            .unwrap();
        let b = SimRuntime::with_sink(config(SchedulingPolicy::Fcfs, 10), Arc::new(CollectorSink::new()))
            .unwrap();
        assert_eq!(a.context().snapshot(), b.context().snapshot());
        assert_ne!(a.run_id(), b.run_id());
    }

    #[test]
    fn test_missing_policy_is_config_error() {
        let mut cfg = config(SchedulingPolicy::Fcfs, 1);
        cfg.policy = None;
        let result = SimRuntime::with_sink(cfg, Arc::new(CollectorSink::new()));
        assert!(matches!(result, Err(HostError::Config(_))));
    }

    #[test]
    fn test_invalid_sim_config_rejected() {
        let mut cfg = config(SchedulingPolicy::Fcfs, 1);
        cfg.sim.slice_ms = 0;
        let result = SimRuntime::with_sink(cfg, Arc::new(CollectorSink::new()));
        assert!(matches!(result, Err(HostError::Config(_))));
    }

    #[test]
    fn test_excess_tasks_are_dropped_at_capacity() {
        let mut cfg = config(SchedulingPolicy::Priority, 5);
        cfg.sim.capacity = 3;
        let sink = Arc::new(CollectorSink::new());
        let runtime = SimRuntime::with_sink(cfg, sink.clone()).unwrap();
        assert_eq!(runtime.context().task_count(), 3);
        assert_eq!(sink.count_containing("Maximum task limit reached"), 2);
    }
}
