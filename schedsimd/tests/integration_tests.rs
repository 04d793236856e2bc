//! Integration tests for schedsimd: full runs with both actor threads

use core_types::{SchedulingPolicy, TaskId, TaskState};
use schedsimd::{HostConfig, HostError, SimRuntime};
use services_logger::CollectorSink;
use sim_scheduler::test_utils::RecordingClock;
use sim_scheduler::{HookClock, Odds, ScheduleEvent, SimConfig, TaskStatus};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn host_config(policy: SchedulingPolicy, tasks: usize, sim: SimConfig) -> HostConfig {
    HostConfig {
        policy: Some(policy),
        task_count: Some(tasks),
        echo_log: false,
        sim,
        ..HostConfig::default()
    }
}

fn no_blocking() -> SimConfig {
    SimConfig {
        block_odds: Odds::NEVER,
        unblock_interval_ms: 2,
        seed: Some(1),
        ..SimConfig::default()
    }
}

fn dispatched(events: &[ScheduleEvent]) -> Vec<(u32, Option<usize>)> {
    events
        .iter()
        .filter_map(|e| match e {
            ScheduleEvent::TaskDispatched { task_id, level, .. } => Some((task_id.as_u32(), *level)),
            _ => None,
        })
        .collect()
}

fn finished(events: &[ScheduleEvent]) -> Vec<u32> {
    events
        .iter()
        .filter_map(|e| match e {
            ScheduleEvent::TaskFinished { task_id } => Some(task_id.as_u32()),
            _ => None,
        })
        .collect()
}

#[test]
fn test_single_task_priority_run() {
    let sink = Arc::new(CollectorSink::new());
    let runtime = SimRuntime::with_sink(
        host_config(SchedulingPolicy::Priority, 0, no_blocking()),
        sink.clone(),
    )
    .unwrap();
    runtime
        .context()
        .create_task(TaskId::new(0), 300, 1)
        .unwrap();
    let ctx = Arc::clone(runtime.context());

    let clock = RecordingClock::default();
    let report = runtime.run_with_clock(clock.clone()).unwrap();

    assert_eq!(clock.slices_ms(), vec![100, 100, 100]);
    assert_eq!(report.dispatches, 3);
    assert_eq!(report.tasks.len(), 1);
    assert_eq!(report.tasks[0].status, TaskStatus::Finished);
    assert!(report.tasks[0].turnaround_ms.is_some());
    assert_eq!(ctx.snapshot()[0].remaining_ms, 0);
    assert!(ctx.check_invariants().is_ok());
    assert_eq!(sink.count_containing("Task 0 finished"), 1);
}

#[test]
fn test_priority_order_with_equal_durations() {
    let runtime = SimRuntime::with_sink(
        host_config(SchedulingPolicy::Priority, 0, no_blocking()),
        Arc::new(CollectorSink::new()),
    )
    .unwrap();
    for (id, priority) in [(0, 3), (1, 1), (2, 2)] {
        runtime
            .context()
            .create_task(TaskId::new(id), 200, priority)
            .unwrap();
    }
    let ctx = Arc::clone(runtime.context());

    let report = runtime.run_with_clock(RecordingClock::default()).unwrap();

    assert!(report.all_finished());
    let events = ctx.audit_log();
    let order: Vec<u32> = dispatched(&events).into_iter().map(|(id, _)| id).collect();
    assert_eq!(order, vec![1, 1, 2, 2, 0, 0]);
    assert_eq!(finished(&events), vec![1, 2, 0]);
}

#[test]
fn test_capacity_rejection() {
    let sim = SimConfig {
        capacity: 2,
        ..no_blocking()
    };
    let sink = Arc::new(CollectorSink::new());
    let runtime =
        SimRuntime::with_sink(host_config(SchedulingPolicy::Fcfs, 2, sim), sink.clone()).unwrap();

    let result = runtime.context().create_task(TaskId::new(2), 300, 1);

    assert!(result.is_err());
    assert_eq!(runtime.context().task_count(), 2);
    assert_eq!(sink.count_containing("Maximum task limit reached"), 1);

    let report = runtime.run_with_clock(RecordingClock::default()).unwrap();
    assert_eq!(report.tasks.len(), 2);
    assert!(report.all_finished());
}

#[test]
fn test_mlfq_levels_clamp_at_lowest() {
    let runtime = SimRuntime::with_sink(
        host_config(SchedulingPolicy::Mlfq, 0, no_blocking()),
        Arc::new(CollectorSink::new()),
    )
    .unwrap();
    runtime
        .context()
        .create_task(TaskId::new(0), 400, 2)
        .unwrap();
    let ctx = Arc::clone(runtime.context());

    runtime.run_with_clock(RecordingClock::default()).unwrap();

    let levels: Vec<Option<usize>> = dispatched(&ctx.audit_log())
        .into_iter()
        .map(|(_, level)| level)
        .collect();
    assert_eq!(levels, vec![Some(0), Some(1), Some(2), Some(2)]);
}

#[test]
fn test_every_policy_terminates_with_default_odds() {
    for policy in SchedulingPolicy::ALL {
        let sim = SimConfig {
            unblock_interval_ms: 1,
            seed: Some(2024),
            ..SimConfig::default()
        };
        let runtime = SimRuntime::with_sink(
            host_config(policy, 12, sim),
            Arc::new(CollectorSink::new()),
        )
        .unwrap();
        let ctx = Arc::clone(runtime.context());

        let report = runtime.run_with_clock(RecordingClock::default()).unwrap();

        assert!(report.all_finished(), "{} left tasks unfinished", policy);
        assert_eq!(report.tasks.len(), 12);
        assert!(ctx.check_invariants().is_ok());
        for task in ctx.snapshot() {
            assert_eq!(task.state, TaskState::Finished);
            assert_eq!(task.remaining_ms, 0);
        }
        let blocks = ctx
            .audit_log()
            .iter()
            .filter(|e| matches!(e, ScheduleEvent::TaskBlocked { .. }))
            .count() as u64;
        // Every block must have been undone for the run to finish.
        assert_eq!(report.wakeups, blocks);
    }
}

#[test]
fn test_round_robin_real_time_run() {
    let sim = SimConfig {
        slice_ms: 2,
        unblock_interval_ms: 2,
        seed: Some(5),
        ..SimConfig::default()
    };
    let mut config = host_config(SchedulingPolicy::RoundRobin, 4, sim);
    config.duration_ms = 4..12;

    let runtime = SimRuntime::with_sink(config, Arc::new(CollectorSink::new())).unwrap();
    let report = runtime.run().unwrap();

    assert!(report.all_finished());
    assert_eq!(report.tasks.len(), 4);
}

#[test]
fn test_slice_runs_with_lock_released() {
    // Every non-final slice blocks; during each pause the hook takes the
    // lock and wakes whatever is blocked, racing the real unblocker.
    let sim = SimConfig {
        block_odds: Odds::ALWAYS,
        wake_odds: Odds::ALWAYS,
        unblock_interval_ms: 20,
        seed: Some(3),
        ..SimConfig::default()
    };
    let runtime = SimRuntime::with_sink(
        host_config(SchedulingPolicy::RoundRobin, 0, sim),
        Arc::new(CollectorSink::new()),
    )
    .unwrap();
    for id in 0..3 {
        runtime
            .context()
            .create_task(TaskId::new(id), 300, 1)
            .unwrap();
    }
    let ctx = Arc::clone(runtime.context());
    let observer = Arc::clone(&ctx);
    let woken = Arc::new(AtomicUsize::new(0));
    let woken_in_hook = Arc::clone(&woken);

    let clock = HookClock::new(move |task_id: TaskId, _slice: Duration| {
        // The unblocker may hold the lock for a moment; the scheduler must not.
        let mut guard = observer
            .try_lock_for(Duration::from_secs(2))
            .expect("slice must run with the lock released");
        assert_eq!(
            guard.table().by_id(task_id).map(|t| t.state()),
            Some(TaskState::Running)
        );
        let blocked: Vec<TaskId> = guard
            .table()
            .iter()
            .filter(|t| t.state() == TaskState::Blocked)
            .map(|t| t.id())
            .collect();
        for id in blocked {
            if guard.force_wake(id) {
                woken_in_hook.fetch_add(1, Ordering::SeqCst);
            }
        }
    });

    let report = runtime.run_with_clock(clock).unwrap();

    assert!(report.all_finished());
    let blocks = ctx
        .audit_log()
        .iter()
        .filter(|e| matches!(e, ScheduleEvent::TaskBlocked { .. }))
        .count();
    assert!(blocks >= 3);
    assert_eq!(woken.load(Ordering::SeqCst) + report.wakeups as usize, blocks);
    assert!(ctx.check_invariants().is_ok());
}

#[test]
fn test_scheduler_panic_stops_unblocker() {
    // Wake odds of zero keep the blocked task blocked forever, so the
    // unblocker only exits if the failed scheduler tells it to.
    let sim = SimConfig {
        block_odds: Odds::ALWAYS,
        wake_odds: Odds::NEVER,
        unblock_interval_ms: 2,
        seed: Some(4),
        ..SimConfig::default()
    };
    let runtime = SimRuntime::with_sink(
        host_config(SchedulingPolicy::RoundRobin, 0, sim),
        Arc::new(CollectorSink::new()),
    )
    .unwrap();
    for id in 0..2 {
        runtime
            .context()
            .create_task(TaskId::new(id), 300, 1)
            .unwrap();
    }
    let ctx = Arc::clone(runtime.context());
    let slices = Arc::new(AtomicUsize::new(0));
    let slices_seen = Arc::clone(&slices);
    let clock = HookClock::new(move |_task_id: TaskId, _slice: Duration| {
        if slices_seen.fetch_add(1, Ordering::SeqCst) == 1 {
            panic!("slice clock failed");
        }
    });

    let result = runtime.run_with_clock(clock);

    assert!(matches!(result, Err(HostError::ActorPanicked("scheduler"))));
    assert!(ctx.stop_requested());
    assert!(!ctx.all_finished());
}

#[test]
fn test_run_without_audit_trail() {
    let sim = SimConfig {
        record_audit: false,
        ..no_blocking()
    };
    let runtime = SimRuntime::with_sink(
        host_config(SchedulingPolicy::Priority, 5, sim),
        Arc::new(CollectorSink::new()),
    )
    .unwrap();
    let ctx = Arc::clone(runtime.context());

    let report = runtime.run_with_clock(RecordingClock::default()).unwrap();

    assert!(report.all_finished());
    assert!(report.dispatches >= 5);
    assert!(ctx.audit_log().is_empty());
}

#[test]
fn test_log_file_is_truncated_and_written() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("scheduler.log");
    std::fs::write(&log_path, "stale line from an earlier run\n").unwrap();

    let mut config = host_config(SchedulingPolicy::Fcfs, 3, no_blocking());
    config.log_path = log_path.clone();
    let runtime = SimRuntime::new(config).unwrap();
    runtime.run_with_clock(RecordingClock::default()).unwrap();

    let text = std::fs::read_to_string(&log_path).unwrap();
    assert!(!text.contains("stale line"));
    assert!(text.lines().all(|line| line.starts_with('[')));
    assert!(text.contains("] Task 0 created: Duration="));
    assert!(text.contains("Task 2 finished"));
    assert!(text.contains("All tasks finished"));
    assert!(!text.contains("Simulation config"));
}

#[test]
fn test_verbose_log_includes_debug_entries() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("scheduler.log");

    let mut config = host_config(SchedulingPolicy::Priority, 1, no_blocking());
    config.log_path = log_path.clone();
    config.verbose = true;
    let runtime = SimRuntime::new(config).unwrap();
    runtime.run_with_clock(RecordingClock::default()).unwrap();

    let text = std::fs::read_to_string(&log_path).unwrap();
    assert!(text.lines().all(|line| line.starts_with('[')));
    assert!(text.contains("] Simulation config: SimConfig {"));
    assert!(text.contains("Task 0 finished"));
}

#[test]
fn test_unwritable_log_path_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = host_config(SchedulingPolicy::Fcfs, 1, no_blocking());
    config.log_path = dir.path().join("missing").join("scheduler.log");

    let result = SimRuntime::new(config);
    assert!(matches!(result, Err(HostError::EventLog(_))));
}

#[test]
fn test_report_json_export() {
    let dir = tempfile::tempdir().unwrap();
    let report_path = dir.path().join("report.json");
    let mut config = host_config(SchedulingPolicy::Mlfq, 4, no_blocking());
    config.report_json = Some(report_path.clone());

    let runtime = SimRuntime::with_sink(config, Arc::new(CollectorSink::new())).unwrap();
    let run_id = runtime.run_id();
    let report = runtime.run_with_clock(RecordingClock::default()).unwrap();

    let text = std::fs::read_to_string(&report_path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value["policy"], "mlfq");
    assert_eq!(value["seed"], 1);
    assert_eq!(value["run_id"], serde_json::json!(run_id));
    assert_eq!(value["tasks"].as_array().map(Vec::len), Some(4));
    assert_eq!(value["dispatches"], report.dispatches);
}
