//! # Scheduling Simulator Core
//!
//! This crate runs synthetic tasks through one of four scheduling policies
//! while a second actor wakes tasks blocked on simulated I/O.
//!
//! ## Purpose
//!
//! - Task table with a checked state machine (`Ready`, `Running`, `Blocked`,
//!   `Finished`)
//! - Priority, round-robin, FCFS and multi-level feedback queue selection
//! - A scheduler loop and an unblocker loop sharing one lock-protected context
//! - An audit trail of every dispatch decision
//!
//! ## Philosophy
//!
//! **Nothing real runs.** A slice is a pause and blocking is a coin flip.
//! What is real is the concurrency: the scheduler and the unblocker are two
//! threads racing over the same table, and the slice pause never holds the
//! lock. Both the pause and the coin flips sit behind seams ([`SliceClock`],
//! [`XorShift64`]) so tests can make a run fully deterministic.

pub mod clock;
pub mod config;
pub mod context;
pub mod policy;
pub mod queues;
pub mod report;
pub mod rng;
pub mod scheduler;
pub mod task;
pub mod test_utils;
pub mod unblocker;

pub use clock::{HookClock, SliceClock, ThreadSleepClock};
pub use config::{ConfigError, Odds, SimConfig};
pub use context::{AuditTrail, SchedContext, ScheduleEvent, SharedState};
pub use policy::{PolicyState, Selection};
pub use queues::FeedbackQueues;
pub use report::{RunReport, TaskReport, TaskStatus};
pub use rng::XorShift64;
pub use scheduler::{Scheduler, SchedulerStats};
pub use task::{Task, TaskSnapshot, TaskTable, TaskTableError, TransitionError};
pub use unblocker::{PassOutcome, Unblocker, UnblockerStats};
