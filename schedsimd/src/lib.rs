//! # Scheduling Simulator Host
//!
//! This crate drives one simulation run from the terminal.
//!
//! ## Responsibilities
//!
//! The host:
//! - Resolves the run configuration (flags, JSON file, interactive prompt)
//! - Opens the event log and generates the synthetic tasks
//! - Starts the scheduler and the unblocker on their own threads
//! - Waits for both, then renders the summary and optionally exports it
//!
//! ## Non-Responsibilities
//!
//! The host does NOT:
//! - Make scheduling decisions
//! - Touch task state once the actors are running
//! - Add tasks after the run has started

pub mod prompt;
pub mod report;
pub mod runtime;

pub use prompt::{prompt_policy, prompt_task_count};
pub use report::{export_json, render_summary};
pub use runtime::{HostConfig, HostError, SimRuntime};
