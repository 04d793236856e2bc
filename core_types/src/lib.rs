//! # Core Types
//!
//! This crate defines the vocabulary shared by the scheduling simulator.
//!
//! ## Philosophy
//!
//! - **Explicit over implicit**: Task identity, lifecycle state and policy
//!   are distinct types and cannot be confused with plain integers.
//! - **Closed sets**: States and policies are enums, so every consumer
//!   handles every variant.
//!
//! ## Key Types
//!
//! - [`TaskId`]: Caller-assigned identifier of a simulated task
//! - [`RunId`]: Unique identifier of one simulation run
//! - [`TaskState`]: The four-state task lifecycle
//! - [`SchedulingPolicy`]: The four scheduling policies

pub mod ids;
pub mod policy;
pub mod task_state;

pub use ids::{RunId, TaskId};
pub use policy::{ParsePolicyError, SchedulingPolicy};
pub use task_state::TaskState;
