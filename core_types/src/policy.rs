//! Scheduling policy selection

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Scheduling policy, fixed for the lifetime of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulingPolicy {
    /// Lowest priority value among Ready tasks runs next
    Priority,
    /// Circular scan from a persistent cursor
    RoundRobin,
    /// First Ready task in creation order, runs without preemption
    Fcfs,
    /// Multi-level feedback queue with demotion
    Mlfq,
}

impl SchedulingPolicy {
    /// All policies in menu order
    pub const ALL: [SchedulingPolicy; 4] = [
        SchedulingPolicy::Priority,
        SchedulingPolicy::RoundRobin,
        SchedulingPolicy::Fcfs,
        SchedulingPolicy::Mlfq,
    ];

    /// Maps a numbered menu choice to a policy
    ///
    /// 1 = Priority, 2 = Round Robin, 3 = FCFS, 4 = MLFQ. Any other number
    /// selects FCFS.
    pub fn from_menu_choice(choice: i64) -> Self {
        match choice {
            1 => SchedulingPolicy::Priority,
            2 => SchedulingPolicy::RoundRobin,
            4 => SchedulingPolicy::Mlfq,
            _ => SchedulingPolicy::Fcfs,
        }
    }

    /// Human-readable policy name
    pub fn name(self) -> &'static str {
        match self {
            SchedulingPolicy::Priority => "Priority",
            SchedulingPolicy::RoundRobin => "Round Robin",
            SchedulingPolicy::Fcfs => "FCFS",
            SchedulingPolicy::Mlfq => "MLFQ",
        }
    }

    /// Whether a continuing task gets the whole remaining duration as its slice
    pub fn runs_to_completion(self) -> bool {
        self == SchedulingPolicy::Fcfs
    }
}

impl fmt::Display for SchedulingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a policy name cannot be parsed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown policy '{0}' (expected priority, rr, fcfs, mlfq or 1-4)")]
pub struct ParsePolicyError(pub String);

impl FromStr for SchedulingPolicy {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "priority" | "prio" | "1" => Ok(SchedulingPolicy::Priority),
            "rr" | "round-robin" | "round_robin" | "roundrobin" | "2" => {
                Ok(SchedulingPolicy::RoundRobin)
            }
            "fcfs" | "fifo" | "3" => Ok(SchedulingPolicy::Fcfs),
            "mlfq" | "4" => Ok(SchedulingPolicy::Mlfq),
            other => Err(ParsePolicyError(other.to_string())),
        }
    }
}
