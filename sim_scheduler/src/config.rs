//! Simulation parameters

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// A probability expressed as `numerator / denominator`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Odds {
    pub numerator: u32,
    pub denominator: u32,
}

impl Odds {
    /// Never fires
    pub const NEVER: Odds = Odds {
        numerator: 0,
        denominator: 1,
    };

    /// Always fires
    pub const ALWAYS: Odds = Odds {
        numerator: 1,
        denominator: 1,
    };

    pub const fn new(numerator: u32, denominator: u32) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    fn validate(self, name: &'static str) -> Result<(), ConfigError> {
        if self.denominator == 0 || self.numerator > self.denominator {
            return Err(ConfigError::InvalidOdds { name, odds: self });
        }
        Ok(())
    }
}

impl fmt::Display for Odds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

/// Configuration errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be greater than zero")]
    Zero { name: &'static str },

    #[error("{name} odds {odds} are not a probability")]
    InvalidOdds { name: &'static str, odds: Odds },
}

/// Simulator configuration
///
/// Fixed before the concurrent phase starts and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Upper bound of one slice (FCFS ignores it)
    pub slice_ms: u64,
    /// Unblocker polling period
    pub unblock_interval_ms: u64,
    /// Chance a task blocks after a non-final slice
    pub block_odds: Odds,
    /// Chance a blocked task wakes on one unblocker pass
    pub wake_odds: Odds,
    /// Maximum number of tasks in the table
    pub capacity: usize,
    /// Number of MLFQ levels
    pub mlfq_levels: usize,
    /// Master RNG seed; `None` derives one from the clock
    pub seed: Option<u64>,
    /// Keep the audit trail of scheduling events. It grows by one entry per
    /// dispatch, block and wake-up for the whole run.
    pub record_audit: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            slice_ms: 100,
            unblock_interval_ms: 200,
            block_odds: Odds::new(1, 5),
            wake_odds: Odds::new(1, 3),
            capacity: 100,
            mlfq_levels: 3,
            seed: None,
            record_audit: true,
        }
    }
}

impl SimConfig {
    /// Checks every parameter
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.slice_ms == 0 {
            return Err(ConfigError::Zero { name: "slice_ms" });
        }
        if self.unblock_interval_ms == 0 {
            return Err(ConfigError::Zero {
                name: "unblock_interval_ms",
            });
        }
        if self.capacity == 0 {
            return Err(ConfigError::Zero { name: "capacity" });
        }
        if self.mlfq_levels == 0 {
            return Err(ConfigError::Zero {
                name: "mlfq_levels",
            });
        }
        self.block_odds.validate("block")?;
        self.wake_odds.validate("wake")?;
        Ok(())
    }

    pub fn unblock_interval(&self) -> Duration {
        Duration::from_millis(self.unblock_interval_ms)
    }
}
