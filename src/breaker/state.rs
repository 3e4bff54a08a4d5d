//! Breaker state model.
//!
//! # Phases
//! - Closed: normal operation, every call is admitted
//! - Open: dependency assumed down, calls are rejected
//! - HalfOpen: a bounded number of probe calls test recovery
//!
//! # Invariants
//! - `Closed` implies `half_open_attempts == 0`
//! - `half_open_attempts <= half_open_max_attempts`
//! - `failure_count` is zeroed on entry to `Closed` and on every success while `Closed`
//! - `last_failure` is stamped exactly when a failure is recorded

use std::fmt;
use std::time::Instant;

use serde::Serialize;

/// Breaker phase.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Closed = 0,
    Open = 1,
    HalfOpen = 2,
}

impl Phase {
    /// Stable lowercase label, used for logs and metric labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Closed => "closed",
            Phase::Open => "open",
            Phase::HalfOpen => "half_open",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mutable bookkeeping for one breaker. Only the owning engine touches it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct BreakerState {
    pub(crate) phase: Phase,
    pub(crate) failure_count: u32,
    pub(crate) last_failure: Option<Instant>,
    pub(crate) half_open_attempts: u32,
}

impl BreakerState {
    pub(crate) fn closed() -> Self {
        Self {
            phase: Phase::Closed,
            failure_count: 0,
            last_failure: None,
            half_open_attempts: 0,
        }
    }
}

impl Default for BreakerState {
    fn default() -> Self {
        Self::closed()
    }
}

/// Consistent point-in-time copy of a breaker for observers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub name: String,
    pub phase: Phase,
    pub failure_count: u32,
    pub failure_threshold: u32,
    /// Instant of the most recent recorded failure, `None` if never.
    #[serde(skip)]
    pub last_failure: Option<Instant>,
    /// Milliseconds between the last recorded failure and the snapshot.
    pub last_failure_ms_ago: Option<u64>,
    pub half_open_attempts: u32,
    pub half_open_max_attempts: u32,
}
