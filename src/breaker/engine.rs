//! Breaker engine: the locked state machine.
//!
//! # Responsibilities
//! - Decide admission for each call attempt
//! - Apply success/failure outcomes to the state
//! - Operator reset and consistent snapshots
//!
//! # State Transitions
//! ```text
//! Closed   → Open:     failure_count >= failure_threshold
//! Open     → HalfOpen: at admission, once now - last_failure >= reset_timeout
//! HalfOpen → Closed:   a probe succeeds
//! HalfOpen → Open:     a probe fails (without waiting for the budget to drain)
//! any      → Closed:   manual reset
//! ```
//!
//! # Design Decisions
//! - One mutex per breaker; every public operation is a single critical section
//! - The probe budget is consumed at admission, not at completion
//! - No timers: the reset timeout is checked lazily by the next admission
//! - Logging and metrics happen after the lock is released

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::breaker::clock::Clock;
use crate::breaker::error::RejectReason;
use crate::breaker::state::{BreakerState, Phase, Stats};
use crate::config::BreakerConfig;
use crate::observability::metrics;

/// Admission decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Proceed,
    Reject {
        reason: RejectReason,
        retry_after: Option<Duration>,
    },
}

/// Inputs to the phase transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Event {
    Success,
    Failure { threshold_reached: bool },
    ResetTimeoutElapsed,
    ManualReset,
}

/// The whole phase table in one place. Counter effects are applied by the engine.
pub(crate) fn transition(phase: Phase, event: Event) -> Phase {
    match (phase, event) {
        (_, Event::ManualReset) => Phase::Closed,
        (Phase::Open, Event::ResetTimeoutElapsed) => Phase::HalfOpen,
        (Phase::HalfOpen, Event::Success) => Phase::Closed,
        (Phase::HalfOpen, Event::Failure { .. }) => Phase::Open,
        (Phase::Closed, Event::Failure { threshold_reached: true }) => Phase::Open,
        (phase, _) => phase,
    }
}

/// State machine for one dependency.
#[derive(Debug)]
pub struct Engine {
    config: BreakerConfig,
    clock: Arc<dyn Clock>,
    state: Mutex<BreakerState>,
}

impl Engine {
    /// Build an engine in the closed phase. The config is assumed validated.
    pub fn new(config: BreakerConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            state: Mutex::new(BreakerState::closed()),
        }
    }

    pub fn config(&self) -> &BreakerConfig {
        &self.config
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    // Every critical section leaves the state consistent, so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, BreakerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Decide whether a call may run. Admitting a half-open probe consumes budget.
    pub fn admit(&self) -> Decision {
        let mut state = self.lock();
        // Read under the lock so admissions observe time in lock order.
        let now = self.clock.now();

        let mut half_opened = false;
        let decision = match state.phase {
            Phase::Closed => Decision::Proceed,
            Phase::Open => {
                let reset_timeout = self.config.reset_timeout();
                let elapsed = state
                    .last_failure
                    .map(|at| now.saturating_duration_since(at))
                    .unwrap_or(Duration::MAX);

                if elapsed >= reset_timeout {
                    state.phase = transition(state.phase, Event::ResetTimeoutElapsed);
                    state.half_open_attempts = 0;
                    half_opened = true;
                    self.admit_probe(&mut state)
                } else {
                    Decision::Reject {
                        reason: RejectReason::Open,
                        retry_after: Some(reset_timeout - elapsed),
                    }
                }
            }
            Phase::HalfOpen => self.admit_probe(&mut state),
        };
        let attempts = state.half_open_attempts;
        drop(state);

        if half_opened {
            tracing::info!(
                breaker = %self.config.name,
                from = %Phase::Open,
                to = %Phase::HalfOpen,
                "Reset timeout elapsed, probing dependency"
            );
            metrics::record_transition(&self.config.name, Phase::Open, Phase::HalfOpen);
        }
        if let Decision::Reject { reason, .. } = decision {
            tracing::debug!(
                breaker = %self.config.name,
                reason = %reason,
                half_open_attempts = attempts,
                "Call rejected"
            );
        }
        decision
    }

    fn admit_probe(&self, state: &mut BreakerState) -> Decision {
        if state.half_open_attempts >= self.config.half_open_max_attempts {
            Decision::Reject {
                reason: RejectReason::ProbeBudgetExhausted,
                retry_after: None,
            }
        } else {
            state.half_open_attempts += 1;
            Decision::Proceed
        }
    }

    /// Record a successful call.
    pub fn report_success(&self) {
        let mut state = self.lock();
        let from = state.phase;
        let had_failures = state.failure_count > 0;

        match from {
            Phase::HalfOpen => {
                state.phase = transition(from, Event::Success);
                state.failure_count = 0;
                state.half_open_attempts = 0;
            }
            Phase::Closed => {
                state.failure_count = 0;
            }
            Phase::Open => {}
        }
        drop(state);

        match from {
            Phase::HalfOpen => {
                tracing::info!(
                    breaker = %self.config.name,
                    from = %from,
                    to = %Phase::Closed,
                    "Dependency recovered, closing circuit"
                );
                metrics::record_transition(&self.config.name, from, Phase::Closed);
            }
            Phase::Closed if had_failures => {
                tracing::debug!(breaker = %self.config.name, "Call succeeded, failure count reset");
            }
            Phase::Closed => {}
            Phase::Open => {
                tracing::warn!(breaker = %self.config.name, "Unexpected success while circuit is open");
                metrics::record_unexpected_success(&self.config.name);
            }
        }
    }

    /// Record a failed (or cancelled) call.
    pub fn report_failure(&self) {
        let mut state = self.lock();
        // Read under the lock so last_failure never moves backwards.
        let now = self.clock.now();
        let from = state.phase;

        state.failure_count = state.failure_count.saturating_add(1);
        state.last_failure = Some(now);
        let failure_count = state.failure_count;
        let threshold_reached = failure_count >= self.config.failure_threshold;
        state.phase = transition(from, Event::Failure { threshold_reached });
        let to = state.phase;
        let attempts = state.half_open_attempts;
        drop(state);

        match (from, to) {
            (Phase::HalfOpen, Phase::Open) => {
                tracing::warn!(
                    breaker = %self.config.name,
                    from = %from,
                    to = %to,
                    half_open_attempts = attempts,
                    "Recovery probe failed, reopening circuit"
                );
                metrics::record_transition(&self.config.name, from, to);
            }
            (Phase::Closed, Phase::Open) => {
                tracing::warn!(
                    breaker = %self.config.name,
                    from = %from,
                    to = %to,
                    failure_count,
                    threshold = self.config.failure_threshold,
                    "Failure threshold reached, opening circuit"
                );
                metrics::record_transition(&self.config.name, from, to);
            }
            (Phase::Open, _) => {
                tracing::debug!(
                    breaker = %self.config.name,
                    failure_count,
                    "Additional failure while circuit is open"
                );
            }
            _ => {
                tracing::debug!(
                    breaker = %self.config.name,
                    failure_count,
                    threshold = self.config.failure_threshold,
                    "Call failed"
                );
            }
        }
    }

    /// Force the closed phase and clear every counter.
    pub fn reset(&self) {
        let mut state = self.lock();
        let from = state.phase;
        state.phase = transition(from, Event::ManualReset);
        state.failure_count = 0;
        state.half_open_attempts = 0;
        state.last_failure = None;
        drop(state);

        tracing::info!(breaker = %self.config.name, from = %from, "Manual reset triggered");
        if from != Phase::Closed {
            metrics::record_transition(&self.config.name, from, Phase::Closed);
        }
    }

    /// Copy of every field, taken under one lock acquisition.
    pub fn snapshot(&self) -> Stats {
        let (state, now) = {
            let guard = self.lock();
            (guard.clone(), self.clock.now())
        };

        Stats {
            name: self.config.name.clone(),
            phase: state.phase,
            failure_count: state.failure_count,
            failure_threshold: self.config.failure_threshold,
            last_failure: state.last_failure,
            last_failure_ms_ago: state.last_failure.map(|at| {
                u64::try_from(now.saturating_duration_since(at).as_millis()).unwrap_or(u64::MAX)
            }),
            half_open_attempts: state.half_open_attempts,
            half_open_max_attempts: self.config.half_open_max_attempts,
        }
    }

    pub fn phase(&self) -> Phase {
        self.lock().phase
    }

    pub fn failure_count(&self) -> u32 {
        self.lock().failure_count
    }
}
