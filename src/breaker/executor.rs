//! Execution wrapper.
//!
//! # Data Flow
//! ```text
//! caller → CircuitBreaker::call(operation)
//!     → Engine::admit()            [locked]
//!     → operation().await          [unlocked]
//!     → Engine::report_*()         [locked]
//!     → result or CallError to caller
//! ```
//!
//! # Design Decisions
//! - The operation is invoked zero or one times per call
//! - No lock is held while the operation runs
//! - A dropped (cancelled) or panicking call is reported as a failure

use std::future::Future;
use std::sync::Arc;

use crate::breaker::clock::{Clock, SystemClock};
use crate::breaker::engine::{Decision, Engine};
use crate::breaker::error::{CallError, CircuitOpenError};
use crate::breaker::state::{Phase, Stats};
use crate::config::{validate_breaker, BreakerConfig, ConfigError};
use crate::observability::metrics;

/// Guards calls to one downstream dependency.
///
/// # Example
///
/// ```rust,ignore
/// use circuit_guard::{BreakerConfig, CircuitBreaker};
///
/// let breaker = CircuitBreaker::new(BreakerConfig::named("users"))?;
/// let users = breaker.call(|| client.get_users()).await?;
/// ```
#[derive(Debug)]
pub struct CircuitBreaker {
    engine: Engine,
}

impl CircuitBreaker {
    /// Create a breaker on the system clock.
    pub fn new(config: BreakerConfig) -> Result<Self, ConfigError> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a breaker reading time from `clock`.
    pub fn with_clock(config: BreakerConfig, clock: Arc<dyn Clock>) -> Result<Self, ConfigError> {
        validate_breaker(&config).map_err(ConfigError::Validation)?;
        metrics::record_phase(&config.name, Phase::Closed);
        Ok(Self {
            engine: Engine::new(config, clock),
        })
    }

    pub fn name(&self) -> &str {
        self.engine.name()
    }

    pub fn config(&self) -> &BreakerConfig {
        self.engine.config()
    }

    /// Run `operation` if the breaker admits it.
    ///
    /// Returns the operation's value, its error wrapped in
    /// [`CallError::Operation`], or [`CallError::Rejected`] without invoking it.
    pub async fn call<F, Fut, T, E>(&self, operation: F) -> Result<T, CallError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Decision::Reject {
            reason,
            retry_after,
        } = self.engine.admit()
        {
            metrics::record_rejection(self.name(), reason);
            return Err(CallError::Rejected(CircuitOpenError {
                breaker: self.name().to_string(),
                reason,
                retry_after,
            }));
        }

        let outcome = OutcomeGuard::new(&self.engine);
        match operation().await {
            Ok(value) => {
                outcome.success();
                Ok(value)
            }
            Err(err) => {
                outcome.failure();
                Err(CallError::Operation(err))
            }
        }
    }

    pub fn phase(&self) -> Phase {
        self.engine.phase()
    }

    pub fn failure_count(&self) -> u32 {
        self.engine.failure_count()
    }

    pub fn stats(&self) -> Stats {
        self.engine.snapshot()
    }

    /// Operator reset: closed phase, counters cleared.
    pub fn reset(&self) {
        self.engine.reset();
    }
}

/// Reports exactly one outcome for an admitted call. If dropped unreported,
/// the call was cancelled or panicked and counts as a failure.
struct OutcomeGuard<'a> {
    engine: &'a Engine,
    reported: bool,
}

impl<'a> OutcomeGuard<'a> {
    fn new(engine: &'a Engine) -> Self {
        Self {
            engine,
            reported: false,
        }
    }

    fn success(mut self) {
        self.reported = true;
        metrics::record_call(self.engine.name(), "success");
        self.engine.report_success();
    }

    fn failure(mut self) {
        self.reported = true;
        metrics::record_call(self.engine.name(), "failure");
        self.engine.report_failure();
    }
}

impl Drop for OutcomeGuard<'_> {
    fn drop(&mut self) {
        if !self.reported {
            tracing::debug!(breaker = %self.engine.name(), "Call dropped before completion");
            metrics::record_call(self.engine.name(), "failure");
            self.engine.report_failure();
        }
    }
}
