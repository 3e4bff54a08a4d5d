//! Circuit breaker middleware for calls to unreliable dependencies.
//!
//! Wrap each downstream call in [`CircuitBreaker::call`]. After a run of
//! failures the breaker opens and short-circuits further calls with
//! [`CircuitOpenError`] until a reset timeout passes, then admits a bounded
//! number of probes to test recovery.

pub mod admin;
pub mod breaker;
pub mod config;
pub mod observability;

pub use breaker::{
    BlockingCircuitBreaker, BreakerRegistry, CallError, CircuitBreaker, CircuitBreakerLayer,
    CircuitOpenError, Phase, RejectReason, Stats,
};
pub use config::{BreakerConfig, GuardConfig};
