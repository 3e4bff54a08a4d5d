//! Circuit breaker subsystem.
//!
//! # Data Flow
//! ```text
//! async caller ──────────────┐
//! tower stack (layer.rs) ────┼─→ executor.rs: CircuitBreaker::call(operation)
//! blocking caller ───────────┘        → engine.rs: admit()        [locked]
//!   (blocking.rs)                     → operation().await         [unlocked]
//!                                     → engine.rs: report_*()     [locked]
//!
//! registry.rs: name → Arc<CircuitBreaker>, one per downstream dependency
//! ```
//!
//! # Design Decisions
//! - Per-dependency breaker, never a global one
//! - Decide under the lock, execute outside it
//! - A rejection is a distinct error kind from the operation's own failure
//! - Time is read through an injectable clock; there are no background timers

mod blocking;
mod clock;
mod engine;
mod error;
mod executor;
mod layer;
mod registry;
mod state;

pub use blocking::BlockingCircuitBreaker;
pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{Decision, Engine};
pub use error::{CallError, CircuitOpenError, RejectReason};
pub use executor::CircuitBreaker;
pub use layer::{CircuitBreakerLayer, CircuitBreakerService};
pub use registry::BreakerRegistry;
pub use state::{Phase, Stats};
