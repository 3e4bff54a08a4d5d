//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Breaker engine and execution wrapper produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters and a per-breaker phase gauge)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Prometheus scrape endpoint
//!     → admin API reads Stats snapshots, never mutates
//! ```
//!
//! # Design Decisions
//! - Metric updates are fire-and-forget; with no recorder installed they are no-ops
//! - Logs carry the breaker name as a field so one filter isolates one dependency

pub mod logging;
pub mod metrics;
