//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use circuit_guard::breaker::ManualClock;
use circuit_guard::{BreakerConfig, CircuitBreaker};

/// failure_threshold = 3, reset_timeout = 1000ms, half_open_max_attempts = 2.
pub fn scenario_config(name: &str) -> BreakerConfig {
    BreakerConfig::named(name)
        .with_failure_threshold(3)
        .with_reset_timeout(Duration::from_millis(1000))
        .with_half_open_max_attempts(2)
}

/// A breaker on a manual clock, plus the clock that drives it.
pub fn scenario_breaker(name: &str) -> (Arc<CircuitBreaker>, ManualClock) {
    let clock = ManualClock::new();
    let breaker = CircuitBreaker::with_clock(scenario_config(name), Arc::new(clock.clone()))
        .expect("scenario config is valid");
    (Arc::new(breaker), clock)
}

/// Drive `breaker` from Closed to Open with `threshold` failing calls.
pub async fn trip(breaker: &CircuitBreaker, threshold: u32) {
    for _ in 0..threshold {
        let _ = breaker.call(|| async { Err::<(), _>("trip") }).await;
    }
}

/// Counts how many times a wrapped operation actually ran.
#[derive(Debug, Clone, Default)]
pub struct CallCounter(Arc<AtomicUsize>);

impl CallCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hit(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    pub async fn fail(&self) -> Result<&'static str, &'static str> {
        self.hit();
        Err("503 service unavailable")
    }

    pub async fn succeed(&self) -> Result<&'static str, &'static str> {
        self.hit();
        Ok("200 ok")
    }
}
