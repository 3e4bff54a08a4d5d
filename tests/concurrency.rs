//! Admission under contention on a multi-threaded runtime.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Barrier, Semaphore};

use circuit_guard::{BreakerConfig, CallError, CircuitBreaker, Phase, RejectReason};
use common::{scenario_breaker, trip, CallCounter};

const CALLERS: usize = 50;

async fn wait_until(mut done: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(10), async {
        while !done() {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .expect("condition reached in time");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_half_open_admits_at_most_budget() {
    let (breaker, clock) = scenario_breaker("stress");

    for round in 0..10 {
        breaker.reset();
        trip(&breaker, 3).await;
        clock.advance(Duration::from_millis(1000));

        let invoked = CallCounter::new();
        let rejected = Arc::new(AtomicUsize::new(0));
        let gate = Arc::new(Semaphore::new(0));
        let start = Arc::new(Barrier::new(CALLERS));

        let mut handles = Vec::with_capacity(CALLERS);
        for _ in 0..CALLERS {
            let breaker = breaker.clone();
            let invoked = invoked.clone();
            let rejected = rejected.clone();
            let gate = gate.clone();
            let start = start.clone();
            handles.push(tokio::spawn(async move {
                start.wait().await;
                let result = breaker
                    .call(|| async move {
                        invoked.hit();
                        let _permit = gate.acquire().await.map_err(|_| "gate closed")?;
                        Ok::<_, &'static str>(())
                    })
                    .await;
                if result.is_err() {
                    rejected.fetch_add(1, Ordering::SeqCst);
                }
                result
            }));
        }

        // Every caller has either started its probe or been turned away.
        wait_until(|| invoked.count() + rejected.load(Ordering::SeqCst) == CALLERS).await;
        assert_eq!(invoked.count(), 2, "round {round}");
        assert_eq!(breaker.stats().half_open_attempts, 2);
        assert_eq!(breaker.phase(), Phase::HalfOpen);

        gate.add_permits(CALLERS);
        let mut budget_rejections = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(()) => {}
                Err(CallError::Rejected(open)) => {
                    assert_eq!(open.reason, RejectReason::ProbeBudgetExhausted);
                    budget_rejections += 1;
                }
                Err(CallError::Operation(err)) => panic!("unexpected operation error: {err}"),
            }
        }

        assert_eq!(budget_rejections, CALLERS - 2);
        assert_eq!(breaker.phase(), Phase::Closed);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_failures_are_all_counted() {
    let breaker = Arc::new(
        CircuitBreaker::new(BreakerConfig::named("counting").with_failure_threshold(1000)).unwrap(),
    );
    let start = Arc::new(Barrier::new(CALLERS));

    let handles: Vec<_> = (0..CALLERS)
        .map(|_| {
            let breaker = breaker.clone();
            let start = start.clone();
            tokio::spawn(async move {
                start.wait().await;
                for _ in 0..10 {
                    let _ = breaker.call(|| async { Err::<(), _>("timeout") }).await;
                }
            })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(breaker.failure_count(), (CALLERS * 10) as u32);
    assert_eq!(breaker.phase(), Phase::Closed);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_threshold_crossing_under_contention() {
    let breaker = Arc::new(
        CircuitBreaker::new(
            BreakerConfig::named("tripping")
                .with_failure_threshold(5)
                .with_reset_timeout(Duration::from_secs(60)),
        )
        .unwrap(),
    );
    let invoked = CallCounter::new();
    let start = Arc::new(Barrier::new(CALLERS));

    let handles: Vec<_> = (0..CALLERS)
        .map(|_| {
            let breaker = breaker.clone();
            let invoked = invoked.clone();
            let start = start.clone();
            tokio::spawn(async move {
                start.wait().await;
                breaker.call(|| invoked.fail()).await
            })
        })
        .collect();

    let mut rejected = 0;
    for handle in handles {
        if handle.await.unwrap().is_err_and(|err| err.is_rejected()) {
            rejected += 1;
        }
    }

    // Calls admitted before the fifth failure landed may still run, but every
    // call is either invoked or rejected, and the circuit ends up open.
    assert_eq!(invoked.count() + rejected, CALLERS);
    assert!(invoked.count() >= 5);
    assert_eq!(breaker.phase(), Phase::Open);
}
