//! Synchronous bridge.
//!
//! # Responsibilities
//! - Let call sites that cannot suspend use a breaker
//! - Block the calling thread until `CircuitBreaker::call` completes
//!
//! # Design Decisions
//! - Owns a private current-thread runtime; admission and reporting stay in the wrapper
//! - Must not be used from a thread that is already driving a Tokio runtime
//! - Dropping never blocks, so a bridge may be released from async code

use std::future::Future;
use std::io;
use std::sync::Arc;

use tokio::runtime::{Builder, Runtime};

use crate::breaker::error::CallError;
use crate::breaker::executor::CircuitBreaker;

/// Blocking front end for a shared [`CircuitBreaker`].
pub struct BlockingCircuitBreaker {
    breaker: Arc<CircuitBreaker>,
    // Only taken in `Drop`.
    runtime: Option<Runtime>,
}

impl BlockingCircuitBreaker {
    pub fn new(breaker: Arc<CircuitBreaker>) -> io::Result<Self> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        Ok(Self {
            breaker,
            runtime: Some(runtime),
        })
    }

    /// The breaker this bridge drives.
    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    /// Run a blocking operation through the breaker.
    pub fn call<F, T, E>(&self, operation: F) -> Result<T, CallError<E>>
    where
        F: FnOnce() -> Result<T, E>,
    {
        self.runtime()
            .block_on(self.breaker.call(|| async move { operation() }))
    }

    /// Drive an asynchronous operation through the breaker to completion.
    pub fn block_on<F, Fut, T, E>(&self, operation: F) -> Result<T, CallError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.runtime().block_on(self.breaker.call(operation))
    }

    fn runtime(&self) -> &Runtime {
        match &self.runtime {
            Some(runtime) => runtime,
            None => unreachable!("runtime is only taken when the bridge is dropped"),
        }
    }
}

impl Drop for BlockingCircuitBreaker {
    fn drop(&mut self) {
        // A plain drop blocks on worker shutdown, which panics inside async contexts.
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

impl std::fmt::Debug for BlockingCircuitBreaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockingCircuitBreaker")
            .field("breaker", &self.breaker.name())
            .finish()
    }
}
