//! Breaker error types.
//!
//! # Design Decisions
//! - A breaker rejection and an operation failure are distinct variants
//! - The operation's own error is carried verbatim, never rewritten
//! - Rejection reasons are machine-readable; callers branch on kind, not text

use std::error::Error as StdError;
use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Why admission was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectReason {
    /// The breaker is open and the reset timeout has not elapsed.
    Open,
    /// The breaker is half-open and every probe slot is taken.
    ProbeBudgetExhausted,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::Open => "open",
            RejectReason::ProbeBudgetExhausted => "probe-budget-exhausted",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The call was short-circuited; the wrapped operation never ran.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("circuit breaker `{breaker}` rejected call ({reason}){}", retry_hint(.retry_after))]
pub struct CircuitOpenError {
    /// Name of the breaker that refused the call.
    pub breaker: String,
    pub reason: RejectReason,
    /// Estimated wait before the breaker may admit a probe, when known.
    pub retry_after: Option<Duration>,
}

fn retry_hint(retry_after: &Option<Duration>) -> String {
    match retry_after {
        Some(wait) => format!(", retry in {:?}", wait),
        None => String::new(),
    }
}

/// Outcome of a guarded call that did not succeed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallError<E> {
    /// Refused by the breaker.
    Rejected(CircuitOpenError),
    /// The operation ran and failed with its own error.
    Operation(E),
}

impl<E> CallError<E> {
    /// Returns `true` if the breaker refused the call.
    pub fn is_rejected(&self) -> bool {
        matches!(self, CallError::Rejected(_))
    }

    /// The rejection details, if this was a rejection.
    pub fn rejection(&self) -> Option<&CircuitOpenError> {
        match self {
            CallError::Rejected(err) => Some(err),
            CallError::Operation(_) => None,
        }
    }

    /// The operation's error, if the operation ran.
    pub fn operation(&self) -> Option<&E> {
        match self {
            CallError::Operation(err) => Some(err),
            CallError::Rejected(_) => None,
        }
    }

    /// Unwrap into the operation's error, handing a rejection back as `Err`.
    pub fn into_operation(self) -> Result<E, CircuitOpenError> {
        match self {
            CallError::Operation(err) => Ok(err),
            CallError::Rejected(err) => Err(err),
        }
    }
}

impl<E> From<CircuitOpenError> for CallError<E> {
    fn from(err: CircuitOpenError) -> Self {
        CallError::Rejected(err)
    }
}

impl<E: fmt::Display> fmt::Display for CallError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallError::Rejected(err) => write!(f, "{}", err),
            CallError::Operation(err) => write!(f, "{}", err),
        }
    }
}

impl<E: StdError + 'static> StdError for CallError<E> {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            CallError::Rejected(err) => Some(err),
            CallError::Operation(err) => Some(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Error)]
    #[error("connection refused")]
    struct Refused;

    #[test]
    fn test_reason_labels() {
        assert_eq!(RejectReason::Open.as_str(), "open");
        assert_eq!(
            RejectReason::ProbeBudgetExhausted.to_string(),
            "probe-budget-exhausted"
        );
    }

    #[test]
    fn test_open_error_display() {
        let err = CircuitOpenError {
            breaker: "users".into(),
            reason: RejectReason::Open,
            retry_after: Some(Duration::from_millis(400)),
        };
        assert_eq!(
            err.to_string(),
            "circuit breaker `users` rejected call (open), retry in 400ms"
        );

        let err = CircuitOpenError {
            breaker: "users".into(),
            reason: RejectReason::ProbeBudgetExhausted,
            retry_after: None,
        };
        assert_eq!(
            err.to_string(),
            "circuit breaker `users` rejected call (probe-budget-exhausted)"
        );
    }

    #[test]
    fn test_operation_error_passes_through() {
        let err: CallError<Refused> = CallError::Operation(Refused);
        assert!(!err.is_rejected());
        assert_eq!(err.to_string(), "connection refused");
        assert_eq!(err.operation(), Some(&Refused));
        assert_eq!(err.into_operation(), Ok(Refused));
    }

    #[test]
    fn test_rejection_accessors() {
        let open = CircuitOpenError {
            breaker: "posts".into(),
            reason: RejectReason::Open,
            retry_after: None,
        };
        let err: CallError<Refused> = open.clone().into();
        assert!(err.is_rejected());
        assert_eq!(err.rejection().map(|e| e.reason), Some(RejectReason::Open));
        assert!(err.source().is_some());
        assert_eq!(err.into_operation(), Err(open));
    }
}
