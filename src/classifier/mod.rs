//! Failure classification
//!
//! Every bounded wait on a transport activation produces a `RawOutcome`.
//! `classify` folds it into the small `OperationOutcome` set both channels
//! return, so callers branch on variants instead of inspecting error text.
//!
//! Checks run in a fixed order: elapsed wait, then permission rejection, then
//! a deadline reported by the transport itself, then anything else. The cause
//! chain is searched, so a transport that wraps an authorization rejection
//! inside a generic error still classifies as `Unauthorized`, and a rejection
//! that arrived is never reported as a timeout.

use std::fmt;

use crate::utils::error::TransportFailure;

/// What a bounded wait on an activation observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawOutcome {
    /// The request resolved successfully within the bound.
    Completed,
    /// The bound elapsed before the request resolved.
    Elapsed,
    /// The request resolved with a failure within the bound.
    Failed(TransportFailure),
}

/// Caller-visible result of a publish or subscribe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationOutcome {
    Success,
    /// Safe to retry.
    Timeout,
    /// Will not succeed without external remediation.
    Unauthorized,
    /// Any other failure; the detail is meant for logs.
    TransportError(String),
}

impl OperationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, OperationOutcome::Success)
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, OperationOutcome::Timeout)
    }
}

impl fmt::Display for OperationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationOutcome::Success => write!(f, "success"),
            OperationOutcome::Timeout => write!(f, "timed out"),
            OperationOutcome::Unauthorized => write!(f, "unauthorized"),
            OperationOutcome::TransportError(detail) => write!(f, "transport error: {detail}"),
        }
    }
}

pub fn classify(raw: &RawOutcome) -> OperationOutcome {
    match raw {
        RawOutcome::Elapsed => OperationOutcome::Timeout,
        RawOutcome::Failed(failure) if failure.is_unauthorized() => OperationOutcome::Unauthorized,
        RawOutcome::Failed(failure) if failure.is_deadline() => OperationOutcome::Timeout,
        RawOutcome::Failed(failure) => OperationOutcome::TransportError(failure.to_string()),
        RawOutcome::Completed => OperationOutcome::Success,
    }
}
