//! The `error` module defines the error types shared by the gateway.
//!
//! Two kinds of failure live here:
//!
//! - `ConnectionError`: the transport could not be reached while building a
//!   channel. This is the only failure that aborts an operation with `Err`.
//! - `TransportFailure`: the raw reason a transport gives for rejecting or
//!   failing an activated request. These never reach callers directly; the
//!   classifier turns them into an `OperationOutcome`.

/// Failure to establish the underlying transport connection.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// The transport endpoint refused or could not complete the handshake.
    #[error("transport connection refused: {0}")]
    Refused(String),
}

/// Raw failure reported by a transport for an activated request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportFailure {
    /// The transport itself gave up waiting on the remote side.
    #[error("transport deadline exceeded")]
    DeadlineExceeded,

    /// The caller lacks the permission grants for this topic or operation.
    #[error("not authorized: {0}")]
    Unauthorized(String),

    /// The service answered with an error.
    #[error("service error: {0}")]
    Service(String),

    /// The connection went away before the request was answered.
    #[error("connection closed before the request completed")]
    Disconnected,

    /// A failure wrapped with additional context by an intermediate layer.
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<TransportFailure>,
    },
}

impl TransportFailure {
    /// Wraps this failure with a context string.
    pub fn context(self, context: impl Into<String>) -> Self {
        TransportFailure::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Iterates over this failure and every failure it wraps, outermost first.
    pub fn chain(&self) -> impl Iterator<Item = &TransportFailure> {
        std::iter::successors(Some(self), |failure| match *failure {
            TransportFailure::Context { source, .. } => Some(source.as_ref()),
            _ => None,
        })
    }

    pub fn is_deadline(&self) -> bool {
        self.chain()
            .any(|f| matches!(f, TransportFailure::DeadlineExceeded))
    }

    pub fn is_unauthorized(&self) -> bool {
        self.chain()
            .any(|f| matches!(f, TransportFailure::Unauthorized(_)))
    }
}
