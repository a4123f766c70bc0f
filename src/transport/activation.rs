//! Activated transport requests
//!
//! An `Activation` is the caller's side of a submitted request; a `Completer`
//! is the transport's side. The transport resolves the completer whenever the
//! request finishes, possibly long after the caller stopped waiting.
//!
//! Waiting is bounded. When the bound elapses the activation stays pending and
//! can be waited on again, so a completion that races past a timeout is still
//! observable. Dropping an activation never cancels the transport's work.

use std::fmt;
use std::time::Duration;

use tokio::sync::oneshot;

use crate::classifier::RawOutcome;
use crate::utils::error::TransportFailure;

type Resolution = Result<(), TransportFailure>;

enum State {
    Pending(oneshot::Receiver<Resolution>),
    Settled(Resolution),
}

pub struct Activation {
    state: State,
}

/// Transport-side handle used to resolve an `Activation`.
#[derive(Debug)]
pub struct Completer {
    tx: oneshot::Sender<Resolution>,
}

impl Activation {
    /// Creates a pending activation and the completer that resolves it.
    pub fn pending() -> (Completer, Activation) {
        let (tx, rx) = oneshot::channel();
        (
            Completer { tx },
            Activation {
                state: State::Pending(rx),
            },
        )
    }

    /// An activation that has already resolved.
    pub fn ready(resolution: Resolution) -> Self {
        Self {
            state: State::Settled(resolution),
        }
    }

    pub fn completed() -> Self {
        Self::ready(Ok(()))
    }

    pub fn failed(failure: TransportFailure) -> Self {
        Self::ready(Err(failure))
    }

    pub fn is_settled(&self) -> bool {
        matches!(self.state, State::Settled(_))
    }

    /// Waits at most `timeout` for the request to resolve.
    ///
    /// A completer dropped without resolving counts as `Disconnected`.
    pub async fn wait(&mut self, timeout: Duration) -> RawOutcome {
        let resolution = match &mut self.state {
            State::Settled(resolution) => resolution.clone(),
            State::Pending(rx) => match tokio::time::timeout(timeout, rx).await {
                Err(_elapsed) => return RawOutcome::Elapsed,
                Ok(received) => received.unwrap_or(Err(TransportFailure::Disconnected)),
            },
        };
        self.state = State::Settled(resolution.clone());
        to_raw(resolution)
    }

    /// Checks for a resolution without waiting.
    pub fn poll_now(&mut self) -> Option<RawOutcome> {
        let resolution = match &mut self.state {
            State::Settled(resolution) => resolution.clone(),
            State::Pending(rx) => match rx.try_recv() {
                Ok(resolution) => resolution,
                Err(oneshot::error::TryRecvError::Empty) => return None,
                Err(oneshot::error::TryRecvError::Closed) => Err(TransportFailure::Disconnected),
            },
        };
        self.state = State::Settled(resolution.clone());
        Some(to_raw(resolution))
    }
}

fn to_raw(resolution: Resolution) -> RawOutcome {
    match resolution {
        Ok(()) => RawOutcome::Completed,
        Err(failure) => RawOutcome::Failed(failure),
    }
}

impl fmt::Debug for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &self.state {
            State::Pending(_) => "pending",
            State::Settled(Ok(())) => "completed",
            State::Settled(Err(_)) => "failed",
        };
        f.debug_struct("Activation").field("state", &state).finish()
    }
}

impl Completer {
    /// Resolves the activation. A no-op if the caller already dropped it.
    pub fn complete(self, resolution: Resolution) {
        let _ = self.tx.send(resolution);
    }

    /// `true` once the caller has dropped its `Activation`.
    pub fn is_abandoned(&self) -> bool {
        self.tx.is_closed()
    }

    pub fn succeed(self) {
        self.complete(Ok(()));
    }

    pub fn fail(self, failure: TransportFailure) {
        self.complete(Err(failure));
    }
}
