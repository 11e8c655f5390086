//! Fire-once broadcast signals.
//!
//! A signal has two states, pending and fired, and only ever moves forward.
//! [`SignalMut`] is the owner's handle and the only way to fire it; [`Signal`] is
//! the read-only view handed out to any number of waiters.

use std::time::Duration;
use tokio_util::sync::{CancellationToken, WaitForCancellationFutureOwned};

/// Owner side of a signal.
///
/// `set` consumes the handle, so a single owner cannot fire the same signal twice.
/// Dropping a `SignalMut` without calling `set` leaves the signal pending forever.
#[derive(Debug, Default)]
pub struct SignalMut {
    token: CancellationToken,
}

impl SignalMut {
    /// Create a new pending signal
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    /// Read-only view of this signal
    pub fn signal(&self) -> Signal {
        Signal {
            token: self.token.clone(),
        }
    }

    /// Fire the signal, waking every waiter
    pub fn set(self) {
        self.token.cancel();
    }
}

/// Read-only view of a fire-once signal.
#[derive(Debug, Clone)]
pub struct Signal {
    token: CancellationToken,
}

impl Signal {
    /// Whether the signal has fired
    pub fn is_set(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Wait until the signal fires.
    ///
    /// Inside a pipeline task this is not a cancellation-aware wait on its own; use
    /// [`CancellableExt`](crate::CancellableExt) to race it against shutdown.
    pub async fn wait(&self) {
        self.token.cancelled().await
    }

    /// Wait for at most `timeout`; returns `true` if the signal fired in time.
    pub async fn wait_for(&self, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, self.wait()).await.is_ok()
    }

    pub(crate) fn wait_owned(&self) -> WaitForCancellationFutureOwned {
        self.token.clone().cancelled_owned()
    }
}
