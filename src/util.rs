//! Utility futures.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio_util::sync::WaitForCancellationFutureOwned;

use crate::pipeline::Pipeline;
use crate::signal::Signal;

/// A future raced against a pipeline's cancellation.
///
/// Resolves to `Some(output)` if the inner future finishes first and `None` once
/// cancellation has fired. Cancellation is checked before the inner future on
/// every poll, so a cancelled pipeline always wins ties.
pub struct Cancellable<F: Future> {
    future: Pin<Box<F>>,
    cancelled: Pin<Box<WaitForCancellationFutureOwned>>,
}

impl<F: Future> Cancellable<F> {
    /// Race `future` against `done`
    pub fn new(future: F, done: &Signal) -> Self {
        Self {
            future: Box::pin(future),
            cancelled: Box::pin(done.wait_owned()),
        }
    }
}

impl<F: Future> Future for Cancellable<F> {
    type Output = Option<F::Output>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        if this.cancelled.as_mut().poll(cx).is_ready() {
            return Poll::Ready(None);
        }

        this.future.as_mut().poll(cx).map(Some)
    }
}

/// Extension trait for making futures cancellation-aware
pub trait CancellableExt: Future + Sized {
    /// Race this future against `pp`'s cancellation
    fn cancellable(self, pp: &Pipeline) -> Cancellable<Self> {
        Cancellable::new(self, &pp.done())
    }
}

impl<F: Future> CancellableExt for F {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn finishes_when_not_cancelled() {
        let pp = Pipeline::new();
        let out = async { 42 }.cancellable(&pp).await;
        assert_eq!(out, Some(42));
        pp.shutdown().await;
    }

    #[tokio::test]
    async fn cancellation_unblocks_pending_future() {
        let pp = Pipeline::new();
        let waiter = {
            let pp = pp.clone();
            tokio::spawn(async move { futures::future::pending::<()>().cancellable(&pp).await })
        };

        pp.shutdown().await;
        let out = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("stuck after cancellation")
            .expect("waiter panicked");
        assert_eq!(out, None);
    }

    #[tokio::test]
    async fn cancellation_wins_ties() {
        let pp = Pipeline::new();
        pp.cancel();
        assert_eq!(async { 1 }.cancellable(&pp).await, None);
    }
}
